//! Identifier resolution: pick the single identifier that keys the registry lookup.
//!
//! Preprint detection runs first and wins over any DOI the page carried. Only
//! when no arXiv id is found does the page DOI become the identifier.

use url::Url;

use crate::models::{normalize_doi, ArxivId, Identifier, MetadataRecord};

/// A single way of finding an arXiv id for a record
pub type PreprintStrategy = fn(&MetadataRecord) -> Option<ArxivId>;

/// Preprint strategies in priority order
pub const PREPRINT_STRATEGIES: &[(&str, PreprintStrategy)] = &[
    ("base-href", from_base_href),
    ("page-url", from_page_url),
    ("citation-arxiv-id", from_arxiv_meta),
    ("arxiv-doi", from_arxiv_doi),
];

/// Decide the record's identifier, recording it on the record
///
/// A preprint id sets `preprint_id` and, when the page had no DOI, the
/// synthetic `10.48550/arXiv.<id>` DOI. Returns `None` when nothing usable
/// was found; the record then proceeds with page fields only.
pub fn resolve_identifier(record: &mut MetadataRecord) -> Option<Identifier> {
    if let Some(id) = detect_preprint(record) {
        record.preprint_id = Some(id.as_str().to_string());
        if record.doi.is_none() {
            record.doi = Some(id.synthetic_doi());
        }
        return Some(Identifier::Preprint(id));
    }

    let doi = record.doi.as_deref().and_then(normalize_doi)?;
    record.doi = Some(doi.clone());
    tracing::debug!(doi = %doi, "Resolved DOI");
    Some(Identifier::Doi(doi))
}

/// First arXiv id any strategy yields
pub fn detect_preprint(record: &MetadataRecord) -> Option<ArxivId> {
    PREPRINT_STRATEGIES.iter().find_map(|(name, strategy)| {
        let id = strategy(record)?;
        tracing::debug!(strategy = *name, id = %id, "Resolved arXiv id");
        Some(id)
    })
}

fn is_arxiv_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .ok()
        .and_then(|url| url.host_str().map(|h| h.to_ascii_lowercase()))
        .is_some_and(|host| host == "arxiv.org" || host.ends_with(".arxiv.org"))
}

/// `<base href>` pointing at an arXiv abstract or PDF page
pub fn from_base_href(record: &MetadataRecord) -> Option<ArxivId> {
    let href = record.hints.base_href.as_deref()?;
    if !is_arxiv_url(href) {
        return None;
    }
    ArxivId::parse(href)
}

/// The page URL itself is an arXiv abstract or PDF page
pub fn from_page_url(record: &MetadataRecord) -> Option<ArxivId> {
    if !is_arxiv_url(&record.url) {
        return None;
    }
    ArxivId::parse(&record.url)
}

/// `citation_arxiv_id` meta tag
pub fn from_arxiv_meta(record: &MetadataRecord) -> Option<ArxivId> {
    ArxivId::parse(record.hints.arxiv_meta.as_deref()?)
}

/// A DOI arXiv registered for the paper
pub fn from_arxiv_doi(record: &MetadataRecord) -> Option<ArxivId> {
    ArxivId::from_doi(record.doi.as_deref()?)
}
