//! DOI detection strategies, tried in order until one yields a DOI.

use regex::Regex;
use scraper::{Html, Selector};

use super::MetaTags;
use crate::models::normalize_doi;

/// A single way of finding a DOI on a page
pub type DoiStrategy = fn(&Html, &MetaTags) -> Option<String>;

/// Strategies in priority order. The first non-empty result wins.
pub const DOI_STRATEGIES: &[(&str, DoiStrategy)] = &[
    ("arxiv-doi-link", arxiv_doi_link),
    ("structured-script", structured_script),
    ("dc-identifier", dc_identifier),
    ("citation-meta", citation_meta),
];

/// Run the strategies in order and return the first DOI found
pub fn detect_doi(document: &Html, meta: &MetaTags) -> Option<String> {
    DOI_STRATEGIES.iter().find_map(|(name, strategy)| {
        let doi = strategy(document, meta)?;
        tracing::debug!(strategy = *name, doi = %doi, "DOI detected");
        Some(doi)
    })
}

/// arXiv abstract pages link their registered DOI from `#arxiv-doi-link`
pub fn arxiv_doi_link(document: &Html, _meta: &MetaTags) -> Option<String> {
    let selector = Selector::parse("#arxiv-doi-link").ok()?;
    let href = document.select(&selector).next()?.value().attr("href")?;
    let re = Regex::new(r"doi\.org/(.+)").ok()?;
    let raw = re.captures(href)?.get(1)?.as_str();
    normalize_doi(raw)
}

/// Publisher pages embed JSON metadata in `<script>` blobs; match the DOI
/// pattern without parsing the JSON
pub fn structured_script(document: &Html, _meta: &MetaTags) -> Option<String> {
    let selector = Selector::parse("script").ok()?;
    let re = Regex::new(
        r#"(?i)"(?:doi|@id|identifier|sameAs)"\s*:\s*"(?:https?://(?:dx\.)?doi\.org/)?(10\.\d{4,9}/[^"\s]+)""#,
    )
    .ok()?;

    document
        .select(&selector)
        .filter(|script| {
            let kind = script.value().attr("type").unwrap_or("").to_ascii_lowercase();
            kind.is_empty() || kind.contains("json") || kind.contains("javascript")
        })
        .find_map(|script| {
            let body = script.text().collect::<String>();
            let caps = re.captures(&body)?;
            normalize_doi(caps.get(1)?.as_str())
        })
}

/// Dublin Core identifier with an explicit DOI scheme (ACM and others)
pub fn dc_identifier(_document: &Html, meta: &MetaTags) -> Option<String> {
    meta.iter()
        .filter(|tag| tag.name == "dc.identifier")
        .filter(|tag| tag.scheme.as_deref().is_some_and(|s| s.eq_ignore_ascii_case("doi")))
        .find_map(|tag| normalize_doi(&tag.content))
}

/// Highwire-style `citation_doi`, then the generic `DOI` tag
pub fn citation_meta(_document: &Html, meta: &MetaTags) -> Option<String> {
    ["citation_doi", "doi", "prism.doi"]
        .iter()
        .flat_map(|name| meta.all(*name))
        .find_map(normalize_doi)
}
