//! Registry identifiers: DOIs and arXiv ids.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// DOI prefix arXiv registers for its own papers
pub const ARXIV_DOI_PREFIX: &str = "10.48550/arXiv.";

/// The single identifier that keys a registry lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Identifier {
    /// arXiv identifier, looked up in the arXiv API
    Preprint(ArxivId),
    /// DOI, looked up in the Crossref API
    Doi(String),
}

impl Identifier {
    /// Registry this identifier is resolved against
    pub fn registry_id(&self) -> &'static str {
        match self {
            Identifier::Preprint(_) => "arxiv",
            Identifier::Doi(_) => "crossref",
        }
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Identifier::Preprint(id) => write!(f, "arXiv:{}", id),
            Identifier::Doi(doi) => write!(f, "doi:{}", doi),
        }
    }
}

/// A version-less arXiv identifier
///
/// Accepts new-style (`2301.12345`) and old-style (`hep-th/9901001`) ids,
/// optionally wrapped in an `arxiv:` prefix or an `arxiv.org/abs|pdf/` URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArxivId(String);

impl ArxivId {
    /// Parse an arXiv id from a bare id, prefixed id, or arXiv URL
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        let mut id = input;
        let lowered = input.to_ascii_lowercase();
        for marker in ["/abs/", "/pdf/"] {
            if let Some(pos) = lowered.find(marker) {
                id = &input[pos + marker.len()..];
                break;
            }
        }
        if lowered.starts_with("arxiv:") {
            id = &input["arxiv:".len()..];
        }

        let id = id.split(['?', '#']).next().unwrap_or(id);
        let id = id.trim_end_matches('/');
        let id = id.strip_suffix(".pdf").unwrap_or(id);
        let id = strip_version(id);

        let new_style = Regex::new(r"^\d{4}\.\d{4,5}$").ok()?;
        let old_style = Regex::new(r"^[a-z][a-z\-]*(\.[A-Z]{2})?/\d{7}$").ok()?;
        if new_style.is_match(id) || old_style.is_match(id) {
            Some(Self(id.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The DOI arXiv registers for this paper
    pub fn synthetic_doi(&self) -> String {
        format!("{}{}", ARXIV_DOI_PREFIX, self.0)
    }

    /// Recover an arXiv id from an arXiv-registered DOI
    pub fn from_doi(doi: &str) -> Option<Self> {
        let doi = normalize_doi(doi)?;
        let lowered = doi.to_ascii_lowercase();
        let prefix = ARXIV_DOI_PREFIX.to_ascii_lowercase();
        if lowered.starts_with(&prefix) {
            Self::parse(&doi[prefix.len()..])
        } else {
            None
        }
    }
}

impl std::fmt::Display for ArxivId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remove a trailing `vN` version suffix
pub fn strip_version(id: &str) -> &str {
    match Regex::new(r"v\d+$").ok().and_then(|re| re.find(id)) {
        Some(m) => &id[..m.start()],
        None => id,
    }
}

/// Reduce a DOI, DOI URL, or `doi:`-prefixed string to the bare `10.x/y` form
pub fn normalize_doi(input: &str) -> Option<String> {
    let input = input.trim();
    let lowered = input.to_ascii_lowercase();

    let mut stripped = input;
    for prefix in [
        "https://doi.org/",
        "http://doi.org/",
        "https://dx.doi.org/",
        "http://dx.doi.org/",
        "doi:",
    ] {
        if lowered.starts_with(prefix) {
            stripped = input[prefix.len()..].trim_start();
            break;
        }
    }

    if !stripped.starts_with("10.") {
        return None;
    }
    let slash = stripped.find('/')?;
    if stripped[slash + 1..].trim().is_empty() {
        return None;
    }
    Some(stripped.to_string())
}
