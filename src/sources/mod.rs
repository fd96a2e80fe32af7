//! Bibliographic registries queried during enrichment.
//!
//! Each registry implements the [`Source`] trait. A save request resolves to
//! exactly one [`Identifier`], and [`SourceRegistry::for_identifier`] picks the
//! one registry that can answer it:
//!
//! - [`Identifier::Preprint`] → arXiv API (Atom XML)
//! - [`Identifier::Doi`] → Crossref REST API (JSON)

mod arxiv;
mod crossref;
mod registry;

pub mod mock;

pub use arxiv::ArxivSource;
pub use crossref::CrossRefSource;
pub use mock::MockSource;
pub use registry::SourceRegistry;

use async_trait::async_trait;

use crate::models::Identifier;

/// Fields a registry returned for one identifier
///
/// `None` (or an empty author list) means the registry did not provide the
/// field; the page-scraped value is kept in that case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryRecord {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub year: Option<String>,
    pub journal: Option<String>,
    pub publisher: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
    pub document_type: Option<String>,
}

/// The Source trait defines the interface for bibliographic registries.
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (e.g., "arxiv", "crossref")
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Whether this source can resolve the given identifier
    fn accepts(&self, identifier: &Identifier) -> bool;

    /// Fetch metadata for the identifier
    async fn lookup(&self, identifier: &Identifier) -> Result<RegistryRecord, SourceError>;
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Parsing error (XML, JSON, HTML, etc.)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Paper not found
    #[error("Paper not found: {0}")]
    NotFound(String),

    /// API error from the source
    #[error("API error: {0}")]
    Api(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

/// Trim a registry string, mapping blank values to `None`
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|v| !v.is_empty())
}
