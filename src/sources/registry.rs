//! Registry that routes an identifier to the one source able to resolve it.

use std::sync::Arc;

use super::{ArxivSource, CrossRefSource, Source, SourceError};
use crate::config::SourceSettings;
use crate::models::Identifier;
use crate::utils::HttpClient;

/// The preprint service and the citation registry, side by side
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn Source>>,
}

impl SourceRegistry {
    /// Create a registry with the arXiv and CrossRef sources
    pub fn new(client: HttpClient, settings: &SourceSettings) -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(ArxivSource::with_api_url(
            client.clone(),
            settings.arxiv_api.clone(),
        )));
        registry.register(Arc::new(CrossRefSource::with_base_url(
            client,
            settings.crossref_api.clone(),
            settings.mailto.clone(),
        )));
        registry
    }

    /// Create a registry with no sources
    pub fn empty() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Register a new source. Earlier registrations win when several accept an identifier.
    pub fn register(&mut self, source: Arc<dyn Source>) {
        self.sources.push(source);
    }

    /// The single source that resolves this identifier
    pub fn for_identifier(&self, identifier: &Identifier) -> Result<&Arc<dyn Source>, SourceError> {
        self.sources
            .iter()
            .find(|s| s.accepts(identifier))
            .ok_or_else(|| {
                SourceError::NotFound(format!("No source can resolve {}", identifier))
            })
    }

    /// Get all source IDs
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.id())
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceSettings;
    use crate::models::ArxivId;

    #[test]
    fn test_routes_each_identifier_to_one_source() {
        let registry = SourceRegistry::new(HttpClient::new().unwrap(), &SourceSettings::default());
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["arxiv", "crossref"]);

        let preprint = Identifier::Preprint(ArxivId::parse("2301.12345").unwrap());
        assert_eq!(registry.for_identifier(&preprint).unwrap().id(), "arxiv");

        let doi = Identifier::Doi("10.1038/nature14539".to_string());
        assert_eq!(registry.for_identifier(&doi).unwrap().id(), "crossref");
    }

    #[test]
    fn test_empty_registry() {
        let registry = SourceRegistry::empty();
        assert!(registry.is_empty());
        let doi = Identifier::Doi("10.1038/nature14539".to_string());
        assert!(registry.for_identifier(&doi).is_err());
    }
}
