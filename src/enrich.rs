//! Registry enrichment: one lookup, merged over the page-scraped fields.

use crate::models::{Identifier, MetadataRecord};
use crate::sources::{RegistryRecord, SourceRegistry};

/// Query the one registry that resolves `identifier` and merge its fields
///
/// Lookup failures are logged and swallowed: the record keeps its page-only
/// fields and the save carries on. Returns whether registry fields were merged.
pub async fn enrich(
    record: &mut MetadataRecord,
    identifier: Option<&Identifier>,
    registry: &SourceRegistry,
) -> bool {
    let Some(identifier) = identifier else {
        tracing::debug!("No identifier resolved, keeping page fields");
        return false;
    };

    let source = match registry.for_identifier(identifier) {
        Ok(source) => source,
        Err(e) => {
            tracing::warn!("Skipping enrichment for {}: {}", identifier, e);
            return false;
        }
    };

    tracing::info!("Looking up {} in {}", identifier, source.name());
    match source.lookup(identifier).await {
        Ok(fields) => {
            merge(record, fields);
            true
        }
        Err(e) => {
            tracing::warn!("{} lookup failed for {}: {}", source.name(), identifier, e);
            false
        }
    }
}

/// Registry fields overwrite page fields; fields the registry left out are kept
pub fn merge(record: &mut MetadataRecord, fields: RegistryRecord) {
    overwrite(&mut record.title, fields.title);
    overwrite(&mut record.year, fields.year);
    overwrite(&mut record.journal, fields.journal);
    overwrite(&mut record.publisher, fields.publisher);
    overwrite(&mut record.volume, fields.volume);
    overwrite(&mut record.issue, fields.issue);
    overwrite(&mut record.pages, fields.pages);
    overwrite(&mut record.document_type, fields.document_type);

    if !fields.authors.is_empty() {
        record.set_authors(fields.authors);
    }
}

fn overwrite(slot: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        *slot = Some(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArxivId, RecordBuilder};
    use crate::sources::MockSource;
    use std::sync::Arc;

    fn page_record() -> MetadataRecord {
        let mut record = RecordBuilder::new("https://journal.example.com/a")
            .title("Scraped Title")
            .authors(["Page, Author"])
            .year("1999")
            .journal("Scraped Journal")
            .build();
        record.volume = Some("7".to_string());
        record
    }

    #[test]
    fn test_registry_fields_take_precedence() {
        let mut record = page_record();
        merge(
            &mut record,
            RegistryRecord {
                title: Some("Registry Title".to_string()),
                authors: vec!["Ada Lovelace".to_string(), "Alan Turing".to_string()],
                year: Some("2021".to_string()),
                journal: Some("Registry Journal".to_string()),
                ..Default::default()
            },
        );

        assert_eq!(record.title.as_deref(), Some("Registry Title"));
        assert_eq!(record.authors(), ["Ada Lovelace", "Alan Turing"]);
        assert_eq!(record.year.as_deref(), Some("2021"));
        assert_eq!(record.journal.as_deref(), Some("Registry Journal"));
        // not returned by the registry
        assert_eq!(record.volume.as_deref(), Some("7"));
        assert!(record.publisher.is_none());
    }

    #[test]
    fn test_empty_registry_fields_keep_page_values() {
        let mut record = page_record();
        merge(
            &mut record,
            RegistryRecord {
                title: Some("   ".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(record, page_record());
    }

    #[tokio::test]
    async fn test_exactly_one_registry_is_queried() {
        let preprint = Arc::new(MockSource::preprint().with_record(RegistryRecord {
            title: Some("Attention Is All You Need".to_string()),
            ..Default::default()
        }));
        let citation = Arc::new(MockSource::citation());

        let mut registry = SourceRegistry::empty();
        registry.register(preprint.clone());
        registry.register(citation.clone());

        let id = Identifier::Preprint(ArxivId::parse("1706.03762").unwrap());
        let mut record = page_record();
        assert!(enrich(&mut record, Some(&id), &registry).await);

        assert_eq!(preprint.calls(), vec![id]);
        assert!(citation.calls().is_empty());
        assert_eq!(record.title.as_deref(), Some("Attention Is All You Need"));
    }

    #[tokio::test]
    async fn test_lookup_failure_is_swallowed() {
        let citation = Arc::new(MockSource::citation().failing("connection reset"));
        let mut registry = SourceRegistry::empty();
        registry.register(citation.clone());

        let id = Identifier::Doi("10.1000/xyz".to_string());
        let mut record = page_record();
        assert!(!enrich(&mut record, Some(&id), &registry).await);

        assert_eq!(citation.calls().len(), 1);
        assert_eq!(record, page_record());
    }

    #[tokio::test]
    async fn test_no_identifier_skips_lookup() {
        let citation = Arc::new(MockSource::citation());
        let mut registry = SourceRegistry::empty();
        registry.register(citation.clone());

        let mut record = page_record();
        assert!(!enrich(&mut record, None, &registry).await);
        assert!(citation.calls().is_empty());
    }
}
