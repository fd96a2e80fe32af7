//! arXiv research source implementation.

use async_trait::async_trait;
use chrono::Datelike;
use feed_rs::parser;

use crate::models::{ArxivId, Identifier};
use crate::sources::{non_blank, RegistryRecord, Source, SourceError};
use crate::utils::HttpClient;

/// Base URL for arXiv API
const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

/// Publisher, journal and document type recorded for arXiv papers
pub const ARXIV_NAME: &str = "arXiv";

/// arXiv metadata lookup by id
#[derive(Debug, Clone)]
pub struct ArxivSource {
    client: HttpClient,
    api_url: String,
}

impl ArxivSource {
    /// Create a new arXiv source against the public API
    pub fn new(client: HttpClient) -> Self {
        Self::with_api_url(client, ARXIV_API_URL)
    }

    /// Create with a custom query endpoint (for testing)
    pub fn with_api_url(client: HttpClient, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    fn query_url(&self, id: &ArxivId) -> String {
        format!(
            "{}?id_list={}&max_results=1",
            self.api_url,
            urlencoding::encode(id.as_str())
        )
    }

    /// Parse the first entry of an arXiv Atom response
    fn parse_feed(bytes: &[u8]) -> Result<RegistryRecord, SourceError> {
        let feed = parser::parse(bytes)
            .map_err(|e| SourceError::Parse(format!("Failed to parse Atom feed: {}", e)))?;

        let entry = feed
            .entries
            .first()
            .ok_or_else(|| SourceError::NotFound("arXiv returned no entries".to_string()))?;

        // Unknown ids come back as a single entry titled "Error"
        let title = non_blank(entry.title.as_ref().map(|t| t.content.as_str()));
        if title.as_deref() == Some("Error") && entry.authors.is_empty() {
            let detail = entry
                .summary
                .as_ref()
                .map(|s| s.content.trim().to_string())
                .unwrap_or_default();
            return Err(SourceError::NotFound(format!("arXiv: {}", detail)));
        }

        let authors = entry
            .authors
            .iter()
            .filter_map(|a| non_blank(Some(a.name.as_str())))
            .collect();

        let year = entry
            .published
            .or(entry.updated)
            .map(|date| format!("{:04}", date.year()));

        Ok(RegistryRecord {
            title,
            authors,
            year,
            journal: Some(ARXIV_NAME.to_string()),
            publisher: Some(ARXIV_NAME.to_string()),
            document_type: Some(ARXIV_NAME.to_string()),
            ..Default::default()
        })
    }
}

#[async_trait]
impl Source for ArxivSource {
    fn id(&self) -> &str {
        "arxiv"
    }

    fn name(&self) -> &str {
        "arXiv"
    }

    fn accepts(&self, identifier: &Identifier) -> bool {
        matches!(identifier, Identifier::Preprint(_))
    }

    async fn lookup(&self, identifier: &Identifier) -> Result<RegistryRecord, SourceError> {
        let Identifier::Preprint(id) = identifier else {
            return Err(SourceError::InvalidRequest(format!(
                "arXiv cannot resolve {}",
                identifier
            )));
        };

        let url = self.query_url(id);
        tracing::debug!("Querying arXiv: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/atom+xml")
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to fetch arXiv entry: {}", e)))?;

        if !response.status().is_success() {
            return Err(SourceError::Api(format!(
                "arXiv API returned status: {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read response: {}", e)))?;

        Self::parse_feed(bytes.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    const ATTENTION_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>arXiv Query Results</title>
  <entry>
    <id>http://arxiv.org/abs/1706.03762v7</id>
    <updated>2023-08-02T00:41:18Z</updated>
    <published>2017-06-12T17:57:34Z</published>
    <title>Attention Is All
      You Need</title>
    <summary>The dominant sequence transduction models...</summary>
    <author><name>Ashish Vaswani</name></author>
    <author><name>Noam Shazeer</name></author>
    <author><name>Niki Parmar</name></author>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_feed() {
        let record = ArxivSource::parse_feed(ATTENTION_FEED.as_bytes()).unwrap();
        assert_eq!(record.title.as_deref(), Some("Attention Is All You Need"));
        assert_eq!(
            record.authors,
            vec!["Ashish Vaswani", "Noam Shazeer", "Niki Parmar"]
        );
        assert_eq!(record.year.as_deref(), Some("2017"));
        assert_eq!(record.journal.as_deref(), Some("arXiv"));
        assert_eq!(record.publisher.as_deref(), Some("arXiv"));
        assert_eq!(record.document_type.as_deref(), Some("arXiv"));
        assert!(record.volume.is_none());
    }

    #[test]
    fn test_parse_feed_empty() {
        let feed = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom"><title>arXiv Query Results</title></feed>"#;
        assert!(matches!(
            ArxivSource::parse_feed(feed.as_bytes()),
            Err(SourceError::NotFound(_))
        ));
    }

    #[test]
    fn test_parse_feed_error_entry() {
        let feed = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/api/errors#incorrect_id_format_for_9999.99999</id>
    <title>Error</title>
    <summary>incorrect id format for 9999.99999</summary>
    <updated>2024-01-01T00:00:00Z</updated>
  </entry>
</feed>"#;
        assert!(matches!(
            ArxivSource::parse_feed(feed.as_bytes()),
            Err(SourceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_lookup_queries_version_less_id() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("id_list".into(), "1706.03762".into()),
                Matcher::UrlEncoded("max_results".into(), "1".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/atom+xml")
            .with_body(ATTENTION_FEED)
            .create_async()
            .await;

        let source = ArxivSource::with_api_url(
            HttpClient::new().unwrap(),
            format!("{}/api/query", server.url()),
        );
        let id = ArxivId::parse("1706.03762v7").unwrap();
        let record = source.lookup(&Identifier::Preprint(id)).await.unwrap();

        mock.assert_async().await;
        assert_eq!(record.title.as_deref(), Some("Attention Is All You Need"));
    }

    #[tokio::test]
    async fn test_lookup_rejects_doi() {
        let source = ArxivSource::new(HttpClient::new().unwrap());
        let result = source
            .lookup(&Identifier::Doi("10.1038/nature14539".to_string()))
            .await;
        assert!(matches!(result, Err(SourceError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_lookup_http_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let source = ArxivSource::with_api_url(
            HttpClient::new().unwrap(),
            format!("{}/api/query", server.url()),
        );
        let id = ArxivId::parse("1706.03762").unwrap();
        let result = source.lookup(&Identifier::Preprint(id)).await;
        assert!(matches!(result, Err(SourceError::Api(_))));
    }
}
