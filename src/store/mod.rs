//! Store writer: one Notion page per saved paper.
//!
//! Every save creates a new page; nothing is deduplicated or updated. A
//! non-success response is reported once and not retried.

mod payload;

pub use payload::{
    content_blocks, given_family, page_payload, paper_info, properties, split_into_chunks,
    ABSTRACT_HEADING, CHUNK_LIMIT, INFO_HEADING, SELECT_LIMIT, SUMMARY_HEADING,
};

use serde::Deserialize;
use serde_json::Value;

use crate::config::NotionSettings;
use crate::error::PipelineError;
use crate::models::{FinalizedRecord, Summary};
use crate::utils::HttpClient;

const SERVICE: &str = "Notion";

/// The page Notion created
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedPage {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Writes finalized records into a Notion database
#[derive(Debug, Clone)]
pub struct NotionWriter {
    client: HttpClient,
    api_base: String,
    version: String,
    api_key: String,
    database_id: String,
}

impl NotionWriter {
    pub fn new(
        client: HttpClient,
        settings: &NotionSettings,
        api_key: impl Into<String>,
        database_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            version: settings.version.clone(),
            api_key: api_key.into(),
            database_id: database_id.into(),
        }
    }

    /// Request body that [`NotionWriter::create_page`] would send
    pub fn payload(&self, record: &FinalizedRecord, summary: &Summary) -> Value {
        page_payload(record, summary, &self.database_id, chrono::Utc::now())
    }

    /// Create the page for `record` with `summary` as its content
    pub async fn create_page(
        &self,
        record: &FinalizedRecord,
        summary: &Summary,
    ) -> Result<CreatedPage, PipelineError> {
        let url = format!("{}/pages", self.api_base);
        tracing::info!("Creating Notion page \"{}\"", record.display_name());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Notion-Version", self.version.as_str())
            .json(&self.payload(record, summary))
            .send()
            .await
            .map_err(|e| PipelineError::external(SERVICE, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PipelineError::external(SERVICE, e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v["message"].as_str().map(str::to_string))
                .unwrap_or(body);
            return Err(PipelineError::external(
                SERVICE,
                format!("HTTP {}: {}", status.as_u16(), message),
            ));
        }

        let page: CreatedPage = serde_json::from_str(&body)
            .map_err(|e| PipelineError::malformed(SERVICE, e.to_string()))?;
        tracing::debug!(page_id = %page.id, "Notion page created");
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finalize::finalize_at;
    use crate::models::RecordBuilder;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn writer_for(server: &Server) -> NotionWriter {
        let settings = NotionSettings {
            api_base: server.url(),
            ..Default::default()
        };
        NotionWriter::new(HttpClient::new().unwrap(), &settings, "secret_test", "db-123")
    }

    fn record() -> FinalizedRecord {
        finalize_at(
            RecordBuilder::new("https://example.com/paper")
                .title("A Study")
                .authors(["Lovelace, Ada"])
                .year("1843")
                .build(),
            0,
        )
    }

    #[tokio::test]
    async fn test_create_page() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/pages")
            .match_header("authorization", "Bearer secret_test")
            .match_header("notion-version", "2022-06-28")
            .match_body(Matcher::PartialJson(json!({
                "parent": { "database_id": "db-123" },
                "properties": {
                    "Name": { "title": [{ "text": { "content": "Lovelace 1843" } }] },
                    "First": { "select": { "name": "Ada Lovelace" } }
                }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"object": "page", "id": "page-1", "url": "https://www.notion.so/page-1"}"#)
            .expect(1)
            .create_async()
            .await;

        let page = writer_for(&server)
            .create_page(&record(), &Summary::Generated("Summary.".to_string()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(page.id, "page-1");
        assert_eq!(page.url.as_deref(), Some("https://www.notion.so/page-1"));
    }

    #[tokio::test]
    async fn test_error_is_surfaced_without_retry() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/pages")
            .with_status(400)
            .with_body(r#"{"object": "error", "status": 400, "code": "validation_error", "message": "Citekey is not a property that exists."}"#)
            .expect(1)
            .create_async()
            .await;

        let err = writer_for(&server)
            .create_page(&record(), &Summary::skipped())
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(
            err.to_string(),
            "Notion request failed: HTTP 400: Citekey is not a property that exists."
        );
    }

    #[tokio::test]
    async fn test_malformed_success_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/pages")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let err = writer_for(&server)
            .create_page(&record(), &Summary::skipped())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::MalformedResponse { .. }));
    }
}
