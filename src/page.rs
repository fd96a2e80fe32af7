//! Page context: answers `getPageDetails` for the page being saved.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use crate::extract::extract_page;
use crate::models::{MetadataRecord, PageRequest, PageResponse, RecordBuilder};
use crate::utils::HttpClient;

/// Something that can describe the page being saved
#[async_trait]
pub trait PageContext: Send + Sync + std::fmt::Debug {
    /// URL of the page
    fn url(&self) -> &str;

    async fn handle(&self, request: PageRequest) -> PageResponse;
}

/// Page context that downloads the URL
#[derive(Debug, Clone)]
pub struct FetchedPage {
    client: HttpClient,
    url: String,
}

impl FetchedPage {
    pub fn new(client: HttpClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    async fn details(&self) -> Result<MetadataRecord, String> {
        if has_pdf_path(&self.url) {
            return Ok(pdf_record(&self.url));
        }

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| format!("Failed to load {}: {}", self.url, e))?;

        if !response.status().is_success() {
            return Err(format!(
                "Failed to load {}: HTTP {}",
                self.url,
                response.status()
            ));
        }

        let is_pdf = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.to_ascii_lowercase().starts_with("application/pdf"));
        if is_pdf {
            return Ok(pdf_record(&self.url));
        }

        let html = response
            .text()
            .await
            .map_err(|e| format!("Failed to read {}: {}", self.url, e))?;
        Ok(extract_page(&html, &self.url))
    }
}

#[async_trait]
impl PageContext for FetchedPage {
    fn url(&self) -> &str {
        &self.url
    }

    async fn handle(&self, request: PageRequest) -> PageResponse {
        match request {
            PageRequest::GetPageDetails => match self.details().await {
                Ok(record) => PageResponse::Details(Box::new(record)),
                Err(message) => {
                    tracing::warn!("{}", message);
                    PageResponse::error(message)
                }
            },
        }
    }
}

fn has_pdf_path(url: &str) -> bool {
    url::Url::parse(url)
        .map(|u| u.path().to_ascii_lowercase().ends_with(".pdf"))
        .unwrap_or(false)
}

/// Record for a page served as PDF
///
/// The file name is kept as a fallback title; the first line of the PDF's
/// text takes precedence once the sidecar has read it.
pub fn pdf_record(url: &str) -> MetadataRecord {
    let mut record = RecordBuilder::new(url).pdf().build();
    record.hints.file_title = pdf_file_title(url);
    record
}

fn pdf_file_title(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.rev().find(|s| !s.is_empty())?;
    let decoded = urlencoding::decode(segment).ok()?;
    let stem = match decoded.len().checked_sub(4) {
        Some(cut) if decoded.is_char_boundary(cut)
            && decoded[cut..].eq_ignore_ascii_case(".pdf") => &decoded[..cut],
        _ => &decoded[..],
    };
    let title = stem.trim();
    (!title.is_empty()).then(|| title.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_html_page_is_extracted() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/article")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body(r#"<html><head><meta name="citation_title" content="A Study"></head><body>Body</body></html>"#)
            .create_async()
            .await;

        let url = format!("{}/article", server.url());
        let page = FetchedPage::new(HttpClient::new().unwrap(), url.clone());
        match page.handle(PageRequest::GetPageDetails).await {
            PageResponse::Details(record) => {
                assert_eq!(record.url, url);
                assert_eq!(record.title.as_deref(), Some("A Study"));
                assert!(!record.is_pdf);
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pdf_content_type() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/download")
            .with_status(200)
            .with_header("content-type", "application/pdf")
            .with_body("%PDF-1.5")
            .create_async()
            .await;

        let page = FetchedPage::new(
            HttpClient::new().unwrap(),
            format!("{}/download", server.url()),
        );
        match page.handle(PageRequest::GetPageDetails).await {
            PageResponse::Details(record) => {
                assert!(record.is_pdf);
                assert_eq!(record.document_type.as_deref(), Some("pdf_document"));
                assert_eq!(record.title, None);
                assert_eq!(record.hints.file_title.as_deref(), Some("download"));
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_error_becomes_envelope() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/gone")
            .with_status(410)
            .create_async()
            .await;

        let page = FetchedPage::new(HttpClient::new().unwrap(), format!("{}/gone", server.url()));
        match page.handle(PageRequest::GetPageDetails).await {
            PageResponse::Error { error, message } => {
                assert!(error);
                assert!(message.contains("410"));
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn test_pdf_record_from_path() {
        let record = pdf_record("https://example.com/papers/Deep%20Learning%20Review.PDF");
        assert!(record.is_pdf);
        assert_eq!(record.hints.file_title.as_deref(), Some("Deep Learning Review"));
        assert!(has_pdf_path("https://example.com/papers/x.pdf?download=1"));
        assert!(!has_pdf_path("https://example.com/papers/x"));
    }
}
