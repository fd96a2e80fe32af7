//! CrossRef research source implementation.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;

use crate::models::Identifier;
use crate::sources::{non_blank, RegistryRecord, Source, SourceError};
use crate::utils::HttpClient;

const CROSSREF_API_BASE: &str = "https://api.crossref.org";

/// CrossRef research source
///
/// Uses CrossRef REST API for DOI metadata lookup.
#[derive(Debug, Clone)]
pub struct CrossRefSource {
    client: HttpClient,
    base_url: String,
    mailto: Option<String>,
}

impl CrossRefSource {
    pub fn new(client: HttpClient, mailto: Option<String>) -> Self {
        Self::with_base_url(client, CROSSREF_API_BASE, mailto)
    }

    /// Create with a custom API base (for testing)
    pub fn with_base_url(
        client: HttpClient,
        base_url: impl Into<String>,
        mailto: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            mailto,
        }
    }

    fn work_url(&self, doi: &str) -> String {
        // DOI goes in as a path segment; slashes stay literal
        let encoded = urlencoding::encode(doi).replace("%2F", "/");
        let mut url = format!("{}/works/{}", self.base_url, encoded);
        if let Some(mailto) = &self.mailto {
            url = format!("{}?mailto={}", url, urlencoding::encode(mailto));
        }
        url
    }

    /// Map a Crossref `message` object onto registry fields
    fn convert(work: CRWork) -> RegistryRecord {
        let title = work.title.first().and_then(|t| non_blank(Some(t.as_str())));

        let authors = work
            .author
            .iter()
            .filter_map(CRAuthor::display_name)
            .collect();

        let year = [
            &work.published_print,
            &work.published_online,
            &work.issued,
            &work.created,
        ]
        .into_iter()
        .flatten()
        .filter_map(CRDate::year)
        .min()
        .map(|y| format!("{:04}", y));

        let journal = work
            .container_title
            .first()
            .map(|j| strip_trailing_parenthetical(j))
            .and_then(|j| non_blank(Some(j.as_str())));

        RegistryRecord {
            title,
            authors,
            year,
            journal,
            publisher: non_blank(work.publisher.as_deref()),
            volume: non_blank(work.volume.as_deref()),
            issue: non_blank(work.issue.as_deref()),
            pages: non_blank(work.page.as_deref()),
            document_type: non_blank(work.work_type.as_deref()),
        }
    }
}

/// Remove a trailing `(...)` suffix, e.g. "Nature (London)" → "Nature"
fn strip_trailing_parenthetical(journal: &str) -> String {
    match Regex::new(r"\s*\(.*\)\s*$") {
        Ok(re) => re.replace(journal, "").trim().to_string(),
        Err(_) => journal.trim().to_string(),
    }
}

#[async_trait]
impl Source for CrossRefSource {
    fn id(&self) -> &str {
        "crossref"
    }

    fn name(&self) -> &str {
        "CrossRef"
    }

    fn accepts(&self, identifier: &Identifier) -> bool {
        matches!(identifier, Identifier::Doi(_))
    }

    async fn lookup(&self, identifier: &Identifier) -> Result<RegistryRecord, SourceError> {
        let Identifier::Doi(doi) = identifier else {
            return Err(SourceError::InvalidRequest(format!(
                "CrossRef cannot resolve {}",
                identifier
            )));
        };

        let url = self.work_url(doi);
        tracing::debug!("Querying CrossRef: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to fetch DOI: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(format!("DOI not found: {}", doi)));
        }
        if !status.is_success() {
            return Err(SourceError::Api(format!(
                "CrossRef API returned status: {}",
                status
            )));
        }

        let data: CRResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse JSON: {}", e)))?;

        Ok(Self::convert(data.message))
    }
}

// ===== CrossRef API Types =====

#[derive(Debug, Deserialize)]
struct CRResponse {
    message: CRWork,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CRWork {
    title: Vec<String>,
    author: Vec<CRAuthor>,
    #[serde(rename = "container-title")]
    container_title: Vec<String>,
    publisher: Option<String>,
    volume: Option<String>,
    issue: Option<String>,
    page: Option<String>,
    #[serde(rename = "type")]
    work_type: Option<String>,
    #[serde(rename = "published-print")]
    published_print: Option<CRDate>,
    #[serde(rename = "published-online")]
    published_online: Option<CRDate>,
    issued: Option<CRDate>,
    created: Option<CRDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CRAuthor {
    given: Option<String>,
    family: Option<String>,
    name: Option<String>,
}

impl CRAuthor {
    /// "Given Family", or the organisation/display name when both are absent
    fn display_name(&self) -> Option<String> {
        let parts = [self.given.as_deref(), self.family.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>();

        if parts.is_empty() {
            non_blank(self.name.as_deref())
        } else {
            Some(parts.join(" "))
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CRDate {
    #[serde(rename = "date-parts")]
    date_parts: Vec<Vec<Option<i64>>>,
}

impl CRDate {
    fn year(&self) -> Option<i64> {
        self.date_parts
            .iter()
            .filter_map(|parts| parts.first().copied().flatten())
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    const NATURE_WORK: &str = r#"{
        "status": "ok",
        "message": {
            "DOI": "10.1038/nature14539",
            "title": ["Human-level control through deep reinforcement learning"],
            "author": [
                {"given": "Volodymyr", "family": "Mnih"},
                {"family": "Kavukcuoglu"},
                {"name": "DeepMind Team"},
                {"given": "", "family": ""}
            ],
            "created": {"date-parts": [[2015, 2, 25]]},
            "issued": {"date-parts": [[2015, 2, 26]]},
            "published-online": {"date-parts": [[2015, 2, 25]]},
            "published-print": {"date-parts": [[2015, 2]]},
            "container-title": ["Nature (London)"],
            "publisher": "Springer Science and Business Media LLC",
            "volume": "518",
            "issue": "7540",
            "page": "529-533",
            "type": "journal-article"
        }
    }"#;

    #[tokio::test]
    async fn test_crossref_lookup() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/works/10.1038/nature14539")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(NATURE_WORK)
            .create_async()
            .await;

        let source =
            CrossRefSource::with_base_url(HttpClient::new().unwrap(), server.url(), None);
        let record = source
            .lookup(&Identifier::Doi("10.1038/nature14539".to_string()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(
            record.title.as_deref(),
            Some("Human-level control through deep reinforcement learning")
        );
        assert_eq!(
            record.authors,
            vec!["Volodymyr Mnih", "Kavukcuoglu", "DeepMind Team"]
        );
        assert_eq!(record.year.as_deref(), Some("2015"));
        assert_eq!(record.journal.as_deref(), Some("Nature"));
        assert_eq!(
            record.publisher.as_deref(),
            Some("Springer Science and Business Media LLC")
        );
        assert_eq!(record.volume.as_deref(), Some("518"));
        assert_eq!(record.issue.as_deref(), Some("7540"));
        assert_eq!(record.pages.as_deref(), Some("529-533"));
        assert_eq!(record.document_type.as_deref(), Some("journal-article"));
    }

    #[tokio::test]
    async fn test_crossref_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/works/10.9999/missing")
            .with_status(404)
            .create_async()
            .await;

        let source =
            CrossRefSource::with_base_url(HttpClient::new().unwrap(), server.url(), None);
        let result = source
            .lookup(&Identifier::Doi("10.9999/missing".to_string()))
            .await;
        assert!(matches!(result, Err(SourceError::NotFound(_))));
    }

    #[test]
    fn test_year_is_earliest_date() {
        let work: CRWork = serde_json::from_str(
            r#"{
                "created": {"date-parts": [[2021, 3, 1]]},
                "published-print": {"date-parts": [[2022, 1]]},
                "issued": {"date-parts": [[null]]}
            }"#,
        )
        .unwrap();
        assert_eq!(CrossRefSource::convert(work).year.as_deref(), Some("2021"));
    }

    #[test]
    fn test_missing_fields_stay_none() {
        let work: CRWork = serde_json::from_str(r#"{"title": []}"#).unwrap();
        let record = CrossRefSource::convert(work);
        assert_eq!(record, RegistryRecord::default());
    }

    #[test]
    fn test_strip_trailing_parenthetical() {
        assert_eq!(strip_trailing_parenthetical("Nature (London)"), "Nature");
        assert_eq!(
            strip_trailing_parenthetical("Journal of Things (Online) "),
            "Journal of Things"
        );
        assert_eq!(strip_trailing_parenthetical("Science"), "Science");
    }

    #[test]
    fn test_work_url_keeps_slashes() {
        let source = CrossRefSource::with_base_url(
            HttpClient::new().unwrap(),
            "https://api.crossref.org/",
            Some("me@example.com".to_string()),
        );
        assert_eq!(
            source.work_url("10.1145/3368089.3409694"),
            "https://api.crossref.org/works/10.1145/3368089.3409694?mailto=me%40example.com"
        );
    }
}
