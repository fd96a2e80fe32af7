//! Metadata record for a single clipped paper.
//!
//! A [`MetadataRecord`] is created fresh for every save request, mutated by the
//! extraction and enrichment stages, and turned into a [`FinalizedRecord`]
//! exactly once after every source has been consulted.

use serde::{Deserialize, Serialize};

/// Document type used when nothing better is known
pub const DEFAULT_DOCUMENT_TYPE: &str = "misc";

/// Document type assigned to pages served as PDF
pub const PDF_DOCUMENT_TYPE: &str = "pdf_document";

/// Structural hints scraped from the page, read by the resolver and finalizer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageHints {
    /// `href` of the document's `<base>` element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_href: Option<String>,

    /// Value of a `citation_arxiv_id` meta tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arxiv_meta: Option<String>,

    /// Title taken from a PDF's file name; used only when no title and no text is found
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_title: Option<String>,
}

/// Bibliographic record assembled from page markup and registry lookups
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
    pub title: Option<String>,

    pub url: String,

    pub doi: Option<String>,

    /// arXiv identifier, version suffix stripped
    pub preprint_id: Option<String>,

    /// Display-formatted person names in registry/page order. Never contains empty strings.
    #[serde(default, deserialize_with = "non_blank_authors")]
    authors: Vec<String>,

    /// Four digit year
    pub year: Option<String>,

    pub journal: Option<String>,

    pub publisher: Option<String>,

    pub volume: Option<String>,

    pub issue: Option<String>,

    pub pages: Option<String>,

    pub document_type: Option<String>,

    /// Page text (whitespace collapsed) or PDF text, used for summarization
    #[serde(default)]
    pub body_text: String,

    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,

    #[serde(default)]
    pub is_pdf: bool,

    #[serde(default)]
    pub hints: PageHints,
}

fn non_blank_authors<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let names = Vec::<String>::deserialize(deserializer)?;
    Ok(names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect())
}

impl MetadataRecord {
    /// Create an empty record for the given page URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Authors in order
    pub fn authors(&self) -> &[String] {
        &self.authors
    }

    /// Append an author, ignoring blank names
    pub fn push_author(&mut self, name: &str) {
        let name = name.trim();
        if !name.is_empty() {
            self.authors.push(name.to_string());
        }
    }

    /// Replace the author list, dropping blank names
    pub fn set_authors<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.authors.clear();
        for name in names {
            self.push_author(name.as_ref());
        }
    }

    /// Document type, falling back to [`DEFAULT_DOCUMENT_TYPE`]
    pub fn document_type_or_default(&self) -> &str {
        self.document_type
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_DOCUMENT_TYPE)
    }

    /// Whether a non-blank title is present
    pub fn has_title(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

/// A record whose derived fields have been computed
///
/// Only the finalizer can construct one, so display name and citation key are
/// derived once and never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedRecord {
    #[serde(flatten)]
    record: MetadataRecord,
    display_name: String,
    citation_key: String,
    first_author: Option<String>,
}

impl FinalizedRecord {
    pub(crate) fn new(
        record: MetadataRecord,
        display_name: String,
        citation_key: String,
        first_author: Option<String>,
    ) -> Self {
        Self {
            record,
            display_name,
            citation_key,
            first_author,
        }
    }

    pub fn record(&self) -> &MetadataRecord {
        &self.record
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn citation_key(&self) -> &str {
        &self.citation_key
    }

    pub fn first_author(&self) -> Option<&str> {
        self.first_author.as_deref()
    }
}

/// Builder for constructing records in one expression
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    record: MetadataRecord,
}

impl RecordBuilder {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            record: MetadataRecord::new(url),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.record.title = Some(title.into());
        self
    }

    pub fn authors<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.record.set_authors(names);
        self
    }

    pub fn year(mut self, year: impl Into<String>) -> Self {
        self.record.year = Some(year.into());
        self
    }

    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.record.doi = Some(doi.into());
        self
    }

    pub fn journal(mut self, journal: impl Into<String>) -> Self {
        self.record.journal = Some(journal.into());
        self
    }

    pub fn body_text(mut self, text: impl Into<String>) -> Self {
        self.record.body_text = text.into();
        self
    }

    pub fn abstract_text(mut self, text: impl Into<String>) -> Self {
        self.record.abstract_text = Some(text.into());
        self
    }

    pub fn pdf(mut self) -> Self {
        self.record.is_pdf = true;
        self.record.document_type = Some(PDF_DOCUMENT_TYPE.to_string());
        self
    }

    pub fn build(self) -> MetadataRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_authors_are_dropped() {
        let mut record = MetadataRecord::new("https://example.com");
        record.push_author("  ");
        record.push_author("Ada Lovelace");
        record.push_author("");
        assert_eq!(record.authors(), ["Ada Lovelace"]);

        record.set_authors(["", "Alan Turing", " Grace Hopper "]);
        assert_eq!(record.authors(), ["Alan Turing", "Grace Hopper"]);
    }

    #[test]
    fn test_document_type_default() {
        let record = MetadataRecord::new("https://example.com");
        assert_eq!(record.document_type_or_default(), "misc");

        let pdf = RecordBuilder::new("https://example.com/a.pdf").pdf().build();
        assert_eq!(pdf.document_type_or_default(), "pdf_document");
        assert!(pdf.is_pdf);
    }

    #[test]
    fn test_page_protocol_shape() {
        let record = RecordBuilder::new("https://example.com")
            .title("A Study")
            .abstract_text("We study things.")
            .build();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["title"], "A Study");
        assert_eq!(json["abstract"], "We study things.");
        assert_eq!(json["isPdf"], false);
        assert_eq!(json["bodyText"], "");

        let back: MetadataRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_deserialize_drops_blank_authors() {
        let record: MetadataRecord = serde_json::from_str(
            r#"{"url": "https://example.com", "authors": ["", "Ada Lovelace", "  "]}"#,
        )
        .unwrap();
        assert_eq!(record.authors(), ["Ada Lovelace"]);
    }
}
