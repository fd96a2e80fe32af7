//! Field extraction from a rendered page.
//!
//! [`extract_page`] reads only page-local signals (meta tags, structural
//! hints, body text) and never touches the network. It cannot fail: anything
//! it does not find is simply left empty on the returned record.

mod doi;

pub use doi::{detect_doi, DoiStrategy, DOI_STRATEGIES};

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

use crate::models::{MetadataRecord, PageHints};

/// One `<meta>` tag, keyed by its lowercased `name` (or `property`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaTag {
    pub name: String,
    pub content: String,
    pub scheme: Option<String>,
}

/// All named meta tags of a document, in document order
#[derive(Debug, Clone, Default)]
pub struct MetaTags {
    tags: Vec<MetaTag>,
}

impl MetaTags {
    pub fn collect(document: &Html) -> Self {
        let Ok(selector) = Selector::parse("meta[content]") else {
            return Self::default();
        };

        let tags = document
            .select(&selector)
            .filter_map(|el| {
                let value = el.value();
                let name = value.attr("name").or_else(|| value.attr("property"))?;
                Some(MetaTag {
                    name: name.trim().to_ascii_lowercase(),
                    content: value.attr("content").unwrap_or("").trim().to_string(),
                    scheme: value.attr("scheme").map(|s| s.trim().to_string()),
                })
            })
            .collect();

        Self { tags }
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetaTag> {
        self.tags.iter()
    }

    /// Every non-empty value for `name` (case-insensitive)
    pub fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.tags
            .iter()
            .filter(move |tag| tag.name.eq_ignore_ascii_case(name))
            .map(|tag| tag.content.as_str())
            .filter(|content| !content.is_empty())
    }

    /// First non-empty value among `names`, tried in order
    pub fn first(&self, names: &[&str]) -> Option<String> {
        names
            .iter()
            .find_map(|name| self.all(name).next())
            .map(collapse_whitespace)
    }
}

/// Build a raw record from a page's HTML
pub fn extract_page(html: &str, url: &str) -> MetadataRecord {
    let document = Html::parse_document(html);
    let meta = MetaTags::collect(&document);

    let mut record = MetadataRecord::new(url);
    record.title = meta
        .first(&["citation_title", "dc.title", "og:title"])
        .or_else(|| document_title(&document));
    record.doi = detect_doi(&document, &meta);

    let mut authors: Vec<&str> = meta.all("citation_author").collect();
    if authors.is_empty() {
        authors = meta.all("dc.creator").collect();
    }
    record.set_authors(authors.into_iter().map(collapse_whitespace));

    record.year = meta
        .first(&["citation_publication_date", "citation_date", "dc.date"])
        .and_then(|date| leading_year(&date));
    record.journal = meta.first(&["citation_journal_title", "prism.publicationname"]);
    record.publisher = meta.first(&["citation_publisher", "dc.publisher"]);
    record.volume = meta.first(&["citation_volume", "prism.volume"]);
    record.issue = meta.first(&["citation_issue", "prism.number"]);
    record.pages = page_range(&meta);

    record.abstract_text = abstract_text(&document);
    record.body_text = body_text(&document);
    record.hints = PageHints {
        base_href: base_href(&document),
        arxiv_meta: meta.first(&["citation_arxiv_id"]),
        file_title: None,
    };

    tracing::debug!(
        url,
        title = record.title.as_deref().unwrap_or(""),
        doi = record.doi.as_deref().unwrap_or(""),
        authors = record.authors().len(),
        body_chars = record.body_text.chars().count(),
        "Extracted page fields"
    );

    record
}

fn document_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let title = document.select(&selector).next()?.text().collect::<String>();
    let title = collapse_whitespace(&title);
    (!title.is_empty()).then_some(title)
}

fn base_href(document: &Html) -> Option<String> {
    let selector = Selector::parse("base[href]").ok()?;
    let href = document.select(&selector).next()?.value().attr("href")?.trim();
    (!href.is_empty()).then(|| href.to_string())
}

/// `citation_firstpage`, joined with `citation_lastpage` when both are present
fn page_range(meta: &MetaTags) -> Option<String> {
    let first = meta.first(&["citation_firstpage", "prism.startingpage"])?;
    match meta.first(&["citation_lastpage", "prism.endingpage"]) {
        Some(last) if last != first => Some(format!("{}-{}", first, last)),
        _ => Some(first),
    }
}

/// Leading four-digit year of a date string such as `2017/06/12`
pub fn leading_year(date: &str) -> Option<String> {
    let re = Regex::new(r"^\s*(\d{4})").ok()?;
    Some(re.captures(date)?.get(1)?.as_str().to_string())
}

type AbstractHeuristic = fn(&ElementRef) -> bool;

/// Abstract container heuristics in priority order
const ABSTRACT_HEURISTICS: &[AbstractHeuristic] = &[
    id_is_abstract,
    class_is_abstract,
    id_mentions_abstract,
    class_mentions_abstract,
];

fn id_is_abstract(el: &ElementRef) -> bool {
    el.value().id().is_some_and(|id| id.eq_ignore_ascii_case("abstract"))
}

fn class_is_abstract(el: &ElementRef) -> bool {
    el.value().classes().any(|c| c.eq_ignore_ascii_case("abstract"))
}

fn id_mentions_abstract(el: &ElementRef) -> bool {
    el.value().id().is_some_and(contains_abstract)
}

fn class_mentions_abstract(el: &ElementRef) -> bool {
    el.value().classes().any(contains_abstract)
}

fn contains_abstract(value: &str) -> bool {
    value.to_ascii_lowercase().contains("abstract")
}

/// Text of the first element matching the highest-priority heuristic that has any text
pub fn abstract_text(document: &Html) -> Option<String> {
    let label = Regex::new(r"(?i)^abstract\s*[:.]?\s*").ok()?;

    ABSTRACT_HEURISTICS.iter().find_map(|matches| {
        document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| !is_non_content(el.value().name()))
            .filter(|el| matches(el))
            .find_map(|el| {
                let text = collapse_whitespace(&el.text().collect::<String>());
                let text = label.replace(&text, "").trim().to_string();
                (!text.is_empty()).then_some(text)
            })
    })
}

/// Visible document text with newlines stripped
pub fn body_text(document: &Html) -> String {
    let root = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    let mut fragments = Vec::new();
    for node in root.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| is_non_content(el.name()))
        });
        if !hidden {
            fragments.push(text.trim().to_string());
        }
    }

    collapse_whitespace(&fragments.join(" "))
}

fn is_non_content(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "noscript" | "template" | "meta" | "head")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOURNAL_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Deep learning | Nature</title>
  <meta name="citation_title" content="Deep   learning">
  <meta name="citation_author" content="LeCun, Yann">
  <meta name="citation_author" content="">
  <meta name="citation_author" content="Bengio, Yoshua">
  <meta name="citation_publication_date" content="2015/05/28">
  <meta name="citation_journal_title" content="Nature">
  <meta name="citation_publisher" content="Nature Publishing Group">
  <meta name="citation_volume" content="521">
  <meta name="citation_issue" content="7553">
  <meta name="citation_firstpage" content="436">
  <meta name="citation_lastpage" content="444">
  <meta name="citation_doi" content="https://doi.org/10.1038/nature14539">
  <script>var tracking = "ignored";</script>
  <style>.x { color: red; }</style>
</head>
<body>
  <h1>Deep learning</h1>
  <section class="c-article-section" id="Abs1-section">
    <div class="c-article-section__content" id="Abs1-content">
      <p>Deep learning allows computational models
      that are composed of multiple processing layers.</p>
    </div>
  </section>
  <div class="Abstract">Abstract: Deep learning discovers intricate structure.</div>
  <script>window.__data = {"doi": "10.9999/should-not-win"};</script>
</body>
</html>"#;

    #[test]
    fn test_extract_journal_page() {
        let record = extract_page(JOURNAL_PAGE, "https://www.nature.com/articles/nature14539");

        assert_eq!(record.url, "https://www.nature.com/articles/nature14539");
        assert_eq!(record.title.as_deref(), Some("Deep learning"));
        assert_eq!(record.authors(), ["LeCun, Yann", "Bengio, Yoshua"]);
        assert_eq!(record.year.as_deref(), Some("2015"));
        assert_eq!(record.journal.as_deref(), Some("Nature"));
        assert_eq!(record.publisher.as_deref(), Some("Nature Publishing Group"));
        assert_eq!(record.volume.as_deref(), Some("521"));
        assert_eq!(record.issue.as_deref(), Some("7553"));
        assert_eq!(record.pages.as_deref(), Some("436-444"));
        assert!(!record.is_pdf);
    }

    #[test]
    fn test_script_blob_beats_meta_tag() {
        let record = extract_page(JOURNAL_PAGE, "https://www.nature.com/articles/nature14539");
        assert_eq!(record.doi.as_deref(), Some("10.9999/should-not-win"));
    }

    #[test]
    fn test_abstract_class_match_is_case_insensitive() {
        let record = extract_page(JOURNAL_PAGE, "https://www.nature.com/articles/nature14539");
        assert_eq!(
            record.abstract_text.as_deref(),
            Some("Deep learning discovers intricate structure.")
        );
    }

    #[test]
    fn test_abstract_id_beats_class() {
        let html = r#"<html><body>
            <div class="abstract">Class abstract.</div>
            <div id="ABSTRACT">Id abstract.</div>
        </body></html>"#;
        let record = extract_page(html, "https://example.com");
        assert_eq!(record.abstract_text.as_deref(), Some("Id abstract."));
    }

    #[test]
    fn test_empty_abstract_container_is_skipped() {
        let html = r#"<html><body>
            <div id="abstract"></div>
            <blockquote class="abstract mathjax">
              <span class="descriptor">Abstract:</span> The dominant sequence transduction models.
            </blockquote>
        </body></html>"#;
        let record = extract_page(html, "https://arxiv.org/abs/1706.03762");
        assert_eq!(
            record.abstract_text.as_deref(),
            Some("The dominant sequence transduction models.")
        );
    }

    #[test]
    fn test_body_text_strips_newlines_and_scripts() {
        let record = extract_page(JOURNAL_PAGE, "https://www.nature.com/articles/nature14539");
        assert!(!record.body_text.contains('\n'));
        assert!(!record.body_text.contains("tracking"));
        assert!(!record.body_text.contains("color: red"));
        assert!(!record.body_text.contains("__data"));
        assert!(record
            .body_text
            .contains("Deep learning allows computational models that are composed"));
    }

    #[test]
    fn test_arxiv_hints() {
        let html = r#"<html><head>
            <base href="https://arxiv.org/abs/1706.03762v7">
            <meta name="citation_arxiv_id" content="1706.03762">
            <meta name="citation_date" content="2017/06/12">
        </head><body>
            <a id="arxiv-doi-link" href="https://doi.org/10.48550/arXiv.1706.03762">doi</a>
        </body></html>"#;
        let record = extract_page(html, "https://arxiv.org/abs/1706.03762v7");
        assert_eq!(
            record.hints.base_href.as_deref(),
            Some("https://arxiv.org/abs/1706.03762v7")
        );
        assert_eq!(record.hints.arxiv_meta.as_deref(), Some("1706.03762"));
        assert_eq!(record.doi.as_deref(), Some("10.48550/arXiv.1706.03762"));
        assert_eq!(record.year.as_deref(), Some("2017"));
    }

    #[test]
    fn test_title_falls_back_to_title_element() {
        let html = "<html><head><title>\n  A Study  \n</title></head><body>x</body></html>";
        let record = extract_page(html, "https://example.com");
        assert_eq!(record.title.as_deref(), Some("A Study"));
    }

    #[test]
    fn test_never_fails_on_garbage() {
        let record = extract_page("<<<not html at all", "https://example.com");
        assert_eq!(record.url, "https://example.com");
        assert!(record.doi.is_none());
        assert!(record.authors().is_empty());

        let record = extract_page("", "https://example.com");
        assert!(record.title.is_none());
        assert!(record.body_text.is_empty());
    }

    #[test]
    fn test_leading_year() {
        assert_eq!(leading_year("2017/06/12").as_deref(), Some("2017"));
        assert_eq!(leading_year("2020-01-01").as_deref(), Some("2020"));
        assert!(leading_year("June 2017").is_none());
    }
}
