//! Derivation of the display name and citation key.
//!
//! Both are computed once, from whatever fields survived enrichment, by
//! walking an ordered rule list; the first rule that yields a value wins.

use crate::models::{FinalizedRecord, MetadataRecord};

/// Display name used when no title, author or year is known
pub const UNKNOWN_DOCUMENT: &str = "Unknown Document";

/// Longest title derived from the first line of body text
const BODY_TITLE_MAX_CHARS: usize = 120;

/// Characters of the title kept in a title-based display name
const TITLE_PREFIX_CHARS: usize = 20;

/// Characters of the display name kept in a display-name citation key
const KEY_PREFIX_CHARS: usize = 15;

type DisplayNameRule = fn(&MetadataRecord) -> Option<String>;

const DISPLAY_NAME_RULES: &[DisplayNameRule] =
    &[author_and_year, title_prefix_and_year, title_only, unknown_with_year];

/// Inputs a citation key rule can draw on
struct KeyInputs<'a> {
    record: &'a MetadataRecord,
    display_name: &'a str,
    first_author: Option<&'a str>,
}

type CitationKeyRule = fn(&KeyInputs) -> Option<String>;

const CITATION_KEY_RULES: &[CitationKeyRule] = &[author_year_title_key, display_name_key];

/// Finalize using the current time for the fallback citation key
pub fn finalize(record: MetadataRecord) -> FinalizedRecord {
    finalize_at(record, chrono::Utc::now().timestamp_millis())
}

/// Finalize with an explicit epoch-millisecond timestamp for the fallback key
pub fn finalize_at(mut record: MetadataRecord, now_millis: i64) -> FinalizedRecord {
    if !record.has_title() {
        if let Some(title) = title_from_body(&record.body_text) {
            tracing::debug!(title = %title, "Using first line of text as title");
            record.title = Some(title);
        }
    }
    if !record.has_title() {
        record.title = record.hints.file_title.clone();
    }

    let display_name = DISPLAY_NAME_RULES
        .iter()
        .find_map(|rule| rule(&record))
        .unwrap_or_else(|| UNKNOWN_DOCUMENT.to_string());

    let first_author = record.authors().first().cloned();

    let inputs = KeyInputs {
        record: &record,
        display_name: &display_name,
        first_author: first_author.as_deref(),
    };
    let citation_key = CITATION_KEY_RULES
        .iter()
        .find_map(|rule| rule(&inputs))
        .unwrap_or_else(|| format!("Citekey{}", now_millis));

    tracing::debug!(
        display_name = %display_name,
        citation_key = %citation_key,
        "Finalized record"
    );

    FinalizedRecord::new(record, display_name, citation_key, first_author)
}

/// Family name of a display-formatted person name
///
/// "Family, Given" takes the part before the comma; otherwise the last
/// space-delimited token is used.
pub fn last_name(author: &str) -> &str {
    let family = match author.split_once(',') {
        Some((family, _)) => family.trim(),
        None => author.trim(),
    };
    family.split_whitespace().last().unwrap_or(family)
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn author_and_year(record: &MetadataRecord) -> Option<String> {
    let author = record.authors().first()?;
    let year = present(&record.year)?;
    Some(format!("{} {}", last_name(author), year))
}

fn title_prefix_and_year(record: &MetadataRecord) -> Option<String> {
    let title = present(&record.title)?;
    let year = present(&record.year)?;
    let prefix: String = title.chars().take(TITLE_PREFIX_CHARS).collect();
    Some(format!("{} {}", prefix, year))
}

fn title_only(record: &MetadataRecord) -> Option<String> {
    present(&record.title).map(str::to_string)
}

fn unknown_with_year(record: &MetadataRecord) -> Option<String> {
    present(&record.year).map(|year| format!("Unknown {}", year))
}

fn author_year_title_key(inputs: &KeyInputs) -> Option<String> {
    let author = inputs.first_author?;
    let year = present(&inputs.record.year)?;
    let title = present(&inputs.record.title)?;

    let family = match last_name(author) {
        "" => "NoAuthor",
        name => name,
    };
    let word: String = title
        .split(' ')
        .next()
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect();
    let word = if word.is_empty() { "NoTitle".to_string() } else { word };

    Some(format!("{}{}{}", family, year, word))
}

fn display_name_key(inputs: &KeyInputs) -> Option<String> {
    if inputs.display_name == UNKNOWN_DOCUMENT {
        return None;
    }
    let year = present(&inputs.record.year)?;
    let stem: String = inputs
        .display_name
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',' && *c != '.')
        .take(KEY_PREFIX_CHARS)
        .collect();
    Some(format!("{}{}", stem, year))
}

fn title_from_body(body: &str) -> Option<String> {
    let line = body.lines().map(str::trim).find(|line| !line.is_empty())?;
    let title: String = line.chars().take(BODY_TITLE_MAX_CHARS).collect();
    Some(title.trim_end().to_string())
}
