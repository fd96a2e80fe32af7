//! Mapping a finalized record onto the Notion page schema.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};

use crate::models::{FinalizedRecord, Summary};

/// Maximum characters in one rich-text element or paragraph block
pub const CHUNK_LIMIT: usize = 2000;

/// Maximum characters in a select or multi-select option name
pub const SELECT_LIMIT: usize = 99;

pub const SUMMARY_HEADING: &str = "AI Summary";
pub const ABSTRACT_HEADING: &str = "Abstract";
pub const INFO_HEADING: &str = "Paper Info";

/// Split `text` into consecutive pieces of at most `limit` characters
///
/// Concatenating the pieces gives back `text` exactly. Empty input yields no pieces.
pub fn split_into_chunks(text: &str, limit: usize) -> Vec<String> {
    if limit == 0 {
        return vec![text.to_string()];
    }
    text.chars()
        .collect::<Vec<_>>()
        .chunks(limit)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// "Family, Given" becomes "Given Family"; anything else is returned trimmed
pub fn given_family(name: &str) -> String {
    let parts: Vec<&str> = name.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [family, given] if !family.is_empty() && !given.is_empty() => {
            format!("{} {}", given, family)
        }
        _ => name.trim().to_string(),
    }
}

/// Option name safe for a select property: no commas, capped length
fn select_name(value: &str) -> Option<String> {
    let cleaned = value
        .replace(',', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let capped: String = cleaned.chars().take(SELECT_LIMIT).collect();
    let capped = capped.trim_end().to_string();
    (!capped.is_empty()).then_some(capped)
}

fn rich_text(value: &str) -> Value {
    let chunks = split_into_chunks(value, CHUNK_LIMIT);
    if chunks.is_empty() {
        return json!({ "rich_text": [{ "text": { "content": "" } }] });
    }
    let items: Vec<Value> = chunks
        .iter()
        .map(|chunk| json!({ "text": { "content": chunk } }))
        .collect();
    json!({ "rich_text": items })
}

fn heading(text: &str) -> Value {
    json!({
        "object": "block",
        "type": "heading_2",
        "heading_2": {
            "rich_text": [{ "type": "text", "text": { "content": text } }]
        }
    })
}

fn paragraph(text: &str) -> Value {
    json!({
        "object": "block",
        "type": "paragraph",
        "paragraph": {
            "rich_text": [{ "type": "text", "text": { "content": text } }]
        }
    })
}

/// A heading followed by one paragraph per chunk of `text`
fn section(blocks: &mut Vec<Value>, title: &str, text: &str) {
    blocks.push(heading(title));
    blocks.extend(
        split_into_chunks(text, CHUNK_LIMIT)
            .iter()
            .map(|chunk| paragraph(chunk)),
    );
}

/// Plain-text summary of the bibliographic fields
pub fn paper_info(record: &FinalizedRecord) -> String {
    let fields = record.record();
    let mut lines = vec![format!("URL: {}", fields.url)];
    if let Some(doi) = &fields.doi {
        lines.push(format!("DOI: {}", doi));
    }
    if !fields.authors().is_empty() {
        lines.push(format!("Authors: {}", fields.authors().join(", ")));
    }
    if let Some(journal) = &fields.journal {
        lines.push(format!("Journal: {}", journal));
    }
    if let Some(year) = &fields.year {
        lines.push(format!("Year: {}", year));
    }
    lines.join("\n")
}

/// Page content: summary, abstract when known, then the paper info block
pub fn content_blocks(record: &FinalizedRecord, summary: &Summary) -> Vec<Value> {
    let mut blocks = Vec::new();

    section(&mut blocks, SUMMARY_HEADING, summary.text().trim());

    if let Some(abstract_text) = record
        .record()
        .abstract_text
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
    {
        section(&mut blocks, ABSTRACT_HEADING, abstract_text);
    }

    section(&mut blocks, INFO_HEADING, &paper_info(record));
    blocks
}

/// Database properties for the record
///
/// Select properties whose value is unknown are left out rather than sent empty.
pub fn properties(record: &FinalizedRecord, created_at: DateTime<Utc>) -> Map<String, Value> {
    let fields = record.record();
    let mut props = Map::new();

    props.insert(
        "Name".into(),
        json!({ "title": [{ "text": { "content": record.display_name() } }] }),
    );
    props.insert("Title".into(), rich_text(fields.title.as_deref().unwrap_or("")));
    props.insert("DOI".into(), rich_text(fields.doi.as_deref().unwrap_or("")));
    props.insert("URL".into(), json!({ "url": (!fields.url.is_empty()).then_some(&fields.url) }));
    props.insert("Citekey".into(), rich_text(record.citation_key()));
    props.insert("Edition".into(), rich_text(""));
    props.insert("Volume".into(), rich_text(fields.volume.as_deref().unwrap_or("")));
    props.insert("Pages".into(), rich_text(fields.pages.as_deref().unwrap_or("")));
    props.insert("info".into(), json!({ "checkbox": true }));
    props.insert(
        "created_at".into(),
        json!({ "date": { "start": created_at.to_rfc3339_opts(SecondsFormat::Millis, true) } }),
    );

    if let Some(first) = record.first_author().and_then(|a| select_name(&given_family(a))) {
        props.insert("First".into(), json!({ "select": { "name": first } }));
    }

    let authors: Vec<Value> = fields
        .authors()
        .iter()
        .filter_map(|a| select_name(&given_family(a)))
        .map(|name| json!({ "name": name }))
        .collect();
    if !authors.is_empty() {
        props.insert("Authors".into(), json!({ "multi_select": authors }));
    }

    if let Some(year) = fields.year.as_deref().and_then(|y| y.trim().parse::<i64>().ok()) {
        props.insert("Year".into(), json!({ "number": year }));
    }

    if let Some(journal) = fields
        .journal
        .as_deref()
        .and_then(|j| j.split(',').next())
        .and_then(select_name)
    {
        props.insert("Journal".into(), json!({ "select": { "name": journal } }));
    }

    if let Some(kind) = select_name(fields.document_type_or_default()) {
        props.insert("Type".into(), json!({ "select": { "name": kind } }));
    }

    if let Some(publisher) = fields.publisher.as_deref().and_then(select_name) {
        props.insert("Publisher".into(), json!({ "select": { "name": publisher } }));
    }

    props
}

/// Full create-page request body
pub fn page_payload(
    record: &FinalizedRecord,
    summary: &Summary,
    database_id: &str,
    created_at: DateTime<Utc>,
) -> Value {
    json!({
        "parent": { "database_id": database_id },
        "properties": properties(record, created_at),
        "children": content_blocks(record, summary),
    })
}
