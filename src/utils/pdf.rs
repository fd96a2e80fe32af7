//! PDF text extraction utilities.
//!
//! Text is pulled page by page with `lopdf`. A page that fails to decode is
//! replaced by an inline error marker and extraction carries on; only a
//! document with no usable page at all is reported as a failure.

use std::collections::BTreeMap;

use lopdf::content::Operation;
use lopdf::Encoding;
use thiserror::Error;

/// Prefix of the marker substituted for a page that could not be decoded
pub const PAGE_ERROR_MARKER: &str = "[Error processing page";

/// Errors that can occur during PDF extraction
#[derive(Debug, Error)]
pub enum PdfExtractError {
    #[error("Failed to load PDF: {0}")]
    Load(String),

    #[error("PDF has 0 pages")]
    NoPages,

    #[error("Failed to extract text from page {page}: {message}")]
    Page { page: u32, message: String },

    #[error("PDF text extraction produced no text ({0} pages processed)")]
    Empty(u32),
}

/// A loaded PDF whose pages can be read one at a time
pub trait PdfDocument {
    /// Number of pages
    fn page_count(&self) -> u32;

    /// Text of a 1-based page, fragments joined by single spaces
    fn page_text(&self, page: u32) -> Result<String, PdfExtractError>;
}

/// [`PdfDocument`] backed by `lopdf`
pub struct LopdfDocument {
    document: lopdf::Document,
    pages: Vec<lopdf::ObjectId>,
}

impl LopdfDocument {
    /// Parse a PDF from its raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfExtractError> {
        let document =
            lopdf::Document::load_mem(bytes).map_err(|e| PdfExtractError::Load(e.to_string()))?;
        let pages = document.get_pages().into_values().collect();
        Ok(Self { document, pages })
    }

    /// Font resource name to text encoding for one page
    ///
    /// Fonts whose encoding lopdf cannot work out are left out; their strings
    /// fall back to lossy UTF-8.
    fn encodings(&self, page_id: lopdf::ObjectId) -> BTreeMap<Vec<u8>, Encoding<'_>> {
        self.document
            .get_page_fonts(page_id)
            .map(|fonts| {
                fonts
                    .into_iter()
                    .filter_map(|(name, font)| {
                        font.get_font_encoding(&self.document)
                            .ok()
                            .map(|encoding| (name, encoding))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Kerning inside a `TJ` array wider than this reads as a word gap
const TJ_SPACE_THRESHOLD: f32 = -100.0;

fn decode_string(encoding: Option<&Encoding<'_>>, bytes: &[u8]) -> String {
    encoding
        .and_then(|encoding| lopdf::Document::decode_text(encoding, bytes).ok())
        .unwrap_or_else(|| String::from_utf8_lossy(bytes).into_owned())
}

/// Text shown by one `Tj`, `'`, `"` or `TJ` operation
fn show_text(encoding: Option<&Encoding<'_>>, operation: &Operation) -> String {
    use lopdf::Object;

    let mut text = String::new();
    match operation.operator.as_str() {
        "Tj" | "'" | "\"" => {
            if let Some(Object::String(bytes, _)) = operation.operands.last() {
                text.push_str(&decode_string(encoding, bytes));
            }
        }
        "TJ" => {
            let items = operation.operands.first().and_then(|o| o.as_array().ok());
            for item in items.into_iter().flatten() {
                match item {
                    Object::String(bytes, _) => text.push_str(&decode_string(encoding, bytes)),
                    Object::Integer(n) if (*n as f32) < TJ_SPACE_THRESHOLD => text.push(' '),
                    Object::Real(n) if *n < TJ_SPACE_THRESHOLD => text.push(' '),
                    _ => {}
                }
            }
        }
        _ => {}
    }
    text
}

impl PdfDocument for LopdfDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_text(&self, page: u32) -> Result<String, PdfExtractError> {
        let page_id = self
            .pages
            .get(page.saturating_sub(1) as usize)
            .copied()
            .ok_or_else(|| PdfExtractError::Page {
                page,
                message: "page out of range".to_string(),
            })?;

        let content = self
            .document
            .get_and_decode_page_content(page_id)
            .map_err(|e| PdfExtractError::Page {
                page,
                message: e.to_string(),
            })?;
        let encodings = self.encodings(page_id);

        let mut current = None;
        let mut fragments = Vec::new();
        for operation in &content.operations {
            if operation.operator == "Tf" {
                current = operation
                    .operands
                    .first()
                    .and_then(|name| name.as_name().ok())
                    .and_then(|name| encodings.get(name));
                continue;
            }
            let fragment = show_text(current, operation);
            let fragment = fragment.split_whitespace().collect::<Vec<_>>().join(" ");
            if !fragment.is_empty() {
                fragments.push(fragment);
            }
        }

        Ok(fragments.join(" "))
    }
}

/// Concatenate the text of every page, separated by blank lines
///
/// Failed pages become `[Error processing page N]` and do not abort the
/// document. Fails only when the document has no pages or no page produced
/// any text.
pub fn collect_text(document: &dyn PdfDocument) -> Result<String, PdfExtractError> {
    let count = document.page_count();
    if count == 0 {
        return Err(PdfExtractError::NoPages);
    }

    let mut text = String::new();
    let mut usable_pages = 0;
    for page in 1..=count {
        match document.page_text(page) {
            Ok(page_text) => {
                if !page_text.trim().is_empty() {
                    usable_pages += 1;
                }
                text.push_str(&page_text);
                text.push_str("\n\n");
            }
            Err(e) => {
                tracing::warn!("{}", e);
                text.push_str(&format!("{} {}]\n\n", PAGE_ERROR_MARKER, page));
            }
        }
    }

    if usable_pages == 0 {
        return Err(PdfExtractError::Empty(count));
    }

    tracing::debug!(pages = count, usable_pages, chars = text.len(), "Extracted PDF text");
    Ok(text.trim().to_string())
}

/// Parse `bytes` and collect their text
pub fn extract_text(bytes: &[u8]) -> Result<String, PdfExtractError> {
    let document = LopdfDocument::from_bytes(bytes)?;
    collect_text(&document)
}
