//! Summary attached to every stored record.

use serde::Serialize;

/// Returned without calling the generation endpoint when the input is empty
pub const NOTHING_TO_SUMMARIZE: &str = "Nothing to summarize: the page contained no text.";

/// Used when the text was missing or too short to be worth summarizing
pub const SUMMARY_SKIPPED: &str =
    "Summary skipped: no text could be extracted from the page, or the text was too short.";

/// Used when the generation endpoint answered with an unexpected shape
pub const SUMMARY_EXTRACTION_FAILED: &str =
    "Summary extraction failed: the generation response did not contain any text.";

/// A summary or one of the sentinel messages. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "lowercase")]
pub enum Summary {
    Generated(String),
    Skipped(String),
    Failed(String),
}

impl Summary {
    pub fn skipped() -> Self {
        Summary::Skipped(SUMMARY_SKIPPED.to_string())
    }

    pub fn nothing_to_summarize() -> Self {
        Summary::Skipped(NOTHING_TO_SUMMARIZE.to_string())
    }

    pub fn extraction_failed() -> Self {
        Summary::Failed(SUMMARY_EXTRACTION_FAILED.to_string())
    }

    /// Text stored in the destination, sentinel or not
    pub fn text(&self) -> &str {
        match self {
            Summary::Generated(text) | Summary::Skipped(text) | Summary::Failed(text) => text,
        }
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}
