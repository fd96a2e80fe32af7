//! Typed request/response messages for the two asynchronous channels.
//!
//! - page channel: pipeline → page context, `{action: "getPageDetails"}`
//! - sidecar channel: pipeline → PDF sidecar, `{target, action: "extractPdfText", pdfUrl}`
//!
//! Each channel is a tagged union dispatched by a single handler on the
//! receiving side. The JSON shapes match the wire format used between the
//! extension contexts.

use serde::{Deserialize, Serialize};

use super::MetadataRecord;

/// Target name the sidecar answers to
pub const SIDECAR_TARGET: &str = "offscreen";

/// Requests understood by the page context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum PageRequest {
    #[serde(rename = "getPageDetails")]
    GetPageDetails,
}

/// Page context answer: the raw record or an error envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageResponse {
    Error { error: bool, message: String },
    Details(Box<MetadataRecord>),
}

impl PageResponse {
    pub fn error(message: impl Into<String>) -> Self {
        PageResponse::Error {
            error: true,
            message: message.into(),
        }
    }
}

/// Requests understood by the PDF sidecar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum SidecarRequest {
    #[serde(rename = "extractPdfText")]
    ExtractPdfText {
        target: String,
        #[serde(rename = "pdfUrl")]
        pdf_url: String,
    },
}

impl SidecarRequest {
    pub fn extract_pdf_text(pdf_url: impl Into<String>) -> Self {
        SidecarRequest::ExtractPdfText {
            target: SIDECAR_TARGET.to_string(),
            pdf_url: pdf_url.into(),
        }
    }
}

/// Sidecar answer. `text` is `None` whenever no usable text was produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidecarResponse {
    pub text: Option<String>,
    pub error: Option<String>,
}

impl SidecarResponse {
    pub fn text(text: String) -> Self {
        Self {
            text: Some(text),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            text: None,
            error: Some(error.into()),
        }
    }
}
