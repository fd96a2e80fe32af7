//! Error taxonomy for a save request.
//!
//! Enrichment failures (registry lookups, PDF text) never surface here: they
//! are logged and degrade the record. Everything in [`PipelineError`] ends the
//! save request and is reported to the caller as one message.

use thiserror::Error;

/// Errors that abort a save request
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required credential or identifier is not configured
    #[error("Missing configuration: {}", .0.join(", "))]
    ConfigurationMissing(Vec<String>),

    /// The page context answered with an error envelope
    #[error("Failed to read page details: {0}")]
    PageUnavailable(String),

    /// Network failure or non-success status from an external service
    #[error("{service} request failed: {message}")]
    ExternalCallFailed { service: String, message: String },

    /// The generation endpoint refused the prompt
    #[error("Summary blocked by {service}: {reason}{}", format_ratings(.ratings))]
    ContentBlocked {
        service: String,
        reason: String,
        ratings: Vec<String>,
    },

    /// No usable text could be extracted
    #[error("No text could be extracted: {0}")]
    ExtractionEmpty(String),

    /// An external service answered with an unexpected shape
    #[error("{service} returned an unexpected response: {message}")]
    MalformedResponse { service: String, message: String },
}

fn format_ratings(ratings: &[String]) -> String {
    if ratings.is_empty() {
        String::new()
    } else {
        format!(" ({})", ratings.join(", "))
    }
}

impl PipelineError {
    pub fn external(service: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::ExternalCallFailed {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn malformed(service: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::MalformedResponse {
            service: service.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = PipelineError::ConfigurationMissing(vec![
            "notion.api_key".to_string(),
            "gemini.api_key".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Missing configuration: notion.api_key, gemini.api_key"
        );

        let err = PipelineError::ContentBlocked {
            service: "Gemini".to_string(),
            reason: "SAFETY".to_string(),
            ratings: vec!["HARM_CATEGORY_HARASSMENT:HIGH".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Summary blocked by Gemini: SAFETY (HARM_CATEGORY_HARASSMENT:HIGH)"
        );

        let err = PipelineError::external("Notion", "status 400: bad property");
        assert_eq!(err.to_string(), "Notion request failed: status 400: bad property");
    }
}
