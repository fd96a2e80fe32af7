//! Summary generation through the Gemini `generateContent` endpoint.

use serde_json::{json, Value};

use crate::config::GeminiSettings;
use crate::error::PipelineError;
use crate::models::Summary;
use crate::utils::HttpClient;

const SERVICE: &str = "Gemini";

/// Instruction wrapped around the paper text
const PROMPT_TEMPLATE: &str = "\
# Instructions
You are an expert academic writer. Summarize the research paper given below for a graduate-level reader.

# Constraints
- Explain what kind of paper this is, covering its background and purpose in particular.
- Make the content as easy to follow as possible without dropping important keywords.
- Organize the summary under the following headings:
    - Background
    - Purpose
    - Comparison with prior work
    - Key points of the technique or method
    - Experimental method
    - Results
    - Discussion
- Write in the register of an academic paper, in plain declarative sentences.
- Start a new line for each paragraph.

# Input
{text}

# Output
";

/// Client for one summary request per save
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: HttpClient,
    api_base: String,
    model: String,
    api_key: String,
    max_output_tokens: u32,
}

impl GeminiClient {
    pub fn new(client: HttpClient, settings: &GeminiSettings, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: api_key.into(),
            max_output_tokens: settings.max_output_tokens,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    /// Request body for `text`
    pub fn request_body(&self, text: &str) -> Value {
        json!({
            "contents": [{
                "parts": [{ "text": PROMPT_TEMPLATE.replace("{text}", text) }]
            }],
            "generationConfig": {
                "maxOutputTokens": self.max_output_tokens
            }
        })
    }

    /// Summarize `text` with a single request
    ///
    /// Empty input returns the "nothing to summarize" sentinel without a
    /// request. A response without candidate text falls back to the
    /// "extraction failed" sentinel. Transport errors, non-success statuses
    /// and blocked prompts are errors.
    pub async fn summarize(&self, text: &str) -> Result<Summary, PipelineError> {
        if text.trim().is_empty() {
            return Ok(Summary::nothing_to_summarize());
        }

        tracing::info!(
            model = %self.model,
            chars = text.chars().count(),
            "Requesting summary"
        );

        let response = self
            .client
            .post(&self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&self.request_body(text))
            .send()
            .await
            .map_err(|e| PipelineError::external(SERVICE, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PipelineError::external(SERVICE, e.to_string()))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            return Err(PipelineError::external(
                SERVICE,
                format!("HTTP {}: {}", status.as_u16(), detail),
            ));
        }

        let data: Value = serde_json::from_str(&body)
            .map_err(|e| PipelineError::malformed(SERVICE, e.to_string()))?;
        classify(&data)
    }
}

/// Turn a successful response body into a summary or a blocked-prompt error
pub fn classify(data: &Value) -> Result<Summary, PipelineError> {
    if let Some(text) = data["candidates"][0]["content"]["parts"][0]["text"].as_str() {
        let text = text.trim();
        if !text.is_empty() {
            return Ok(Summary::Generated(text.to_string()));
        }
    }

    if let Some(reason) = data["promptFeedback"]["blockReason"].as_str() {
        let ratings = data["promptFeedback"]["safetyRatings"]
            .as_array()
            .map(|ratings| {
                ratings
                    .iter()
                    .map(|r| {
                        format!(
                            "{}:{}",
                            r["category"].as_str().unwrap_or("UNKNOWN"),
                            r["probability"].as_str().unwrap_or("UNKNOWN")
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        return Err(PipelineError::ContentBlocked {
            service: SERVICE.to_string(),
            reason: reason.to_string(),
            ratings,
        });
    }

    tracing::warn!("Unexpected {} response shape: {}", SERVICE, data);
    Ok(Summary::extraction_failed())
}
