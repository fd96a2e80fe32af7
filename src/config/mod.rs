//! Configuration management.
//!
//! Settings are loaded once per save request and passed explicitly into every
//! component. See [`load_settings`] for the layering rules.

mod file_config;

pub use file_config::{config_dir, find_config_file, load_settings, ConfigFileError};

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Destination database
    pub notion: NotionSettings,

    /// Summary generation
    pub gemini: GeminiSettings,

    /// Bibliographic registries
    pub sources: SourceSettings,

    /// PDF extraction sidecar
    pub sidecar: SidecarSettings,

    /// Shared HTTP client
    pub http: HttpSettings,

    /// Pipeline thresholds
    pub pipeline: PipelineSettings,

    /// Logging defaults (CLI flags and `RUST_LOG` take precedence)
    pub logging: LoggingSettings,
}

/// Notion API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotionSettings {
    pub api_key: Option<String>,
    pub database_id: Option<String>,
    pub api_base: String,
    pub version: String,
}

impl Default for NotionSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            database_id: None,
            api_base: "https://api.notion.com/v1".to_string(),
            version: "2022-06-28".to_string(),
        }
    }
}

/// Gemini API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub max_output_tokens: u32,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            max_output_tokens: 65536,
        }
    }
}

/// Registry endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub arxiv_api: String,
    pub crossref_api: String,
    /// Contact address sent to Crossref's polite pool
    pub mailto: Option<String>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            arxiv_api: "http://export.arxiv.org/api/query".to_string(),
            crossref_api: "https://api.crossref.org".to_string(),
            mailto: None,
        }
    }
}

/// PDF sidecar timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SidecarSettings {
    /// Wait after the worker is spawned before it is considered ready
    pub settle_delay_ms: u64,
    /// Upper bound on a single extraction request
    pub request_timeout_secs: u64,
}

impl Default for SidecarSettings {
    fn default() -> Self {
        Self {
            settle_delay_ms: 300,
            request_timeout_secs: 60,
        }
    }
}

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"))
                .to_string(),
        }
    }
}

/// Pipeline thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Texts of this many characters or fewer (after trimming) are not summarized
    pub min_summary_chars: usize,
    /// Body text is truncated to this many characters
    pub max_body_chars: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            min_summary_chars: 10,
            max_body_chars: 200_000,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    /// `"json"` for JSON lines, anything else for the compact text format
    pub format: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: None,
        }
    }
}

/// The credentials a save request cannot run without
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub notion_api_key: String,
    pub notion_database_id: String,
    pub gemini_api_key: String,
}

impl Settings {
    /// Fill empty credentials from the conventional unprefixed env vars
    pub fn apply_env_fallbacks(&mut self) {
        fill_from_env(&mut self.notion.api_key, "NOTION_API_KEY");
        fill_from_env(&mut self.notion.database_id, "NOTION_DATABASE_ID");
        fill_from_env(&mut self.gemini.api_key, "GEMINI_API_KEY");
    }

    /// Required credentials, or every missing key at once
    pub fn credentials(&self) -> Result<Credentials, PipelineError> {
        let mut missing = Vec::new();
        let notion_api_key = required(&self.notion.api_key, "notion.api_key", &mut missing);
        let notion_database_id =
            required(&self.notion.database_id, "notion.database_id", &mut missing);
        let gemini_api_key = required(&self.gemini.api_key, "gemini.api_key", &mut missing);

        if !missing.is_empty() {
            return Err(PipelineError::ConfigurationMissing(missing));
        }

        Ok(Credentials {
            notion_api_key,
            notion_database_id,
            gemini_api_key,
        })
    }

    /// Copy of the settings with secrets masked, for display
    pub fn redacted(&self) -> Settings {
        let mut copy = self.clone();
        copy.notion.api_key = copy.notion.api_key.as_deref().map(mask_secret);
        copy.gemini.api_key = copy.gemini.api_key.as_deref().map(mask_secret);
        copy
    }
}

fn fill_from_env(slot: &mut Option<String>, var: &str) {
    let is_empty = slot.as_deref().map_or(true, |v| v.trim().is_empty());
    if is_empty {
        if let Ok(value) = std::env::var(var) {
            if !value.trim().is_empty() {
                *slot = Some(value);
            }
        }
    }
}

fn required(value: &Option<String>, key: &str, missing: &mut Vec<String>) -> String {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => {
            missing.push(key.to_string());
            String::new()
        }
    }
}

fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}
