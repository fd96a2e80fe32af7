//! Configuration file support for scholar-clip.
//!
//! Settings are layered: built-in defaults, then a TOML file, then
//! environment variables prefixed with `SCHOLAR_CLIP_` (nested keys use `__`).
//!
//! # Configuration File Format
//!
//! ```toml
//! [notion]
//! api_key = "secret_..."
//! database_id = "0123456789abcdef"
//!
//! [gemini]
//! api_key = "AIza..."
//! model = "gemini-2.5-flash"
//!
//! [sources]
//! mailto = "me@example.com"
//!
//! [sidecar]
//! settle_delay_ms = 300
//! request_timeout_secs = 60
//! ```
//!
//! ```bash
//! export SCHOLAR_CLIP_NOTION__DATABASE_ID="0123456789abcdef"
//! ```

use std::path::{Path, PathBuf};

use super::Settings;

/// File name looked up in the working directory
const LOCAL_CONFIG_FILE: &str = "scholar-clip.toml";

/// Environment variable prefix
const ENV_PREFIX: &str = "SCHOLAR_CLIP";

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("Config error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

/// Per-user configuration directory (`~/.config/scholar-clip` on Linux)
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("scholar-clip"))
}

/// First existing config file among the default locations
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    config_dir()
        .map(|dir| dir.join("config.toml"))
        .filter(|path| path.is_file())
}

/// Load settings from `path` (or the default locations) plus the environment
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigFileError> {
    let mut builder = config::Config::builder();

    let file = path.map(Path::to_path_buf).or_else(find_config_file);
    if let Some(file) = &file {
        tracing::debug!("Loading config file: {}", file.display());
        builder = builder.add_source(config::File::from(file.as_path()).required(path.is_some()));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut settings: Settings = settings.try_deserialize()?;
    settings.apply_env_fallbacks();
    Ok(settings)
}

impl Settings {
    /// Save settings to a TOML file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
        }

        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }
}
