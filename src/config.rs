//! Runtime configuration.
//!
//! Values come from, lowest priority first: built-in defaults, the optional
//! `config.json` in the data directory, and `GLOSSA_*` environment
//! variables.
//!
//! # Example
//!
//! ```ignore
//! use glossa::config::GlossaConfig;
//!
//! let config = GlossaConfig::default()
//!     .with_base_url("http://10.0.0.5:8000")
//!     .with_thinking_mode(true);
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::backend::DEFAULT_BASE_URL;
use crate::error::{StorageError, TransportError};
use crate::models::ChatOptions;

pub const ENV_BASE_URL: &str = "GLOSSA_BASE_URL";
pub const ENV_API_KEY: &str = "GLOSSA_API_KEY";
pub const ENV_MODEL: &str = "GLOSSA_MODEL";
pub const ENV_SYSTEM_PROMPT: &str = "GLOSSA_SYSTEM_PROMPT";
pub const ENV_THINKING: &str = "GLOSSA_THINKING";
pub const ENV_DATA_DIR: &str = "GLOSSA_DATA_DIR";
pub const ENV_TIMEOUT_SECS: &str = "GLOSSA_TIMEOUT_SECS";

/// Name of the optional config file inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] TransportError),
}

/// On-disk shape of `config.json`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    base_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    system_prompt: Option<String>,
    thinking_mode: Option<bool>,
    request_timeout_secs: Option<u64>,
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct GlossaConfig {
    /// Backend base URL (default: http://localhost:8000)
    pub base_url: String,
    /// Bearer token forwarded to the backend
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub thinking_mode: Option<bool>,
    /// Where vocabulary and the config file live (default: ~/.glossa)
    pub data_dir: Option<PathBuf>,
    /// Connect timeout for backend requests
    pub request_timeout_secs: u64,
}

impl Default for GlossaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: None,
            system_prompt: None,
            thinking_mode: None,
            data_dir: dirs::home_dir().map(|home| home.join(".glossa")),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl GlossaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_thinking_mode(mut self, enabled: bool) -> Self {
        self.thinking_mode = Some(enabled);
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Defaults overridden by environment variables. No file is read.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env()
    }

    /// Defaults, then `config.json` from the data directory if present,
    /// then environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(dir) = env_var(ENV_DATA_DIR) {
            config.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = config.data_dir.clone() {
            config = config.merge_file(&dir.join(CONFIG_FILE))?;
        }
        config.apply_env()
    }

    /// Merge values from a JSON config file. A missing file is not an
    /// error.
    pub fn merge_file(mut self, path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(self),
            Err(e) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        let file: FileConfig = serde_json::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        tracing::debug!(path = %path.display(), "Loaded config file");

        if let Some(url) = file.base_url {
            self.base_url = url;
        }
        self.api_key = file.api_key.or(self.api_key);
        self.model = file.model.or(self.model);
        self.system_prompt = file.system_prompt.or(self.system_prompt);
        self.thinking_mode = file.thinking_mode.or(self.thinking_mode);
        if let Some(secs) = file.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        Ok(self)
    }

    /// Override fields from `GLOSSA_*` environment variables. Empty
    /// variables are treated as unset.
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Some(url) = env_var(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(key) = env_var(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(model) = env_var(ENV_MODEL) {
            self.model = Some(model);
        }
        if let Some(prompt) = env_var(ENV_SYSTEM_PROMPT) {
            self.system_prompt = Some(prompt);
        }
        if let Some(value) = env_var(ENV_THINKING) {
            self.thinking_mode = Some(parse_flag(ENV_THINKING, &value)?);
        }
        if let Some(dir) = env_var(ENV_DATA_DIR) {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(value) = env_var(ENV_TIMEOUT_SECS) {
            self.request_timeout_secs = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_TIMEOUT_SECS.to_string(),
                value,
            })?;
        }
        Ok(self)
    }

    /// Per-call options derived from this configuration.
    pub fn chat_options(&self) -> ChatOptions {
        ChatOptions {
            thinking_mode: self.thinking_mode,
            system_prompt: self.system_prompt.clone(),
            model: self.model.clone(),
        }
    }

    pub fn data_dir(&self) -> Result<&Path, StorageError> {
        self.data_dir.as_deref().ok_or(StorageError::NoDataDir)
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
