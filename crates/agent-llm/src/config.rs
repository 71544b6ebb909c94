//! Provider configuration: defaults, config file, environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFIG_FILE_PATH: &str = "config.toml";
const APP_DIR_NAME: &str = ".tool-agent";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API key is required (set TOOL_AGENT_API_KEY or OPENAI_API_KEY)")]
    MissingApiKey,

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub host: String,
    pub base_path: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// Extra fields merged into every request body (e.g. `temperature`)
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra_body: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            host: "https://api.openai.com".to_string(),
            base_path: "/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 60,
            stream: true,
            max_output_tokens: None,
            extra_body: serde_json::Map::new(),
            system_prompt: None,
        }
    }
}

pub fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

pub fn config_json_path() -> PathBuf {
    app_dir().join("config.json")
}

fn parse_bool_env(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

impl ProviderConfig {
    /// Load from `~/.tool-agent/config.json` or `./config.toml`, then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let json_path = config_json_path();
        let mut config = if json_path.exists() {
            Self::from_file(&json_path)?
        } else if Path::new(CONFIG_FILE_PATH).exists() {
            Self::from_file(Path::new(CONFIG_FILE_PATH))?
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a JSON or TOML config file, chosen by extension.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let parsed = if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str::<Self>(&content).map_err(|e| e.to_string())
        } else {
            serde_json::from_str::<Self>(&content).map_err(|e| e.to_string())
        };

        let config = parsed.map_err(|reason| ConfigError::Parse {
            path: path.to_path_buf(),
            reason,
        })?;
        log::debug!("Loaded provider config from {}", path.display());
        Ok(config)
    }

    /// Apply `TOOL_AGENT_*` (and `OPENAI_API_KEY`) overrides through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_key) = lookup("TOOL_AGENT_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
            self.api_key = api_key;
        }
        if let Some(host) = lookup("TOOL_AGENT_HOST") {
            self.host = host;
        }
        if let Some(base_path) = lookup("TOOL_AGENT_BASE_PATH") {
            self.base_path = base_path;
        }
        if let Some(model) = lookup("TOOL_AGENT_MODEL") {
            self.model = model;
        }
        if let Some(timeout) = lookup("TOOL_AGENT_TIMEOUT_SECS") {
            self.timeout_secs =
                timeout
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: "TOOL_AGENT_TIMEOUT_SECS".to_string(),
                        value: timeout.clone(),
                    })?;
        }
        if let Some(stream) = lookup("TOOL_AGENT_STREAM") {
            self.stream = parse_bool_env(&stream);
        }
        Ok(())
    }

    /// `{host}{base_path}` without a trailing slash.
    pub fn base_url(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        let path = self.base_path.trim().trim_matches('/');
        if path.is_empty() {
            host.to_string()
        } else {
            format!("{host}/{path}")
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timeout_secs".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}
