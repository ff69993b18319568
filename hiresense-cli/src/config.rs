//! Configuration for the hiresense command line.
//!
//! Settings come from, lowest precedence first:
//! 1. Default values
//! 2. Config file (`~/.hiresense/config.toml`)
//! 3. Environment variables (`HIRESENSE_URL`, `HIRESENSE_API_KEY`,
//!    `HIRESENSE_CHAT_URL`, `HIRESENSE_TIMEOUT_SECS`)

use std::path::{Path, PathBuf};

use hiresense::{ClientConfig, ParserLimits};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Project base URL.
pub const ENV_URL: &str = "HIRESENSE_URL";
/// Bearer credential.
pub const ENV_API_KEY: &str = "HIRESENSE_API_KEY";
/// Chat endpoint override.
pub const ENV_CHAT_URL: &str = "HIRESENSE_CHAT_URL";
/// Single-shot request timeout.
pub const ENV_TIMEOUT: &str = "HIRESENSE_TIMEOUT_SECS";

/// Written by `hiresense config init`.
pub const TEMPLATE: &str = r#"# HireSense CLI configuration.
# Environment variables (HIRESENSE_URL, HIRESENSE_API_KEY, HIRESENSE_CHAT_URL,
# HIRESENSE_TIMEOUT_SECS) override the values below.

[service]
# url = "https://<project>.supabase.co"
# api_key = "<publishable key>"
# chat_url = "https://<project>.supabase.co/functions/v1/chat-assistant"
# timeout_secs = 120

[chat]
prompt = "You: "
max_pending_bytes = 65536
"#;

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// Missing required field.
    #[error("missing required config: {0}")]
    MissingField(String),
    /// Invalid value.
    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Root of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    /// Where the HireSense functions live.
    #[serde(default)]
    pub service: ServiceSection,

    /// Interactive chat settings.
    #[serde(default)]
    pub chat: ChatSection,
}

/// `[service]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceSection {
    /// Project base URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Bearer credential.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Absolute chat endpoint override.
    #[serde(default)]
    pub chat_url: Option<String>,
    /// Single-shot request timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// `[chat]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatSection {
    /// Prompt shown before each user turn.
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Largest pending stream frame before a reply is abandoned.
    #[serde(default = "default_max_pending_bytes")]
    pub max_pending_bytes: usize,
}

impl Default for ChatSection {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            max_pending_bytes: default_max_pending_bytes(),
        }
    }
}

fn default_prompt() -> String {
    "You: ".to_string()
}

const fn default_max_pending_bytes() -> usize {
    ParserLimits::DEFAULT_MAX_PENDING_BYTES
}

impl CliConfig {
    /// Client configuration with environment overrides applied.
    pub fn client_config(&self) -> ConfigResult<ClientConfig> {
        self.client_config_with(|name| std::env::var(name).ok())
    }

    /// Client configuration, reading overrides through `env`.
    pub fn client_config_with<F>(&self, env: F) -> ConfigResult<ClientConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        let url = env(ENV_URL)
            .or_else(|| self.service.url.clone())
            .ok_or_else(|| ConfigError::MissingField(format!("service.url (or {ENV_URL})")))?;
        let api_key = env(ENV_API_KEY)
            .or_else(|| self.service.api_key.clone())
            .ok_or_else(|| {
                ConfigError::MissingField(format!("service.api_key (or {ENV_API_KEY})"))
            })?;

        let mut config =
            ClientConfig::new(url, api_key).with_max_pending_bytes(self.chat.max_pending_bytes);

        if let Some(chat_url) = env(ENV_CHAT_URL).or_else(|| self.service.chat_url.clone()) {
            config = config.with_chat_endpoint(chat_url);
        }

        let timeout = match env(ENV_TIMEOUT) {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue(format!("{ENV_TIMEOUT} must be a number, got '{raw}'"))
            })?),
            None => self.service.timeout_secs,
        };
        if let Some(secs) = timeout {
            config = config.with_timeout(secs);
        }

        Ok(config)
    }
}

/// Get the default config directory path.
#[must_use]
pub fn default_config_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".hiresense")
}

/// Get the default config file path.
#[must_use]
pub fn config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Load configuration from `path`, falling back to defaults if it is missing.
pub async fn load_config_from(path: &Path) -> ConfigResult<CliConfig> {
    if !path.exists() {
        info!(path = %path.display(), "config file not found, using defaults");
        return Ok(CliConfig::default());
    }

    let content = tokio::fs::read_to_string(path).await?;
    let config: CliConfig = toml::from_str(&content)?;
    debug!(path = %path.display(), "loaded config file");

    Ok(config)
}

/// Write the commented template to `path`, creating its directory.
pub async fn init_config(path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    tokio::fs::write(path, TEMPLATE).await?;
    info!(path = %path.display(), "created default config");

    Ok(())
}
