//! Client configuration.

use url::Url;

use crate::error::{Error, Result};
use crate::parser::ParserLimits;

/// Configuration for the HireSense [`Client`](crate::Client).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Project base URL; functions live under `functions/v1/`.
    pub base_url: String,
    /// Bearer credential (the project's publishable key).
    pub api_key: String,
    /// Absolute chat endpoint, overriding the one derived from `base_url`.
    pub chat_endpoint: Option<String>,
    /// Timeout for single-shot calls in seconds. Streams are not bounded.
    pub timeout_secs: Option<u64>,
    /// Connect timeout in seconds, applied to every call.
    pub connect_timeout_secs: u64,
    /// Largest pending stream frame before the stream is abandoned.
    pub max_pending_bytes: usize,
}

impl ClientConfig {
    /// Path of the serverless functions below the base URL.
    pub const FUNCTIONS_PATH: &'static str = "functions/v1/";
    /// Chat assistant function name.
    pub const CHAT_FUNCTION: &'static str = "chat-assistant";
    /// Resume analysis function name.
    pub const ANALYZE_FUNCTION: &'static str = "analyze-resume";
    /// Notification function name.
    pub const NOTIFY_FUNCTION: &'static str = "send-notification";
    /// Default single-shot timeout.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
    /// Default connect timeout.
    pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

    /// Creates a new configuration for the given project and key.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            chat_endpoint: None,
            timeout_secs: Some(Self::DEFAULT_TIMEOUT_SECS),
            connect_timeout_secs: Self::DEFAULT_CONNECT_TIMEOUT_SECS,
            max_pending_bytes: ParserLimits::DEFAULT_MAX_PENDING_BYTES,
        }
    }

    /// Creates configuration from environment variables.
    ///
    /// Reads from:
    /// - `HIRESENSE_URL` - Required project base URL
    /// - `HIRESENSE_API_KEY` - Required bearer credential
    /// - `HIRESENSE_CHAT_URL` - Optional absolute chat endpoint
    /// - `HIRESENSE_TIMEOUT_SECS` - Optional single-shot timeout
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("HIRESENSE_URL")
            .map_err(|_| Error::config("HIRESENSE_URL environment variable not set"))?;
        let api_key = std::env::var("HIRESENSE_API_KEY")
            .map_err(|_| Error::config("HIRESENSE_API_KEY environment variable not set"))?;

        let mut config = Self::new(base_url, api_key);
        config.chat_endpoint = std::env::var("HIRESENSE_CHAT_URL").ok();

        if let Ok(raw) = std::env::var("HIRESENSE_TIMEOUT_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                Error::config(format!("HIRESENSE_TIMEOUT_SECS must be a number, got '{raw}'"))
            })?;
            config.timeout_secs = Some(secs);
        }

        Ok(config)
    }

    /// Sets the chat endpoint.
    #[must_use]
    pub fn with_chat_endpoint(mut self, url: impl Into<String>) -> Self {
        self.chat_endpoint = Some(url.into());
        self
    }

    /// Sets the single-shot request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Removes the single-shot request timeout.
    #[must_use]
    pub const fn without_timeout(mut self) -> Self {
        self.timeout_secs = None;
        self
    }

    /// Sets the pending frame bound.
    #[must_use]
    pub const fn with_max_pending_bytes(mut self, bytes: usize) -> Self {
        self.max_pending_bytes = bytes;
        self
    }

    /// Parser limits derived from this configuration.
    #[must_use]
    pub const fn parser_limits(&self) -> ParserLimits {
        ParserLimits::new(self.max_pending_bytes)
    }

    /// Resolve and validate every endpoint URL.
    pub fn endpoints(&self) -> Result<Endpoints> {
        if self.api_key.trim().is_empty() {
            return Err(Error::config("API key is required"));
        }

        let base = parse_http_url("base URL", &self.base_url)?;
        let mut functions = base;
        if !functions.path().ends_with('/') {
            let path = format!("{}/", functions.path());
            functions.set_path(&path);
        }
        let functions = join(&functions, Self::FUNCTIONS_PATH)?;

        let chat = match &self.chat_endpoint {
            Some(url) => parse_http_url("chat endpoint", url)?,
            None => join(&functions, Self::CHAT_FUNCTION)?,
        };

        Ok(Endpoints {
            chat,
            analyze: join(&functions, Self::ANALYZE_FUNCTION)?,
            notify: join(&functions, Self::NOTIFY_FUNCTION)?,
        })
    }
}

/// Resolved endpoint URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Streaming chat endpoint.
    pub chat: Url,
    /// Resume analysis endpoint.
    pub analyze: Url,
    /// Notification endpoint.
    pub notify: Url,
}

fn parse_http_url(what: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| Error::config(format!("invalid {what} '{raw}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(Error::config(format!(
            "{what} must be an absolute http(s) URL, got '{raw}'"
        )));
    }
    Ok(url)
}

fn join(base: &Url, segment: &str) -> Result<Url> {
    base.join(segment)
        .map_err(|e| Error::config(format!("cannot build endpoint '{segment}': {e}")))
}
