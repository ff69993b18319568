//! Error types for the hiresense client.
//!
//! [`ServiceError`] covers every way a call to a HireSense endpoint can fail
//! (rate limiting, exhausted quota, rejected requests, broken streams). It is
//! folded into the crate-wide [`Error`] via `Error::Service`, whose display
//! text is the service error's own so callers can show it to users as-is.

/// Result type alias for hiresense operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the hiresense crate.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Failure reported by, or while talking to, a HireSense endpoint.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the service error, if this is one.
    #[must_use]
    pub const fn as_service(&self) -> Option<&ServiceError> {
        match self {
            Self::Service(e) => Some(e),
            _ => None,
        }
    }

    /// Returns `true` if the operation was cancelled by the caller.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Service(ServiceError::Cancelled))
    }
}

/// Error type for calls to the chat, analysis and notification endpoints.
///
/// Every variant renders a message that is fit to show to an end user.
/// None of them are retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ServiceError {
    /// HTTP 429 from the endpoint. Holds the endpoint's wording.
    #[error("{0}")]
    RateLimited(&'static str),

    /// HTTP 402 from the endpoint. Holds the endpoint's wording.
    #[error("{0}")]
    QuotaExceeded(&'static str),

    /// Any other non-success status, or a request rejected before sending.
    #[error("{0}")]
    RequestFailed(String),

    /// The response did not follow the expected wire format.
    #[error("{0}")]
    Protocol(String),

    /// Transport failure (connect, timeout, broken body stream).
    #[error("{0}")]
    Network(String),

    /// The caller cancelled the operation.
    #[error("Request cancelled")]
    Cancelled,
}

impl ServiceError {
    /// Create a request failure.
    #[must_use]
    pub fn request_failed(message: impl Into<String>) -> Self {
        Self::RequestFailed(message.into())
    }

    /// Create a protocol error.
    #[must_use]
    pub fn protocol(reason: impl Into<String>) -> Self {
        Self::Protocol(reason.into())
    }

    /// Create a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Map a non-success HTTP status and its body to an error.
    ///
    /// 429 and 402 get dedicated variants worded per `wording`. Anything else
    /// becomes [`ServiceError::RequestFailed`] carrying the server's `error`
    /// text when the body is `{ "error": "..." }`, otherwise
    /// `wording.fallback`.
    #[must_use]
    pub fn from_status(status: u16, body: &str, wording: &StatusWording) -> Self {
        match status {
            429 => Self::RateLimited(wording.rate_limited),
            402 => Self::QuotaExceeded(wording.quota_exceeded),
            _ => {
                let message = serde_json::from_str::<ErrorBody>(body)
                    .ok()
                    .and_then(|b| b.error)
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| wording.fallback.to_owned());
                Self::RequestFailed(message)
            }
        }
    }
}

/// User-facing messages for one endpoint's failure statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusWording {
    /// Shown for 429.
    pub rate_limited: &'static str,
    /// Shown for 402.
    pub quota_exceeded: &'static str,
    /// Shown for other failures without a server message.
    pub fallback: &'static str,
}

impl StatusWording {
    /// Chat assistant.
    pub const CHAT: Self = Self {
        rate_limited: "Rate limit exceeded. Please wait a moment and try again.",
        quota_exceeded: "AI service quota exceeded. Please try again later.",
        fallback: "Failed to get response",
    };

    /// Resume analysis.
    pub const ANALYSIS: Self = Self {
        rate_limited: "Rate limit exceeded. Please try again later.",
        quota_exceeded: "AI credits exhausted. Please add funds.",
        fallback: "Analysis failed",
    };

    /// Notification emails.
    pub const NOTIFICATION: Self = Self {
        rate_limited: "Rate limit exceeded. Please try again later.",
        quota_exceeded: "Notification quota exceeded. Please try again later.",
        fallback: "Failed to send notification",
    };
}

/// Error body returned by the HireSense functions.
#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network("Request timed out")
        } else if err.is_connect() {
            Self::network(format!("Connection failed: {err}"))
        } else {
            Self::network(err.to_string())
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Service(err.into())
    }
}
