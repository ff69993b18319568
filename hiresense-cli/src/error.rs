//! Error type for the command line.

use crate::config::ConfigError;

/// Errors surfaced to the user by a CLI command.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Failure from the HireSense client.
    #[error(transparent)]
    Client(#[from] hiresense::Error),

    /// Configuration file problem.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Reading input files or the terminal.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Rendering output.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Bad command line input.
    #[error("{0}")]
    Invalid(String),
}

impl CliError {
    /// Create an invalid input error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Result type for CLI commands.
pub type Result<T> = std::result::Result<T, CliError>;
