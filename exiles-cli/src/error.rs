use exiles_lib::{EngineError, SettingsError};
use thiserror::Error;

/// Errors that can occur during CLI command execution.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// I/O error
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Settings could not be resolved
    #[error("{0}")]
    Settings(#[from] SettingsError),

    /// Aggregation or database error
    #[error("{0}")]
    Engine(#[from] EngineError),

    /// JSON output failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Bad combination of command-line arguments
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// Lookup found nothing
    #[error("Not found: {0}")]
    NotFound(String),
}

impl CliError {
    pub(crate) fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArgs(msg.into())
    }

    pub(crate) fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
