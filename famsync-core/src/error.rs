//! Error types for famsync.

use thiserror::Error;

/// Errors that can occur in famsync operations.
///
/// Commands that target an unknown id or a virtual occurrence are not errors;
/// they come back as [`crate::command::Effect::Ignored`].
#[derive(Error, Debug)]
pub enum FamSyncError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid date '{0}'. Expected an ISO-8601 date or date-time")]
    InvalidDate(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for tool '{tool}': {reason}")]
    InvalidToolArguments { tool: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for FamSyncError {
    fn from(e: serde_json::Error) -> Self {
        FamSyncError::Serialization(e.to_string())
    }
}

/// Result type alias for famsync operations.
pub type FamSyncResult<T> = Result<T, FamSyncError>;
