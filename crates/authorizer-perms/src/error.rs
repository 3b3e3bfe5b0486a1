//! Error types for the permissions module.

use thiserror::Error;

/// Errors that can occur while processing a change set.
#[derive(Debug, Error)]
pub enum PermsError {
    /// The change set is structurally invalid.
    #[error("invalid change set: {0}")]
    InvalidChangeSet(String),

    /// A grant carries a condition that cannot apply to its operation.
    #[error("invalid condition {position} for {what}: {reason}")]
    InvalidCondition {
        what: String,
        position: usize,
        reason: String,
    },

    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] authorizer_core::CoreError),
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
