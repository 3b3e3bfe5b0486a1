//! Error types for the Authorizer.

use authorizer_core::{Account, CoreError, Operation, PermissionKey};
use authorizer_perms::PermsError;
use authorizer_store::StoreError;
use thiserror::Error;

use crate::authorizer::Decision;

/// Errors that can occur during Authorizer operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A guarded call was not authorized.
    #[error("permission denied: {who} may not call {what} on {target} ({decision})")]
    PermissionDenied {
        who: Account,
        target: Account,
        what: Operation,
        decision: Decision,
    },

    /// The submitter may not administer a primitive of the change set.
    ///
    /// Raised before anything from the set is applied.
    #[error("unauthorized change set: {submitter} may not {action} {key}")]
    UnauthorizedChangeSet {
        submitter: Account,
        action: &'static str,
        key: PermissionKey,
    },

    /// `initialize` was called on an authorizer that already holds
    /// permissions on its own account.
    #[error("authorizer {0} is already initialized")]
    AlreadyInitialized(Account),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The change set could not be processed.
    #[error("invalid change set: {0}")]
    InvalidChangeSet(#[from] PermsError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

impl AuthError {
    /// Whether this error is a denied authorization of any kind.
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            AuthError::PermissionDenied { .. } | AuthError::UnauthorizedChangeSet { .. }
        )
    }
}

/// Result type for Authorizer operations.
pub type Result<T> = std::result::Result<T, AuthError>;
