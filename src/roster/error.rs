//! Roster error types.

use thiserror::Error;

/// Failure reported by the student store. The message reaches the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StorageFailure {
    pub message: String,
}

impl StorageFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for StorageFailure {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        StorageFailure::new(format!("Database error: {}", err))
    }
}

/// Errors from roster operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    /// Input rejected before the store was called.
    #[error("{0}")]
    Validation(String),

    /// No session has loaded the roster yet.
    #[error("Student list is not loaded")]
    NotLoaded,

    #[error("Student {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageFailure),

    /// The session changed while the store call was in flight; the result was dropped.
    #[error("Session changed before the operation completed")]
    SessionChanged,
}
