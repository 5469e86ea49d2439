//! Error types for the storage layer

use std::time::Duration;
use thiserror::Error;

/// Failure reported by a repository.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database connection error: {0}")]
    Connection(String),

    #[error("database migration error: {0}")]
    Migration(String),

    #[error("database query error: {0}")]
    Query(#[from] sqlx::Error),

    /// A chat for the same canonical participant pair already exists.
    #[error("a chat already exists for this participant pair")]
    DuplicatePair,

    #[error("duplicate value for unique field `{field}`")]
    Duplicate { field: &'static str },

    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("stored record is malformed: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Whether the caller may reasonably retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Timeout(_) | StoreError::Connection(_))
    }

    /// Classify a failed insert, translating unique violations into domain signals.
    pub(crate) fn from_insert(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_error) = &error {
            if db_error.is_unique_violation() {
                let message = db_error.message();
                if message.contains("participant_low") {
                    return StoreError::DuplicatePair;
                }
                if message.contains("users.email") {
                    return StoreError::Duplicate { field: "email" };
                }
                if message.contains("users.external_id") {
                    return StoreError::Duplicate { field: "external_id" };
                }
            }
        }
        StoreError::Query(error)
    }
}
