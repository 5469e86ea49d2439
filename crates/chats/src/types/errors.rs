//! Error types for the chat system.

use parley_database::StoreError;
use thiserror::Error;

/// Result type alias for chat operations
pub type ChatResult<T> = Result<T, ChatError>;

/// Main error type for the chat system
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{message}")]
    InvalidArgument { message: String },

    /// Covers both a missing chat and a chat the caller does not belong to.
    #[error("chat not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ChatError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ChatError::InvalidArgument {
            message: message.into(),
        }
    }
}
