//! Error types for the user directory.

use parley_database::StoreError;
use thiserror::Error;

/// User directory errors
#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}
