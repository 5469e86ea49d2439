//! Shared types for the user directory.

pub mod errors;

pub use errors::UserError;

pub type UserResult<T> = Result<T, UserError>;
