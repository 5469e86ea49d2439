//! Shared types for the chat system.

pub mod errors;
pub mod responses;

pub use errors::{ChatError, ChatResult};
pub use responses::{ChatSummary, LastMessage, MessageWithSender};
