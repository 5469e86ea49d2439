//! Business logic services for chats and messages.

pub mod conversation_service;

pub use conversation_service::ConversationService;
