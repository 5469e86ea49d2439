//! sqlite-backed repositories

pub mod chat_repository;
pub mod message_repository;
pub mod user_repository;

pub use chat_repository::ChatRepository;
pub use message_repository::MessageRepository;
pub use user_repository::UserRepository;
