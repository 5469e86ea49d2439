//! Stored entity definitions

pub mod chat;
pub mod message;
pub mod user;

pub use chat::{Chat, ParticipantPair};
pub use message::{Message, NewMessage};
pub use user::{ExternalIdentity, User, UserProfile};
