//! Response shapes produced by the conversation service.

use parley_database::{Message, UserProfile};
use serde::Serialize;

/// A chat as seen by one of its participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatSummary {
    pub id: String,
    /// The participant that is not the viewer; `None` when their profile cannot be resolved.
    pub participant: Option<UserProfile>,
    pub last_message: Option<LastMessage>,
    pub last_message_at: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastMessage {
    pub id: String,
    pub body: String,
    pub sender_id: String,
    pub created_at: String,
}

impl From<Message> for LastMessage {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            body: message.body,
            sender_id: message.sender_id,
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageWithSender {
    pub id: String,
    pub chat_id: String,
    pub body: String,
    pub created_at: String,
    pub sender: Option<UserProfile>,
}

impl MessageWithSender {
    pub fn new(message: Message, sender: Option<UserProfile>) -> Self {
        Self {
            id: message.id,
            chat_id: message.chat_id,
            body: message.body,
            created_at: message.created_at,
            sender,
        }
    }
}
