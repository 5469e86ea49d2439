use parley_chats::{ChatSummary, LastMessage, MessageWithSender};
use parley_database::UserProfile;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Public projection of a user
#[derive(Debug, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
}

impl From<UserProfile> for UserSummary {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            email: profile.email,
            avatar: profile.avatar,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LastMessageResponse {
    pub id: String,
    pub body: String,
    pub sender_id: String,
    pub created_at: String,
}

impl From<LastMessage> for LastMessageResponse {
    fn from(message: LastMessage) -> Self {
        Self {
            id: message.id,
            body: message.body,
            sender_id: message.sender_id,
            created_at: message.created_at,
        }
    }
}

/// A chat as seen by the caller; `participant` is the other member
#[derive(Debug, Serialize, ToSchema)]
pub struct ChatSummaryResponse {
    pub id: String,
    pub participant: Option<UserSummary>,
    pub last_message: Option<LastMessageResponse>,
    pub last_message_at: String,
    pub created_at: String,
}

impl From<ChatSummary> for ChatSummaryResponse {
    fn from(summary: ChatSummary) -> Self {
        Self {
            id: summary.id,
            participant: summary.participant.map(UserSummary::from),
            last_message: summary.last_message.map(LastMessageResponse::from),
            last_message_at: summary.last_message_at,
            created_at: summary.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub id: String,
    pub chat_id: String,
    pub body: String,
    pub created_at: String,
    pub sender: Option<UserSummary>,
}

impl From<MessageWithSender> for MessageResponse {
    fn from(message: MessageWithSender) -> Self {
        Self {
            id: message.id,
            chat_id: message.chat_id,
            body: message.body,
            created_at: message.created_at,
            sender: message.sender.map(UserSummary::from),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub body: String,
}
