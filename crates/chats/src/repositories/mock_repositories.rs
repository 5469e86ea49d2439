//! In-memory chat and message store for testing

use parley_database::{
    new_id, timestamp_now, Chat, Message, NewMessage, ParticipantPair, StoreError, StoreResult,
};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    chats: Vec<Chat>,
    messages: Vec<Message>,
}

/// One store backing both chats and messages so the last-message pointer stays consistent.
///
/// Clones share the same state.
#[derive(Clone, Default)]
pub struct MockChatStore {
    state: Arc<RwLock<State>>,
}

impl MockChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn chat_count(&self) -> usize {
        self.state.read().await.chats.len()
    }

    pub async fn find_chat(&self, chat_id: &str) -> StoreResult<Option<Chat>> {
        let state = self.state.read().await;
        Ok(state.chats.iter().find(|c| c.id == chat_id).cloned())
    }

    pub async fn find_chat_by_pair(&self, pair: &ParticipantPair) -> StoreResult<Option<Chat>> {
        let state = self.state.read().await;
        Ok(state.chats.iter().find(|c| &c.pair() == pair).cloned())
    }

    pub async fn chats_for(&self, user_id: &str) -> StoreResult<Vec<Chat>> {
        let state = self.state.read().await;
        let mut chats: Vec<(usize, &Chat)> = state
            .chats
            .iter()
            .enumerate()
            .filter(|(_, chat)| chat.has_participant(user_id))
            .collect();
        chats.sort_by(|(ai, a), (bi, b)| {
            b.last_message_at
                .cmp(&a.last_message_at)
                .then_with(|| bi.cmp(ai))
        });
        Ok(chats.into_iter().map(|(_, chat)| chat.clone()).collect())
    }

    pub async fn create_chat(&self, pair: &ParticipantPair) -> StoreResult<Chat> {
        let mut state = self.state.write().await;
        if state.chats.iter().any(|c| &c.pair() == pair) {
            return Err(StoreError::DuplicatePair);
        }

        let now = timestamp_now();
        let chat = Chat {
            id: new_id(),
            participant_low: pair.low().to_string(),
            participant_high: pair.high().to_string(),
            last_message_id: None,
            last_message_at: now.clone(),
            created_at: now.clone(),
            updated_at: now,
        };
        state.chats.push(chat.clone());
        Ok(chat)
    }

    pub async fn find_message(&self, message_id: &str) -> StoreResult<Option<Message>> {
        let state = self.state.read().await;
        Ok(state.messages.iter().find(|m| m.id == message_id).cloned())
    }

    pub async fn messages_in(&self, chat_id: &str) -> StoreResult<Vec<Message>> {
        let state = self.state.read().await;
        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect();
        // stable: equal timestamps keep insertion order
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }

    pub async fn append_message(&self, request: &NewMessage) -> StoreResult<Message> {
        let mut state = self.state.write().await;
        let message = Message {
            id: new_id(),
            chat_id: request.chat_id.clone(),
            sender_id: request.sender_id.clone(),
            body: request.body.clone(),
            created_at: timestamp_now(),
        };

        let chat = state
            .chats
            .iter_mut()
            .find(|c| c.id == request.chat_id)
            .ok_or_else(|| StoreError::Corrupt(format!("chat {} does not exist", request.chat_id)))?;
        if chat.last_message_at <= message.created_at {
            chat.last_message_id = Some(message.id.clone());
            chat.last_message_at = message.created_at.clone();
            chat.updated_at = message.created_at.clone();
        }

        state.messages.push(message.clone());
        Ok(message)
    }

    /// Insert a message with a caller-chosen timestamp, bypassing the pointer update.
    pub async fn insert_raw_message(&self, message: Message) {
        self.state.write().await.messages.push(message);
    }
}
