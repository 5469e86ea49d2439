//! Repository seams for chats and messages.
//!
//! The sqlite repositories from `parley-database` implement these traits for production;
//! [`MockChatStore`] implements both for tests.

mod mock_repositories;

pub use mock_repositories::MockChatStore;

use parley_database::{
    Chat, ChatRepository, Message, MessageRepository, NewMessage, ParticipantPair, StoreResult,
};
use std::future::Future;

/// Trait for chat repositories to allow generic usage
pub trait ChatRepo: Send + Sync {
    fn find_by_id(&self, chat_id: &str) -> impl Future<Output = StoreResult<Option<Chat>>> + Send;

    fn find_by_pair(
        &self,
        pair: &ParticipantPair,
    ) -> impl Future<Output = StoreResult<Option<Chat>>> + Send;

    /// Chats containing `user_id`, most recent activity first
    fn find_by_participant(
        &self,
        user_id: &str,
    ) -> impl Future<Output = StoreResult<Vec<Chat>>> + Send;

    /// Persist a new chat; a second chat for the same pair fails with `StoreError::DuplicatePair`
    fn create(&self, pair: &ParticipantPair) -> impl Future<Output = StoreResult<Chat>> + Send;
}

/// Trait for message repositories to allow generic usage
pub trait MessageRepo: Send + Sync {
    fn find_by_id(
        &self,
        message_id: &str,
    ) -> impl Future<Output = StoreResult<Option<Message>>> + Send;

    /// Messages of a chat, oldest first
    fn list_for_chat(&self, chat_id: &str)
        -> impl Future<Output = StoreResult<Vec<Message>>> + Send;

    /// Append a message and advance the chat's last-message pointer atomically
    fn append(&self, message: &NewMessage) -> impl Future<Output = StoreResult<Message>> + Send;
}

impl ChatRepo for ChatRepository {
    async fn find_by_id(&self, chat_id: &str) -> StoreResult<Option<Chat>> {
        self.find_by_id(chat_id).await
    }

    async fn find_by_pair(&self, pair: &ParticipantPair) -> StoreResult<Option<Chat>> {
        self.find_by_pair(pair).await
    }

    async fn find_by_participant(&self, user_id: &str) -> StoreResult<Vec<Chat>> {
        self.find_by_participant(user_id).await
    }

    async fn create(&self, pair: &ParticipantPair) -> StoreResult<Chat> {
        self.create(pair).await
    }
}

impl MessageRepo for MessageRepository {
    async fn find_by_id(&self, message_id: &str) -> StoreResult<Option<Message>> {
        self.find_by_id(message_id).await
    }

    async fn list_for_chat(&self, chat_id: &str) -> StoreResult<Vec<Message>> {
        self.find_by_chat(chat_id).await
    }

    async fn append(&self, message: &NewMessage) -> StoreResult<Message> {
        self.append(message).await
    }
}

impl ChatRepo for MockChatStore {
    async fn find_by_id(&self, chat_id: &str) -> StoreResult<Option<Chat>> {
        self.find_chat(chat_id).await
    }

    async fn find_by_pair(&self, pair: &ParticipantPair) -> StoreResult<Option<Chat>> {
        self.find_chat_by_pair(pair).await
    }

    async fn find_by_participant(&self, user_id: &str) -> StoreResult<Vec<Chat>> {
        self.chats_for(user_id).await
    }

    async fn create(&self, pair: &ParticipantPair) -> StoreResult<Chat> {
        self.create_chat(pair).await
    }
}

impl MessageRepo for MockChatStore {
    async fn find_by_id(&self, message_id: &str) -> StoreResult<Option<Message>> {
        self.find_message(message_id).await
    }

    async fn list_for_chat(&self, chat_id: &str) -> StoreResult<Vec<Message>> {
        self.messages_in(chat_id).await
    }

    async fn append(&self, message: &NewMessage) -> StoreResult<Message> {
        self.append_message(message).await
    }
}
