//! Conversation service: pairwise chat lookup, summaries and membership-scoped messages.

use crate::repositories::{ChatRepo, MessageRepo};
use crate::types::{ChatError, ChatResult, ChatSummary, LastMessage, MessageWithSender};
use crate::utils::validation;
use parley_database::{
    bounded, Chat, ChatRepository, MessageRepository, NewMessage, ParticipantPair, StoreError,
    UserProfile, UserRepository,
};
use parley_users::UserRepo;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

/// Service for chat and message operations
#[derive(Clone)]
pub struct ConversationService<U, C, M> {
    users: U,
    chats: C,
    messages: M,
    operation_timeout: Duration,
}

impl ConversationService<UserRepository, ChatRepository, MessageRepository> {
    /// Create a service backed by the sqlite repositories
    pub fn new(pool: SqlitePool, operation_timeout: Duration) -> Self {
        Self::with_repositories(
            UserRepository::new(pool.clone()),
            ChatRepository::new(pool.clone()),
            MessageRepository::new(pool),
            operation_timeout,
        )
    }
}

impl<U, C, M> ConversationService<U, C, M>
where
    U: UserRepo,
    C: ChatRepo,
    M: MessageRepo,
{
    pub fn with_repositories(users: U, chats: C, messages: M, operation_timeout: Duration) -> Self {
        Self {
            users,
            chats,
            messages,
            operation_timeout,
        }
    }

    /// Every chat the user takes part in, most recent activity first
    pub async fn find_chats_for_user(&self, user_id: &str) -> ChatResult<Vec<ChatSummary>> {
        let chats = bounded(self.operation_timeout, self.chats.find_by_participant(user_id)).await?;
        if chats.is_empty() {
            return Ok(Vec::new());
        }

        let other_ids: Vec<String> = chats
            .iter()
            .filter_map(|chat| chat.other_participant(user_id))
            .map(str::to_string)
            .collect();
        let profiles = self.profiles_by_id(&other_ids).await?;

        let mut summaries = Vec::with_capacity(chats.len());
        for chat in chats {
            let last_message = self.last_message(&chat).await?;
            let participant = chat
                .other_participant(user_id)
                .and_then(|id| profiles.get(id).cloned());
            summaries.push(summarize(chat, participant, last_message));
        }

        Ok(summaries)
    }

    /// Find the chat between the two users, creating it on first request.
    ///
    /// Safe under concurrent calls for the same pair: when the insert loses the race
    /// against another writer the existing chat is read back and returned.
    pub async fn get_or_create_chat(
        &self,
        user_id: &str,
        participant_id: &str,
    ) -> ChatResult<ChatSummary> {
        validation::participant_id(participant_id)?;
        let pair = ParticipantPair::new(user_id, participant_id)
            .ok_or_else(|| ChatError::invalid("cannot start a chat with yourself"))?;

        let participant = bounded(self.operation_timeout, self.users.find_by_id(participant_id))
            .await?
            .ok_or(ChatError::NotFound)?
            .profile();

        let chat = match bounded(self.operation_timeout, self.chats.find_by_pair(&pair)).await? {
            Some(chat) => chat,
            None => self.create_or_reread(&pair).await?,
        };

        let last_message = self.last_message(&chat).await?;
        Ok(summarize(chat, Some(participant), last_message))
    }

    /// Messages of a chat the user participates in, oldest first
    pub async fn list_messages(
        &self,
        chat_id: &str,
        user_id: &str,
    ) -> ChatResult<Vec<MessageWithSender>> {
        let chat = self.member_chat(chat_id, user_id).await?;

        let messages = bounded(self.operation_timeout, self.messages.list_for_chat(&chat.id)).await?;
        let participants: Vec<String> = chat.participants().iter().map(|id| id.to_string()).collect();
        let senders = self.profiles_by_id(&participants).await?;

        Ok(messages
            .into_iter()
            .map(|message| {
                let sender = senders.get(&message.sender_id).cloned();
                MessageWithSender::new(message, sender)
            })
            .collect())
    }

    /// Append a message from one of the chat's participants
    pub async fn send_message(
        &self,
        chat_id: &str,
        sender_id: &str,
        body: &str,
    ) -> ChatResult<MessageWithSender> {
        let chat = self.member_chat(chat_id, sender_id).await?;
        let body = validation::message_body(body)?;

        let request = NewMessage {
            chat_id: chat.id,
            sender_id: sender_id.to_string(),
            body: body.to_string(),
        };
        let message = bounded(self.operation_timeout, self.messages.append(&request)).await?;
        let sender = self
            .profiles_by_id(&[sender_id.to_string()])
            .await?
            .remove(sender_id);

        info!(chat_id = %message.chat_id, message_id = %message.id, "message sent");
        Ok(MessageWithSender::new(message, sender))
    }

    /// Resolve a chat for a participant; absence and non-membership are the same outcome.
    async fn member_chat(&self, chat_id: &str, user_id: &str) -> ChatResult<Chat> {
        if !validation::is_well_formed_id(chat_id) {
            return Err(ChatError::NotFound);
        }

        match bounded(self.operation_timeout, self.chats.find_by_id(chat_id)).await? {
            Some(chat) if chat.has_participant(user_id) => Ok(chat),
            Some(_) => {
                debug!(chat_id, user_id, "chat access by non-participant");
                Err(ChatError::NotFound)
            }
            None => Err(ChatError::NotFound),
        }
    }

    async fn create_or_reread(&self, pair: &ParticipantPair) -> ChatResult<Chat> {
        match bounded(self.operation_timeout, self.chats.create(pair)).await {
            Ok(chat) => Ok(chat),
            Err(StoreError::DuplicatePair) => {
                debug!(low = pair.low(), high = pair.high(), "chat created concurrently, re-reading");
                bounded(self.operation_timeout, self.chats.find_by_pair(pair))
                    .await?
                    .ok_or_else(|| {
                        ChatError::Store(StoreError::Corrupt(
                            "duplicate chat reported but none found".to_string(),
                        ))
                    })
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn last_message(&self, chat: &Chat) -> ChatResult<Option<LastMessage>> {
        let Some(message_id) = chat.last_message_id.as_deref() else {
            return Ok(None);
        };
        let message = bounded(self.operation_timeout, self.messages.find_by_id(message_id)).await?;
        Ok(message.map(LastMessage::from))
    }

    async fn profiles_by_id(&self, ids: &[String]) -> ChatResult<HashMap<String, UserProfile>> {
        let profiles = bounded(self.operation_timeout, self.users.find_profiles(ids)).await?;
        Ok(profiles
            .into_iter()
            .map(|profile| (profile.id.clone(), profile))
            .collect())
    }
}

fn summarize(
    chat: Chat,
    participant: Option<UserProfile>,
    last_message: Option<LastMessage>,
) -> ChatSummary {
    ChatSummary {
        id: chat.id,
        participant,
        last_message,
        last_message_at: chat.last_message_at,
        created_at: chat.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MockChatStore;
    use parley_database::{ExternalIdentity, Message, StoreResult, User};
    use parley_users::MockUserRepository;
    use std::sync::atomic::{AtomicBool, Ordering};

    const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

    type TestService = ConversationService<MockUserRepository, MockChatStore, MockChatStore>;

    struct Fixture {
        service: TestService,
        store: MockChatStore,
        alice: User,
        bob: User,
        stranger: User,
    }

    async fn user(users: &MockUserRepository, handle: &str) -> User {
        users
            .upsert_identity(&ExternalIdentity {
                external_id: format!("idp|{handle}"),
                name: handle.to_string(),
                email: format!("{handle}@x.com"),
                avatar: None,
            })
            .await
            .unwrap()
    }

    async fn fixture() -> Fixture {
        let users = MockUserRepository::new();
        let alice = user(&users, "alice").await;
        let bob = user(&users, "bob").await;
        let stranger = user(&users, "stranger").await;

        let store = MockChatStore::new();
        let service = ConversationService::with_repositories(
            users,
            store.clone(),
            store.clone(),
            DEFAULT_OPERATION_TIMEOUT,
        );

        Fixture {
            service,
            store,
            alice,
            bob,
            stranger,
        }
    }

    #[tokio::test]
    async fn worked_example() {
        let f = fixture().await;

        let first = f.service.get_or_create_chat(&f.alice.id, &f.bob.id).await.unwrap();
        let participant = first.participant.clone().unwrap();
        assert_eq!(participant.id, f.bob.id);
        assert_eq!(participant.email, "bob@x.com");
        assert!(first.last_message.is_none());
        assert_eq!(first.last_message_at, first.created_at);

        let second = f.service.get_or_create_chat(&f.alice.id, &f.bob.id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(f.store.chat_count().await, 1);

        let own = f.service.get_or_create_chat(&f.alice.id, &f.alice.id).await;
        assert!(matches!(own, Err(ChatError::InvalidArgument { .. })));

        let peek = f.service.list_messages(&first.id, &f.stranger.id).await;
        assert!(matches!(peek, Err(ChatError::NotFound)));
    }

    #[tokio::test]
    async fn pair_order_does_not_matter() {
        let f = fixture().await;

        let from_alice = f.service.get_or_create_chat(&f.alice.id, &f.bob.id).await.unwrap();
        let from_bob = f.service.get_or_create_chat(&f.bob.id, &f.alice.id).await.unwrap();

        assert_eq!(from_alice.id, from_bob.id);
        assert_eq!(from_bob.participant.unwrap().id, f.alice.id);
        assert_eq!(f.store.chat_count().await, 1);
    }

    #[tokio::test]
    async fn self_chat_rejected_before_any_lookup() {
        let f = fixture().await;
        let unknown = parley_database::new_id();

        let result = f.service.get_or_create_chat(&unknown, &unknown).await;

        assert!(matches!(
            result,
            Err(ChatError::InvalidArgument { message }) if message == "cannot start a chat with yourself"
        ));
        assert_eq!(f.store.chat_count().await, 0);
    }

    #[tokio::test]
    async fn malformed_or_missing_participant() {
        let f = fixture().await;

        let empty = f.service.get_or_create_chat(&f.alice.id, "").await;
        assert!(matches!(empty, Err(ChatError::InvalidArgument { .. })));

        let malformed = f.service.get_or_create_chat(&f.alice.id, "Robert'); DROP").await;
        assert!(matches!(malformed, Err(ChatError::InvalidArgument { .. })));

        let missing = f
            .service
            .get_or_create_chat(&f.alice.id, &parley_database::new_id())
            .await;
        assert!(matches!(missing, Err(ChatError::NotFound)));
        assert_eq!(f.store.chat_count().await, 0);
    }

    #[tokio::test]
    async fn concurrent_get_or_create_yields_one_chat() {
        let f = fixture().await;

        let (a, b, c) = tokio::join!(
            f.service.get_or_create_chat(&f.alice.id, &f.bob.id),
            f.service.get_or_create_chat(&f.bob.id, &f.alice.id),
            f.service.get_or_create_chat(&f.alice.id, &f.bob.id),
        );

        let ids = [a.unwrap().id, b.unwrap().id, c.unwrap().id];
        assert!(ids.iter().all(|id| id == &ids[0]));
        assert_eq!(f.store.chat_count().await, 1);
    }

    /// Reports no chat for the first pair lookup, as if another writer raced us.
    #[derive(Clone)]
    struct StaleFirstRead {
        inner: MockChatStore,
        served_stale: std::sync::Arc<AtomicBool>,
    }

    impl ChatRepo for StaleFirstRead {
        async fn find_by_id(&self, chat_id: &str) -> StoreResult<Option<Chat>> {
            self.inner.find_chat(chat_id).await
        }

        async fn find_by_pair(&self, pair: &ParticipantPair) -> StoreResult<Option<Chat>> {
            if !self.served_stale.swap(true, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.find_chat_by_pair(pair).await
        }

        async fn find_by_participant(&self, user_id: &str) -> StoreResult<Vec<Chat>> {
            self.inner.chats_for(user_id).await
        }

        async fn create(&self, pair: &ParticipantPair) -> StoreResult<Chat> {
            self.inner.create_chat(pair).await
        }
    }

    #[tokio::test]
    async fn duplicate_insert_falls_back_to_existing_chat() {
        let users = MockUserRepository::new();
        let alice = user(&users, "alice").await;
        let bob = user(&users, "bob").await;

        let store = MockChatStore::new();
        let existing = store
            .create_chat(&ParticipantPair::new(&alice.id, &bob.id).unwrap())
            .await
            .unwrap();

        let service = ConversationService::with_repositories(
            users,
            StaleFirstRead {
                inner: store.clone(),
                served_stale: Default::default(),
            },
            store.clone(),
            DEFAULT_OPERATION_TIMEOUT,
        );

        let summary = service.get_or_create_chat(&bob.id, &alice.id).await.unwrap();

        assert_eq!(summary.id, existing.id);
        assert_eq!(store.chat_count().await, 1);
    }

    #[tokio::test]
    async fn listing_redacts_to_the_other_participant() {
        let f = fixture().await;
        f.service.get_or_create_chat(&f.alice.id, &f.bob.id).await.unwrap();
        f.service.get_or_create_chat(&f.stranger.id, &f.alice.id).await.unwrap();

        let for_alice = f.service.find_chats_for_user(&f.alice.id).await.unwrap();
        assert_eq!(for_alice.len(), 2);
        for summary in &for_alice {
            assert_ne!(summary.participant.as_ref().unwrap().id, f.alice.id);
        }

        let for_bob = f.service.find_chats_for_user(&f.bob.id).await.unwrap();
        assert_eq!(for_bob.len(), 1);
        assert_eq!(for_bob[0].participant.as_ref().unwrap().id, f.alice.id);

        let nobody = f.service.find_chats_for_user(&parley_database::new_id()).await.unwrap();
        assert!(nobody.is_empty());
    }

    #[tokio::test]
    async fn sending_updates_last_message_and_ordering() {
        let f = fixture().await;
        let with_bob = f.service.get_or_create_chat(&f.alice.id, &f.bob.id).await.unwrap();
        let with_stranger = f
            .service
            .get_or_create_chat(&f.alice.id, &f.stranger.id)
            .await
            .unwrap();

        let listed = f.service.find_chats_for_user(&f.alice.id).await.unwrap();
        assert_eq!(listed[0].id, with_stranger.id);

        tokio::time::sleep(Duration::from_millis(2)).await;
        let sent = f.service.send_message(&with_bob.id, &f.bob.id, "hey alice").await.unwrap();
        assert_eq!(sent.sender.as_ref().unwrap().id, f.bob.id);

        let listed = f.service.find_chats_for_user(&f.alice.id).await.unwrap();
        assert_eq!(listed[0].id, with_bob.id);
        let last = listed[0].last_message.as_ref().unwrap();
        assert_eq!(last.id, sent.id);
        assert_eq!(last.body, "hey alice");
        assert_eq!(last.sender_id, f.bob.id);
        assert_eq!(listed[0].last_message_at, sent.created_at);

        let again = f.service.get_or_create_chat(&f.bob.id, &f.alice.id).await.unwrap();
        assert_eq!(again.last_message.unwrap().id, sent.id);
    }

    #[tokio::test]
    async fn messages_are_scoped_to_participants() {
        let f = fixture().await;
        let chat = f.service.get_or_create_chat(&f.alice.id, &f.bob.id).await.unwrap();
        f.service.send_message(&chat.id, &f.alice.id, "secret").await.unwrap();

        let outsider = f.service.list_messages(&chat.id, &f.stranger.id).await.unwrap_err();
        let missing = f
            .service
            .list_messages(&parley_database::new_id(), &f.alice.id)
            .await
            .unwrap_err();
        let malformed = f.service.list_messages("../etc", &f.alice.id).await.unwrap_err();

        assert!(matches!(outsider, ChatError::NotFound));
        assert!(matches!(missing, ChatError::NotFound));
        assert!(matches!(malformed, ChatError::NotFound));
        assert_eq!(outsider.to_string(), missing.to_string());
    }

    #[tokio::test]
    async fn non_participant_cannot_send() {
        let f = fixture().await;
        let chat = f.service.get_or_create_chat(&f.alice.id, &f.bob.id).await.unwrap();

        let result = f.service.send_message(&chat.id, &f.stranger.id, "let me in").await;

        assert!(matches!(result, Err(ChatError::NotFound)));
        assert!(f.service.list_messages(&chat.id, &f.alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_body_is_rejected() {
        let f = fixture().await;
        let chat = f.service.get_or_create_chat(&f.alice.id, &f.bob.id).await.unwrap();

        let result = f.service.send_message(&chat.id, &f.alice.id, "   ").await;
        assert!(matches!(result, Err(ChatError::InvalidArgument { .. })));
    }

    #[tokio::test]
    async fn body_is_stored_without_surrounding_whitespace() {
        let f = fixture().await;
        let chat = f.service.get_or_create_chat(&f.alice.id, &f.bob.id).await.unwrap();

        let sent = f
            .service
            .send_message(&chat.id, &f.alice.id, "\n  see you at noon  \t")
            .await
            .unwrap();
        assert_eq!(sent.body, "see you at noon");

        let listed = f.service.list_messages(&chat.id, &f.bob.id).await.unwrap();
        assert_eq!(listed[0].body, "see you at noon");
        let summary = f.service.get_or_create_chat(&f.bob.id, &f.alice.id).await.unwrap();
        assert_eq!(summary.last_message.unwrap().body, "see you at noon");
    }

    #[tokio::test]
    async fn messages_come_back_in_time_order() {
        let f = fixture().await;
        let chat = f.service.get_or_create_chat(&f.alice.id, &f.bob.id).await.unwrap();

        for (sender, body) in [(&f.alice, "m1"), (&f.bob, "m2"), (&f.alice, "m3")] {
            f.service.send_message(&chat.id, &sender.id, body).await.unwrap();
        }
        // stored out of order with an earlier timestamp than everything above
        f.store
            .insert_raw_message(Message {
                id: parley_database::new_id(),
                chat_id: chat.id.clone(),
                sender_id: f.bob.id.clone(),
                body: "m0".into(),
                created_at: "2000-01-01T00:00:00.000000Z".into(),
            })
            .await;

        let messages = f.service.list_messages(&chat.id, &f.bob.id).await.unwrap();
        let bodies: Vec<_> = messages.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["m0", "m1", "m2", "m3"]);
        assert!(messages
            .windows(2)
            .all(|pair| pair[0].created_at <= pair[1].created_at));
        assert_eq!(messages[1].sender.as_ref().unwrap().name, "alice");
    }

    #[tokio::test]
    async fn slow_store_surfaces_timeout() {
        #[derive(Clone)]
        struct Stalled;

        impl ChatRepo for Stalled {
            async fn find_by_id(&self, _chat_id: &str) -> StoreResult<Option<Chat>> {
                std::future::pending().await
            }
            async fn find_by_pair(&self, _pair: &ParticipantPair) -> StoreResult<Option<Chat>> {
                std::future::pending().await
            }
            async fn find_by_participant(&self, _user_id: &str) -> StoreResult<Vec<Chat>> {
                std::future::pending().await
            }
            async fn create(&self, _pair: &ParticipantPair) -> StoreResult<Chat> {
                std::future::pending().await
            }
        }

        let service = ConversationService::with_repositories(
            MockUserRepository::new(),
            Stalled,
            MockChatStore::new(),
            Duration::from_millis(20),
        );

        let result = service.find_chats_for_user("someone").await;
        assert!(matches!(
            result,
            Err(ChatError::Store(StoreError::Timeout(_)))
        ));
    }
}
