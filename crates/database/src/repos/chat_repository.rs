//! Repository for chat data access operations.

use crate::entities::{Chat, ParticipantPair};
use crate::types::{new_id, timestamp_now, StoreError, StoreResult};
use sqlx::SqlitePool;
use tracing::{debug, info};

const CHAT_COLUMNS: &str =
    "id, participant_low, participant_high, last_message_id, last_message_at, created_at, updated_at";

/// Repository for chat database operations
#[derive(Clone)]
pub struct ChatRepository {
    pool: SqlitePool,
}

impl ChatRepository {
    /// Create a new chat repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find chat by ID
    pub async fn find_by_id(&self, chat_id: &str) -> StoreResult<Option<Chat>> {
        let chat = sqlx::query_as::<_, Chat>(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats WHERE id = ?"
        ))
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(chat)
    }

    /// Find the chat keyed by a canonical participant pair
    pub async fn find_by_pair(&self, pair: &ParticipantPair) -> StoreResult<Option<Chat>> {
        let chat = sqlx::query_as::<_, Chat>(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats WHERE participant_low = ? AND participant_high = ?"
        ))
        .bind(pair.low())
        .bind(pair.high())
        .fetch_optional(&self.pool)
        .await?;

        Ok(chat)
    }

    /// Chats the user participates in, most recent activity first
    pub async fn find_by_participant(&self, user_id: &str) -> StoreResult<Vec<Chat>> {
        let chats = sqlx::query_as::<_, Chat>(&format!(
            r#"
            SELECT {CHAT_COLUMNS}
            FROM chats
            WHERE participant_low = ? OR participant_high = ?
            ORDER BY last_message_at DESC, rowid DESC
            "#
        ))
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(chats)
    }

    /// Insert a chat for the pair.
    ///
    /// Fails with [`StoreError::DuplicatePair`] when a chat for the pair already exists.
    pub async fn create(&self, pair: &ParticipantPair) -> StoreResult<Chat> {
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

        let result = sqlx::query(
            r#"
            INSERT INTO chats (id, participant_low, participant_high, last_message_id, last_message_at, created_at, updated_at)
            VALUES (?, ?, ?, NULL, ?, ?, ?)
            "#,
        )
        .bind(&chat.id)
        .bind(&chat.participant_low)
        .bind(&chat.participant_high)
        .bind(&chat.last_message_at)
        .bind(&chat.created_at)
        .bind(&chat.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                info!(chat_id = %chat.id, low = %chat.participant_low, high = %chat.participant_high, "created new chat");
                Ok(chat)
            }
            Err(error) => {
                let error = StoreError::from_insert(error);
                if matches!(error, StoreError::DuplicatePair) {
                    debug!(low = %pair.low(), high = %pair.high(), "chat insert lost the race for its pair");
                }
                Err(error)
            }
        }
    }
}
