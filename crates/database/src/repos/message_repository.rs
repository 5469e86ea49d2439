//! Repository for message data access operations.

use crate::entities::{Message, NewMessage};
use crate::types::{new_id, timestamp_now, StoreError, StoreResult};
use sqlx::SqlitePool;
use tracing::info;

/// Repository for message database operations
#[derive(Clone)]
pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    /// Create a new message repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find message by ID
    pub async fn find_by_id(&self, message_id: &str) -> StoreResult<Option<Message>> {
        let message = sqlx::query_as::<_, Message>(
            "SELECT id, chat_id, sender_id, body, created_at FROM messages WHERE id = ?",
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message)
    }

    /// All messages of a chat, oldest first; ties keep insertion order
    pub async fn find_by_chat(&self, chat_id: &str) -> StoreResult<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, chat_id, sender_id, body, created_at
            FROM messages
            WHERE chat_id = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    /// Append a message and move the owning chat's last-message pointer in one transaction
    pub async fn append(&self, request: &NewMessage) -> StoreResult<Message> {
        let message = Message {
            id: new_id(),
            chat_id: request.chat_id.clone(),
            sender_id: request.sender_id.clone(),
            body: request.body.clone(),
            created_at: timestamp_now(),
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO messages (id, chat_id, sender_id, body, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&message.id)
        .bind(&message.chat_id)
        .bind(&message.sender_id)
        .bind(&message.body)
        .bind(&message.created_at)
        .execute(&mut *tx)
        .await?;

        // Concurrent appends may commit out of timestamp order; only a newer message moves the pointer.
        let updated = sqlx::query(
            r#"
            UPDATE chats
            SET last_message_id = ?, last_message_at = ?, updated_at = ?
            WHERE id = ? AND last_message_at <= ?
            "#,
        )
        .bind(&message.id)
        .bind(&message.created_at)
        .bind(&message.created_at)
        .bind(&message.chat_id)
        .bind(&message.created_at)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM chats WHERE id = ?")
                .bind(&message.chat_id)
                .fetch_optional(&mut *tx)
                .await?;
            if exists.is_none() {
                return Err(StoreError::Corrupt(format!(
                    "chat {} disappeared while appending a message",
                    message.chat_id
                )));
            }
        }

        tx.commit().await?;

        info!(message_id = %message.id, chat_id = %message.chat_id, sender_id = %message.sender_id, "appended message");
        Ok(message)
    }
}
