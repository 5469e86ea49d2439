//! Parley Database Crate
//!
//! Connection management, migrations, stored entities and the sqlite
//! repositories backing users, chats and messages.

use parley_config::DatabaseConfig;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::prepare_database;
pub use migrations::{run_migrations, MIGRATOR};

pub use repos::{ChatRepository, MessageRepository, UserRepository};

pub use entities::{Chat, ExternalIdentity, Message, NewMessage, ParticipantPair, User, UserProfile};

pub use types::{bounded, format_timestamp, new_id, timestamp_now, StoreError, StoreResult};

pub use sqlx::SqlitePool;

/// Connect to the configured database and apply migrations
pub async fn initialize_database(config: &DatabaseConfig) -> StoreResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| StoreError::Connection(format!("{e:#}")))?;

    run_migrations(&pool)
        .await
        .map_err(|e| StoreError::Migration(format!("{e:#}")))?;

    Ok(pool)
}
