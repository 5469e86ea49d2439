//! User repository for database operations.

use crate::entities::{ExternalIdentity, User, UserProfile};
use crate::types::{new_id, timestamp_now, StoreError, StoreResult};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::info;

const USER_COLUMNS: &str = "id, external_id, name, email, avatar, created_at, updated_at";

/// Repository for user database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find user by ID
    pub async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find user by external identity reference
    pub async fn find_by_external_id(&self, external_id: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE external_id = ?"
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Profiles for the given ids; unknown ids are skipped.
    pub async fn find_profiles(&self, ids: &[String]) -> StoreResult<Vec<UserProfile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT id, name, email, avatar FROM users WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let profiles = query
            .build_query_as::<UserProfile>()
            .fetch_all(&self.pool)
            .await?;

        Ok(profiles)
    }

    /// Every user except `user_id`, newest first.
    pub async fn list_excluding(&self, user_id: &str) -> StoreResult<Vec<UserProfile>> {
        let profiles = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, name, email, avatar
            FROM users
            WHERE id != ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(profiles)
    }

    /// Create the user for an external identity, or refresh its profile fields.
    pub async fn upsert_identity(&self, identity: &ExternalIdentity) -> StoreResult<User> {
        let identity = identity.normalized();
        let now = timestamp_now();

        sqlx::query(
            r#"
            INSERT INTO users (id, external_id, name, email, avatar, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (external_id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                avatar = excluded.avatar,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(new_id())
        .bind(&identity.external_id)
        .bind(&identity.name)
        .bind(&identity.email)
        .bind(identity.avatar.as_deref().unwrap_or_default())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_insert)?;

        let user = self
            .find_by_external_id(&identity.external_id)
            .await?
            .ok_or_else(|| StoreError::Corrupt("linked user vanished after upsert".to_string()))?;

        info!(user_id = %user.id, external_id = %user.external_id, "linked external identity");
        Ok(user)
    }
}
