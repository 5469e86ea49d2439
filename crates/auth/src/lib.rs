use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use parley_config::AuthConfig;
use parley_database::{
    bounded, format_timestamp, ExternalIdentity, StoreError, StoreResult, User, UserRepository,
};
use rand::RngCore;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};

// Expiry timestamps must stay within four-digit years to round-trip through RFC 3339.
const MAX_SESSION_TTL_DAYS: i64 = 365 * 1000;

/// Resolves bearer session tokens to users and links verified external identities.
///
/// Every store call is bounded by the operation timeout handed to [`Authenticator::new`].
#[derive(Clone)]
pub struct Authenticator {
    pool: SqlitePool,
    session_ttl: Duration,
    operation_timeout: std::time::Duration,
    users: UserRepository,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("session not found")]
    SessionNotFound,
    #[error("session expired")]
    SessionExpired,
    #[error("invalid session token")]
    InvalidSession,
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

impl Authenticator {
    pub fn new(
        pool: SqlitePool,
        config: &AuthConfig,
        operation_timeout: std::time::Duration,
    ) -> Self {
        let ttl_seconds = i64::try_from(config.session_ttl_seconds).unwrap_or(i64::MAX);
        let session_ttl = Duration::try_seconds(ttl_seconds)
            .unwrap_or(Duration::MAX)
            .min(Duration::days(MAX_SESSION_TTL_DAYS));

        Self {
            users: UserRepository::new(pool.clone()),
            pool,
            session_ttl,
            operation_timeout,
        }
    }

    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    /// Create or refresh the local user for a verified identity and open a session for them.
    pub async fn link_identity(
        &self,
        identity: &ExternalIdentity,
    ) -> Result<(User, AuthSession), AuthError> {
        let identity = identity.normalized();
        identity.validate().map_err(AuthError::InvalidIdentity)?;

        let user = bounded(self.operation_timeout, self.users.upsert_identity(&identity)).await?;
        let session = self.issue_session(&user.id).await?;

        info!(user_id = %user.id, external_id = %user.external_id, "linked external identity");
        Ok((user, session))
    }

    pub async fn authenticate_token(&self, token: &str) -> Result<(User, AuthSession), AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::InvalidSession);
        }

        let Some((user_id, expires_at)) =
            bounded(self.operation_timeout, self.find_session(token)).await?
        else {
            return Err(AuthError::SessionNotFound);
        };

        let expires_at = DateTime::parse_from_rfc3339(&expires_at)
            .map_err(|_| AuthError::InvalidSession)?
            .with_timezone(&Utc);

        if expires_at <= Utc::now() {
            bounded(self.operation_timeout, self.delete_session(token)).await?;
            debug!(user_id = %user_id, "expired session removed");
            return Err(AuthError::SessionExpired);
        }

        let user = bounded(self.operation_timeout, self.users.find_by_id(&user_id))
            .await?
            .ok_or(AuthError::SessionNotFound)?;
        let session = AuthSession {
            token: token.to_owned(),
            user_id,
            expires_at,
        };

        Ok((user, session))
    }

    pub async fn issue_session(&self, user_id: &str) -> Result<AuthSession, AuthError> {
        let token = generate_session_token();
        let now = Utc::now();
        let expires_at = now + self.session_ttl;

        bounded(
            self.operation_timeout,
            self.insert_session(&token, user_id, now, expires_at),
        )
        .await?;

        Ok(AuthSession {
            token,
            user_id: user_id.to_owned(),
            expires_at,
        })
    }

    async fn find_session(&self, token: &str) -> StoreResult<Option<(String, String)>> {
        let row = sqlx::query_as::<_, (String, String)>(
            "SELECT user_id, expires_at FROM sessions WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_session(&self, token: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_session(
        &self,
        token: &str,
        user_id: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(token)
        .bind(user_id)
        .bind(format_timestamp(created_at))
        .bind(format_timestamp(expires_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
