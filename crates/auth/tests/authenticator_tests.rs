use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use parley_auth::{AuthError, Authenticator};
use parley_config::{AuthConfig, DatabaseConfig};
use parley_database::{
    format_timestamp, prepare_database, ExternalIdentity, StoreError, MIGRATOR,
};
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use std::time::Duration as StdDuration;
use tempfile::TempDir;

type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

struct TestContext {
    pool: SqlitePool,
    authenticator: Authenticator,
    _temp_dir: TempDir,
}

impl TestContext {
    async fn new(config: AuthConfig) -> TestResult<Self> {
        Self::with_limits(config, 5, StdDuration::from_secs(5)).await
    }

    async fn with_limits(
        config: AuthConfig,
        max_connections: u32,
        operation_timeout: StdDuration,
    ) -> TestResult<Self> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("auth.sqlite");
        let database = DatabaseConfig {
            url: format!("sqlite://{}", db_path.display()),
            max_connections,
            ..DatabaseConfig::default()
        };

        let pool = prepare_database(&database).await?;
        MIGRATOR.run(&pool).await?;

        let authenticator = Authenticator::new(pool.clone(), &config, operation_timeout);

        Ok(Self {
            pool,
            authenticator,
            _temp_dir: temp_dir,
        })
    }

    async fn new_default() -> TestResult<Self> {
        Self::new(AuthConfig {
            session_ttl_seconds: 3_600,
        })
        .await
    }
}

fn identity(handle: &str) -> ExternalIdentity {
    ExternalIdentity {
        external_id: format!("idp|{handle}"),
        name: handle.to_string(),
        email: format!("{handle}@example.com"),
        avatar: None,
    }
}

#[tokio::test]
async fn linked_identity_authenticates_with_issued_token() -> TestResult {
    let ctx = TestContext::new_default().await?;

    let (user, session) = ctx.authenticator.link_identity(&identity("alice")).await?;
    assert_eq!(session.user_id, user.id);

    let (resolved, resolved_session) = ctx.authenticator.authenticate_token(&session.token).await?;
    assert_eq!(resolved.id, user.id);
    assert_eq!(resolved.email, "alice@example.com");
    assert_eq!(resolved_session.token, session.token);

    Ok(())
}

#[tokio::test]
async fn session_expiry_respects_configured_ttl() -> TestResult {
    let ctx = TestContext::new(AuthConfig {
        session_ttl_seconds: 120,
    })
    .await?;

    let before = Utc::now();
    let (_, session) = ctx.authenticator.link_identity(&identity("alice")).await?;
    let after = Utc::now();

    assert!(session.expires_at >= before + Duration::seconds(120));
    assert!(session.expires_at <= after + Duration::seconds(120));

    Ok(())
}

#[tokio::test]
async fn relinking_keeps_user_and_issues_fresh_token() -> TestResult {
    let ctx = TestContext::new_default().await?;

    let (first_user, first) = ctx.authenticator.link_identity(&identity("alice")).await?;
    let (second_user, second) = ctx
        .authenticator
        .link_identity(&ExternalIdentity {
            name: "Alice Liddell".into(),
            ..identity("alice")
        })
        .await?;

    assert_eq!(first_user.id, second_user.id);
    assert_eq!(second_user.name, "Alice Liddell");
    assert_ne!(first.token, second.token);

    // both sessions stay valid
    ctx.authenticator.authenticate_token(&first.token).await?;
    ctx.authenticator.authenticate_token(&second.token).await?;

    Ok(())
}

#[tokio::test]
async fn invalid_identity_is_rejected_without_side_effects() -> TestResult {
    let ctx = TestContext::new_default().await?;

    let result = ctx
        .authenticator
        .link_identity(&ExternalIdentity {
            email: "not-an-email".into(),
            ..identity("alice")
        })
        .await;
    assert!(matches!(result, Err(AuthError::InvalidIdentity(_))));

    let users: i64 = sqlx::query("SELECT COUNT(*) AS count FROM users")
        .fetch_one(&ctx.pool)
        .await?
        .try_get("count")?;
    assert_eq!(users, 0);

    Ok(())
}

#[tokio::test]
async fn unknown_and_blank_tokens_are_rejected() -> TestResult {
    let ctx = TestContext::new_default().await?;

    let unknown = ctx.authenticator.authenticate_token("no-such-token").await;
    assert!(matches!(unknown, Err(AuthError::SessionNotFound)));

    let blank = ctx.authenticator.authenticate_token("  ").await;
    assert!(matches!(blank, Err(AuthError::InvalidSession)));

    Ok(())
}

#[tokio::test]
async fn expired_session_is_rejected_and_removed() -> TestResult {
    let ctx = TestContext::new_default().await?;
    let (user, _) = ctx.authenticator.link_identity(&identity("alice")).await?;

    let past = Utc::now() - Duration::hours(1);
    sqlx::query(
        "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind("stale-token")
    .bind(&user.id)
    .bind(format_timestamp(past - Duration::hours(1)))
    .bind(format_timestamp(past))
    .execute(&ctx.pool)
    .await?;

    let result = ctx.authenticator.authenticate_token("stale-token").await;
    assert!(matches!(result, Err(AuthError::SessionExpired)));

    let remaining = sqlx::query("SELECT token FROM sessions WHERE token = ?")
        .bind("stale-token")
        .fetch_optional(&ctx.pool)
        .await?;
    assert!(remaining.is_none());

    Ok(())
}

#[tokio::test]
async fn corrupt_expiry_is_an_invalid_session() -> TestResult {
    let ctx = TestContext::new_default().await?;
    let (user, _) = ctx.authenticator.link_identity(&identity("alice")).await?;

    sqlx::query(
        "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind("garbled")
    .bind(&user.id)
    .bind(format_timestamp(Utc::now()))
    .bind("next tuesday")
    .execute(&ctx.pool)
    .await?;

    let result = ctx.authenticator.authenticate_token("garbled").await;
    assert!(matches!(result, Err(AuthError::InvalidSession)));

    Ok(())
}

#[tokio::test]
async fn issued_tokens_are_random_url_safe_and_32_bytes() -> TestResult {
    let ctx = TestContext::new_default().await?;
    let (user, _) = ctx.authenticator.link_identity(&identity("alice")).await?;

    let mut seen = HashSet::new();
    for _ in 0..20 {
        let session = ctx.authenticator.issue_session(&user.id).await?;
        let decoded = URL_SAFE_NO_PAD.decode(&session.token)?;
        assert_eq!(decoded.len(), 32);
        assert!(seen.insert(session.token));
    }

    Ok(())
}

#[tokio::test]
async fn stalled_store_times_out_instead_of_hanging() -> TestResult {
    let ctx = TestContext::with_limits(
        AuthConfig {
            session_ttl_seconds: 3_600,
        },
        1,
        StdDuration::from_millis(100),
    )
    .await?;
    let (_, session) = ctx.authenticator.link_identity(&identity("alice")).await?;

    // Hold the only pooled connection so every store call waits.
    let held = ctx.pool.acquire().await?;

    let resolved = ctx.authenticator.authenticate_token(&session.token).await;
    assert!(matches!(
        resolved,
        Err(AuthError::Store(StoreError::Timeout(limit))) if limit == StdDuration::from_millis(100)
    ));

    let linked = ctx.authenticator.link_identity(&identity("bob")).await;
    assert!(matches!(linked, Err(AuthError::Store(StoreError::Timeout(_)))));

    drop(held);
    ctx.authenticator.authenticate_token(&session.token).await?;

    Ok(())
}
