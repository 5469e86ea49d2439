use anyhow::{Context, Result};
use parley_api::AppState;
use parley_auth::Authenticator;
use parley_config::AppConfig;
use parley_database::{initialize_database, StoreError};
use sqlx::SqlitePool;
use tracing::info;

pub mod telemetry {
    use anyhow::Result;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

/// Everything the HTTP server and the admin commands need, built once at startup.
#[derive(Clone)]
pub struct BackendServices {
    pub db_pool: SqlitePool,
    pub authenticator: Authenticator,
    pub state: AppState,
}

impl BackendServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let db_pool = initialize_database(&config.database)
            .await
            .map_err(|error| match error {
                StoreError::Migration(_) => {
                    anyhow::Error::new(error).context("database migrations failed")
                }
                other => anyhow::Error::new(other).context("failed to connect to database"),
            })?;

        let state = AppState::new(db_pool.clone(), config);
        let authenticator = state.authenticator().clone();

        info!(
            url = %config.database.url,
            timeout_ms = config.database.operation_timeout_ms,
            "backend services ready"
        );

        Ok(Self {
            db_pool,
            authenticator,
            state,
        })
    }

    /// Close the pool after the server has drained.
    pub async fn shutdown(self) {
        self.db_pool.close().await;
        info!("database pool closed");
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}

/// Resolve the listen address from configuration.
pub fn listen_address(config: &AppConfig) -> Result<std::net::SocketAddr> {
    let address = format!("{}:{}", config.http.address, config.http.port);
    address
        .parse()
        .with_context(|| format!("invalid http listen address {address}"))
}
