//! Shared types and result types for the storage layer

pub mod errors;

pub use errors::StoreError;

use chrono::{DateTime, SecondsFormat, Utc};
use std::future::Future;
use std::time::Duration;

pub type StoreResult<T> = Result<T, StoreError>;

/// Render a timestamp with fixed precision so lexical order matches chronological order.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time in the stored timestamp format.
pub fn timestamp_now() -> String {
    format_timestamp(Utc::now())
}

/// Fresh opaque identifier for a stored record.
pub fn new_id() -> String {
    cuid2::cuid()
}

/// Run a store operation, failing with [`StoreError::Timeout`] once `limit` elapses.
pub async fn bounded<T, F>(limit: Duration, operation: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(timeout_ms = limit.as_millis() as u64, "store operation timed out");
            Err(StoreError::Timeout(limit))
        }
    }
}
