//! Session authentication and request logging

use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, info};

use crate::{util::require_bearer, ApiError, AppState};

/// Resolve the bearer session and expose the caller as a [`crate::CurrentUser`] extension.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = require_bearer(request.headers())?;
    let current = state.authenticate(&token).await.inspect_err(|error| {
        debug!(status = %error.status, reason = %error.message, "request rejected");
    })?;

    request.extensions_mut().insert(current);
    Ok(next.run(request).await)
}

pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let start = Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed();

    info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = duration.as_millis() as u64,
        "request completed"
    );

    response
}
