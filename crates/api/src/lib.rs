mod error;
mod middleware;
mod state;
mod util;

pub mod docs;
pub mod routes;

pub use error::{ApiError, ErrorResponse};
pub use state::{AppState, Conversations, CurrentUser, Directory};

use axum::{
    http::header::{AUTHORIZATION, CONTENT_TYPE},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};

pub fn build_router(state: AppState) -> Router {
    let authenticated = Router::new()
        .route("/auth/me", get(routes::auth::current_user))
        .route("/users", get(routes::users::list_users))
        .route("/chats", get(routes::chats::list_chats))
        .route(
            "/chats/:participant_id",
            get(routes::chats::get_or_create_chat),
        )
        .route(
            "/messages/:chat_id",
            get(routes::messages::list_messages).post(routes::messages::send_message),
        )
        .route_layer(from_fn_with_state(state.clone(), middleware::require_session));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api-docs/openapi.json", get(docs::openapi_json))
        .nest("/api", authenticated)
        .with_state(state)
        .layer(from_fn(middleware::log_requests))
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}
