use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use crate::{
    routes::models::{MessageResponse, SendMessageRequest},
    util::JsonBody,
    ApiError, AppState, CurrentUser,
};

#[utoipa::path(
    get,
    path = "/api/messages/{chat_id}",
    tag = "Messages",
    security(("bearerAuth" = [])),
    params(("chat_id" = String, Path, description = "Chat identifier")),
    responses(
        (status = 200, description = "Messages oldest first", body = [MessageResponse]),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 404, description = "Chat not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(chat_id): Path<String>,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    let messages = state
        .conversations()
        .list_messages(&chat_id, &current.id)
        .await?;

    Ok(Json(messages.into_iter().map(MessageResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/messages/{chat_id}",
    tag = "Messages",
    security(("bearerAuth" = [])),
    params(("chat_id" = String, Path, description = "Chat identifier")),
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message appended", body = MessageResponse),
        (status = 400, description = "Empty, oversized or malformed body", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 404, description = "Chat not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(chat_id): Path<String>,
    JsonBody(payload): JsonBody<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let message = state
        .conversations()
        .send_message(&chat_id, &current.id, &payload.body)
        .await?;

    Ok((StatusCode::CREATED, Json(message.into())))
}
