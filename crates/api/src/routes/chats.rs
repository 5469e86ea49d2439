use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::{routes::models::ChatSummaryResponse, ApiError, AppState, CurrentUser};

#[utoipa::path(
    get,
    path = "/api/chats",
    tag = "Chats",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Chats of the caller, most recent activity first", body = [ChatSummaryResponse]),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_chats(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<ChatSummaryResponse>>, ApiError> {
    let chats = state.conversations().find_chats_for_user(&current.id).await?;

    Ok(Json(chats.into_iter().map(ChatSummaryResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/chats/{participant_id}",
    tag = "Chats",
    security(("bearerAuth" = [])),
    params(("participant_id" = String, Path, description = "User to chat with")),
    responses(
        (status = 200, description = "Existing or newly created chat", body = ChatSummaryResponse),
        (status = 400, description = "Malformed participant or self-chat", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 404, description = "Participant not found", body = crate::error::ErrorResponse)
    )
)]
/// Unlike the listing, `participant` is always present here: an unknown participant is a 404.
pub async fn get_or_create_chat(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(participant_id): Path<String>,
) -> Result<Json<ChatSummaryResponse>, ApiError> {
    let chat = state
        .conversations()
        .get_or_create_chat(&current.id, &participant_id)
        .await?;

    Ok(Json(chat.into()))
}
