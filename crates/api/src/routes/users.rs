use axum::{extract::State, Extension, Json};

use crate::{routes::models::UserSummary, ApiError, AppState, CurrentUser};

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Every user except the caller, newest first", body = [UserSummary]),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let users = state.users().list_other_users(&current.id).await?;

    Ok(Json(users.into_iter().map(UserSummary::from).collect()))
}
