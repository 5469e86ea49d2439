use axum::{extract::State, Extension, Json};

use crate::{routes::models::UserSummary, ApiError, AppState, CurrentUser};

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Profile of the authenticated caller", body = UserSummary),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn current_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<UserSummary>, ApiError> {
    let profile = state.users().profile(&current.id).await?;

    Ok(Json(profile.into()))
}
