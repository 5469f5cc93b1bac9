use crate::handlers::error::{auth_error, ApiJson, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::AppState;
use axum::{extract::State, http::StatusCode, Extension, Json};
use docvault_models::{ChangePassword, UpdateUser, UserProfile};
use std::sync::Arc;

/// PATCH /users/me
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiJson(request): ApiJson<UpdateUser>,
) -> ApiResult<Json<UserProfile>> {
    let profile = state
        .auth_service
        .update_profile(auth_user.user_id, request)
        .await
        .map_err(auth_error)?;

    Ok(Json(profile))
}

/// POST /users/me/password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiJson(request): ApiJson<ChangePassword>,
) -> ApiResult<StatusCode> {
    state
        .auth_service
        .change_password(auth_user.user_id, request)
        .await
        .map_err(auth_error)?;

    Ok(StatusCode::NO_CONTENT)
}
