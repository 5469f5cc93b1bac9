use crate::handlers::error::{auth_error, ApiJson, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::AppState;
use axum::{extract::State, http::StatusCode, Extension, Json};
use docvault_auth::{AuthResponse, LoginRequest, RefreshTokenRequest, RegisterRequest};
use docvault_models::UserProfile;
use std::sync::Arc;

/// Register a new user and their personal workspace
/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let response = state.auth_service.register(request).await.map_err(|e| {
        tracing::warn!("Registration rejected: {}", e);
        auth_error(e)
    })?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Login with email and password
/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let response = state.auth_service.login(request).await.map_err(auth_error)?;
    Ok(Json(response))
}

/// Exchange a refresh token for a new token pair
/// POST /auth/refresh
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RefreshTokenRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let response = state.auth_service.refresh(request).await.map_err(auth_error)?;
    Ok(Json(response))
}

/// GET /auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Json<UserProfile>> {
    let profile = state
        .auth_service
        .me(auth_user.user_id)
        .await
        .map_err(auth_error)?;

    Ok(Json(profile))
}
