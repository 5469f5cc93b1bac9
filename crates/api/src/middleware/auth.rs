use crate::handlers::error::{api_error, ApiError};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use docvault_auth::Claims;
use std::sync::Arc;
use uuid::Uuid;

/// Authenticated user context
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

impl TryFrom<Claims> for AuthUser {
    type Error = ApiError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = claims.user_id().map_err(|_| {
            api_error(
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "Invalid subject in token",
            )
        })?;

        Ok(Self {
            user_id,
            email: claims.email,
        })
    }
}

/// Extract the token from an `Authorization: Bearer` header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| {
            api_error(
                StatusCode::UNAUTHORIZED,
                "missing_auth_header",
                "Authorization header is required",
            )
        })?
        .to_str()
        .map_err(|_| {
            api_error(
                StatusCode::UNAUTHORIZED,
                "invalid_auth_header",
                "Invalid Authorization header format",
            )
        })?;

    match auth_header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(api_error(
            StatusCode::UNAUTHORIZED,
            "invalid_auth_scheme",
            "Authorization header must use Bearer scheme",
        )),
    }
}

/// Middleware to require authentication
pub async fn require_auth(
    State(state): State<Arc<crate::AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers)?;

    let claims = state
        .auth_service
        .jwt
        .validate_access_token(token)
        .map_err(|e| {
            tracing::debug!("Token validation failed: {}", e);
            api_error(StatusCode::UNAUTHORIZED, "invalid_token", &e.to_string())
        })?;

    // Add user context to request extensions
    request.extensions_mut().insert(AuthUser::try_from(claims)?);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token(&headers("Bearer abc.def")).unwrap(), "abc.def");
    }

    #[test]
    fn test_missing_or_malformed_header() {
        let (status, _) = extract_bearer_token(&HeaderMap::new()).unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (_, body) = extract_bearer_token(&headers("Basic dXNlcjpwYXNz")).unwrap_err();
        assert_eq!(body.error, "invalid_auth_scheme");

        assert!(extract_bearer_token(&headers("Bearer ")).is_err());
    }

    #[test]
    fn test_auth_user_from_claims() {
        let jwt = docvault_auth::JwtService::new("test-secret");
        let user_id = Uuid::new_v4();
        let token = jwt.generate_access_token(user_id, "a@example.com").unwrap();
        let claims = jwt.validate_access_token(&token).unwrap();

        let user = AuthUser::try_from(claims).unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.email, "a@example.com");
    }
}
