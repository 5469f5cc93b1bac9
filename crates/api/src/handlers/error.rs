use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request,
    },
    http::{request::Parts, StatusCode},
    Json,
};
use docvault_auth::AuthError;
use docvault_documents::DocumentError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<T, ApiError>;

pub fn api_error(status: StatusCode, error: &str, message: &str) -> ApiError {
    (status, Json(ErrorResponse::new(error, message)))
}

/// `Json` body extractor whose rejections use the API error shape
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

/// `Path` extractor answering malformed ids with the API error shape
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    Path<T>: FromRequestParts<S, Rejection = PathRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) if rejection.status() == StatusCode::BAD_REQUEST => Err(api_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                &rejection.body_text(),
            )),
            Err(rejection) => {
                tracing::error!("Path extraction failed: {}", rejection.body_text());
                Err(internal_error())
            }
        }
    }
}

pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(api_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                &rejection.body_text(),
            )),
        }
    }
}

/// Malformed, ill-typed or non-JSON bodies are validation errors; only the
/// body limit keeps its own status
fn json_rejection(rejection: JsonRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return api_error(
            StatusCode::PAYLOAD_TOO_LARGE,
            "payload_too_large",
            &rejection.body_text(),
        );
    }
    api_error(
        StatusCode::BAD_REQUEST,
        "validation_error",
        &rejection.body_text(),
    )
}

fn internal_error() -> ApiError {
    api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "An internal error occurred",
    )
}

pub fn auth_error(err: AuthError) -> ApiError {
    match err {
        AuthError::InvalidCredentials | AuthError::UserInactive => api_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "Invalid credentials",
        ),
        AuthError::InvalidToken(_) | AuthError::TokenExpired => {
            api_error(StatusCode::UNAUTHORIZED, "invalid_token", &err.to_string())
        }
        AuthError::WeakPassword(_) | AuthError::ValidationError(_) => {
            api_error(StatusCode::BAD_REQUEST, "validation_error", &err.to_string())
        }
        AuthError::AlreadyExists(msg) => api_error(StatusCode::CONFLICT, "conflict", &msg),
        AuthError::NotFound(msg) => api_error(StatusCode::NOT_FOUND, "not_found", &msg),
        AuthError::PasswordHashError(_) | AuthError::JwtError(_) | AuthError::DatabaseError(_) => {
            tracing::error!("Auth error: {}", err);
            internal_error()
        }
    }
}

pub fn document_error(err: DocumentError) -> ApiError {
    match err {
        DocumentError::NotFound(msg) => api_error(StatusCode::NOT_FOUND, "not_found", &msg),
        DocumentError::Forbidden(msg) => api_error(StatusCode::FORBIDDEN, "forbidden", &msg),
        DocumentError::Conflict(msg) => api_error(StatusCode::CONFLICT, "conflict", &msg),
        DocumentError::BadRequest(msg) => api_error(StatusCode::BAD_REQUEST, "bad_request", &msg),
        DocumentError::ValidationError(msg) => {
            api_error(StatusCode::BAD_REQUEST, "validation_error", &msg)
        }
        DocumentError::Storage(_) | DocumentError::Database(_) => {
            tracing::error!("Request failed: {}", err);
            internal_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvault_database::DatabaseError;

    #[test]
    fn test_auth_error_status() {
        assert_eq!(auth_error(AuthError::InvalidCredentials).0, StatusCode::UNAUTHORIZED);
        assert_eq!(auth_error(AuthError::UserInactive).0, StatusCode::UNAUTHORIZED);
        assert_eq!(auth_error(AuthError::TokenExpired).0, StatusCode::UNAUTHORIZED);
        assert_eq!(
            auth_error(AuthError::WeakPassword("too short".to_string())).0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            auth_error(AuthError::AlreadyExists("email".to_string())).0,
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_inactive_and_wrong_password_look_the_same() {
        let (_, Json(inactive)) = auth_error(AuthError::UserInactive);
        let (_, Json(wrong)) = auth_error(AuthError::InvalidCredentials);
        assert_eq!(inactive.message, wrong.message);
    }

    #[test]
    fn test_document_error_status() {
        let cases = [
            (DocumentError::NotFound("x".to_string()), StatusCode::NOT_FOUND),
            (DocumentError::Forbidden("x".to_string()), StatusCode::FORBIDDEN),
            (DocumentError::Conflict("x".to_string()), StatusCode::CONFLICT),
            (DocumentError::BadRequest("x".to_string()), StatusCode::BAD_REQUEST),
            (DocumentError::ValidationError("x".to_string()), StatusCode::BAD_REQUEST),
            (DocumentError::Storage("disk".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(document_error(err).0, status);
        }
    }

    #[tokio::test]
    async fn test_bad_json_body_is_a_validation_error() {
        #[derive(Debug, Deserialize)]
        struct Body {
            #[allow(dead_code)]
            count: u32,
        }

        let request = axum::http::Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(r#"{"count": "many"}"#))
            .unwrap();

        let Err((status, Json(body))) = ApiJson::<Body>::from_request(request, &()).await else {
            panic!("expected the body to be rejected");
        };
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "validation_error");
        assert!(body.message.contains("count"));
    }

    #[tokio::test]
    async fn test_missing_content_type_is_a_validation_error() {
        let request = axum::http::Request::builder()
            .method("POST")
            .body(axum::body::Body::from("{}"))
            .unwrap();

        let Err((status, _)) = ApiJson::<ErrorResponse>::from_request(request, &()).await else {
            panic!("expected the body to be rejected");
        };
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bad_query_is_a_validation_error() {
        #[derive(Debug, Deserialize)]
        struct Params {
            #[allow(dead_code)]
            limit: u32,
        }

        let request = axum::http::Request::builder()
            .uri("/audit-logs?limit=lots")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let Err((status, Json(body))) = ApiQuery::<Params>::from_request_parts(&mut parts, &()).await
        else {
            panic!("expected the query to be rejected");
        };
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "validation_error");
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let (status, Json(body)) =
            document_error(DocumentError::Database(DatabaseError::Other("secret dsn".to_string())));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.message.contains("secret"));
    }
}
