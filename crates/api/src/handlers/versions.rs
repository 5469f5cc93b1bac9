use crate::handlers::error::{api_error, document_error, ApiJson, ApiPath, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::AppState;
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use docvault_models::{DocumentVersion, UploadVersion};
use std::sync::Arc;
use uuid::Uuid;

/// Upload a new version; the content is base64 in the JSON body
/// POST /document-versions
pub async fn upload_version(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiJson(request): ApiJson<UploadVersion>,
) -> ApiResult<(StatusCode, Json<DocumentVersion>)> {
    let version = state
        .version_service
        .upload(auth_user.user_id, request)
        .await
        .map_err(document_error)?;

    Ok((StatusCode::CREATED, Json(version)))
}

/// GET /document-versions/document/:document_id
pub async fn list_versions(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(document_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<DocumentVersion>>> {
    let versions = state
        .version_service
        .list(auth_user.user_id, document_id)
        .await
        .map_err(document_error)?;

    Ok(Json(versions))
}

/// GET /document-versions/:id
pub async fn get_version(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(version_id): ApiPath<Uuid>,
) -> ApiResult<Json<DocumentVersion>> {
    let version = state
        .version_service
        .get(auth_user.user_id, version_id)
        .await
        .map_err(document_error)?;

    Ok(Json(version))
}

/// Raw bytes of a version as an attachment
/// GET /document-versions/:id/download
pub async fn download_version(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(version_id): ApiPath<Uuid>,
) -> ApiResult<Response> {
    let (version, content) = state
        .version_service
        .download(auth_user.user_id, version_id)
        .await
        .map_err(document_error)?;

    let content_type = HeaderValue::from_str(&version.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&content_disposition(&version.file_name)).map_err(|e| {
        tracing::error!("Invalid Content-Disposition for version {}: {}", version.id, e);
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "An internal error occurred",
        )
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        content,
    )
        .into_response())
}

/// DELETE /document-versions/:id
pub async fn delete_version(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(version_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .version_service
        .delete(auth_user.user_id, version_id)
        .await
        .map_err(document_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// `attachment` disposition with an ASCII fallback name and the exact UTF-8 name
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(file_name)
    )
}
