use crate::handlers::error::{document_error, ApiJson, ApiPath, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use docvault_models::{CreateDocument, Document, UpdateDocument};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct EmptyTrashResponse {
    pub deleted: u64,
}

/// POST /documents
pub async fn create_document(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiJson(request): ApiJson<CreateDocument>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let document = state
        .document_service
        .create(auth_user.user_id, request)
        .await
        .map_err(document_error)?;

    Ok((StatusCode::CREATED, Json(document)))
}

/// GET /documents/organization/:id
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(organization_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<Document>>> {
    let documents = state
        .document_service
        .list(auth_user.user_id, organization_id)
        .await
        .map_err(document_error)?;

    Ok(Json(documents))
}

/// GET /documents/organization/:id/trashed
pub async fn list_trashed_documents(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(organization_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<Document>>> {
    let documents = state
        .document_service
        .list_trashed(auth_user.user_id, organization_id)
        .await
        .map_err(document_error)?;

    Ok(Json(documents))
}

/// DELETE /documents/organization/:id/trashed
pub async fn empty_trash(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(organization_id): ApiPath<Uuid>,
) -> ApiResult<Json<EmptyTrashResponse>> {
    let deleted = state
        .document_service
        .empty_trash(auth_user.user_id, organization_id)
        .await
        .map_err(document_error)?;

    Ok(Json(EmptyTrashResponse { deleted }))
}

/// GET /documents/:id
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(document_id): ApiPath<Uuid>,
) -> ApiResult<Json<Document>> {
    let document = state
        .document_service
        .get(auth_user.user_id, document_id)
        .await
        .map_err(document_error)?;

    Ok(Json(document))
}

/// PATCH /documents/:id
pub async fn update_document(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(document_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateDocument>,
) -> ApiResult<Json<Document>> {
    let document = state
        .document_service
        .update(auth_user.user_id, document_id, request)
        .await
        .map_err(document_error)?;

    Ok(Json(document))
}

/// Permanent delete
/// DELETE /documents/:id
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(document_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .document_service
        .delete(auth_user.user_id, document_id)
        .await
        .map_err(document_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /documents/:id/trash
pub async fn trash_document(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(document_id): ApiPath<Uuid>,
) -> ApiResult<Json<Document>> {
    let document = state
        .document_service
        .trash(auth_user.user_id, document_id)
        .await
        .map_err(document_error)?;

    Ok(Json(document))
}

/// POST /documents/:id/restore
pub async fn restore_document(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(document_id): ApiPath<Uuid>,
) -> ApiResult<Json<Document>> {
    let document = state
        .document_service
        .restore(auth_user.user_id, document_id)
        .await
        .map_err(document_error)?;

    Ok(Json(document))
}
