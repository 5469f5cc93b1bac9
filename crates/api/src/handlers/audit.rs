use crate::handlers::error::{document_error, ApiPath, ApiQuery, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::AppState;
use axum::{
    extract::State,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use docvault_documents::AuditLogPage;
use docvault_models::{AuditAction, AuditLog, AuditLogQuery};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Query parameters for the organization audit trail
#[derive(Debug, Default, Deserialize)]
pub struct AuditLogParams {
    pub action: Option<AuditAction>,
    pub document_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl AuditLogParams {
    fn into_query(self, organization_id: Uuid) -> AuditLogQuery {
        AuditLogQuery {
            action: self.action,
            document_id: self.document_id,
            user_id: self.user_id,
            from_date: self.from,
            to_date: self.to,
            ..AuditLogQuery::new(organization_id)
        }
        .with_paging(self.limit, self.offset)
    }
}

/// GET /audit-logs/organization/:id
pub async fn list_organization_logs(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(organization_id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<AuditLogParams>,
) -> ApiResult<Json<AuditLogPage>> {
    let page = state
        .audit_service
        .list_for_organization(auth_user.user_id, params.into_query(organization_id))
        .await
        .map_err(document_error)?;

    Ok(Json(page))
}

/// GET /audit-logs/document/:id
pub async fn list_document_logs(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(document_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<AuditLog>>> {
    let logs = state
        .audit_service
        .list_for_document(auth_user.user_id, document_id)
        .await
        .map_err(document_error)?;

    Ok(Json(logs))
}
