use crate::handlers::error::{document_error, ApiJson, ApiPath, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use docvault_models::{
    AddOrganizationUser, CreateOrganization, Organization, OrganizationUser,
    OrganizationUserWithUser, OrganizationWithRole, PendingInvitation, UpdateMemberRole,
    UpdateOrganization,
};
use std::sync::Arc;
use uuid::Uuid;

/// POST /organizations
pub async fn create_organization(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiJson(request): ApiJson<CreateOrganization>,
) -> ApiResult<(StatusCode, Json<OrganizationWithRole>)> {
    let organization = state
        .organization_service
        .create(auth_user.user_id, request)
        .await
        .map_err(document_error)?;

    Ok((StatusCode::CREATED, Json(organization)))
}

/// Organizations the caller belongs to
/// GET /organizations
pub async fn list_organizations(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Json<Vec<OrganizationWithRole>>> {
    let organizations = state
        .organization_service
        .list_for_user(auth_user.user_id)
        .await
        .map_err(document_error)?;

    Ok(Json(organizations))
}

/// Pending invitations addressed to the caller
/// GET /organizations/invitations
pub async fn list_invitations(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Json<Vec<PendingInvitation>>> {
    let invitations = state
        .organization_service
        .list_invitations(auth_user.user_id)
        .await
        .map_err(document_error)?;

    Ok(Json(invitations))
}

/// POST /organizations/addUser
pub async fn add_user(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiJson(request): ApiJson<AddOrganizationUser>,
) -> ApiResult<(StatusCode, Json<OrganizationUser>)> {
    let membership = state
        .organization_service
        .add_user(auth_user.user_id, request)
        .await
        .map_err(document_error)?;

    Ok((StatusCode::CREATED, Json(membership)))
}

/// GET /organizations/:id
pub async fn get_organization(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(organization_id): ApiPath<Uuid>,
) -> ApiResult<Json<OrganizationWithRole>> {
    let organization = state
        .organization_service
        .get(auth_user.user_id, organization_id)
        .await
        .map_err(document_error)?;

    Ok(Json(organization))
}

/// PATCH /organizations/:id
pub async fn update_organization(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(organization_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateOrganization>,
) -> ApiResult<Json<Organization>> {
    let organization = state
        .organization_service
        .update(auth_user.user_id, organization_id, request)
        .await
        .map_err(document_error)?;

    Ok(Json(organization))
}

/// DELETE /organizations/:id
pub async fn delete_organization(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(organization_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .organization_service
        .delete(auth_user.user_id, organization_id)
        .await
        .map_err(document_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /organizations/:id/accept
pub async fn accept_invitation(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(organization_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .organization_service
        .accept_invitation(auth_user.user_id, organization_id)
        .await
        .map_err(document_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /organizations/:id/decline
pub async fn decline_invitation(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(organization_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .organization_service
        .decline_invitation(auth_user.user_id, organization_id)
        .await
        .map_err(document_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /organizations/:id/leave
pub async fn leave_organization(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(organization_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .organization_service
        .leave(auth_user.user_id, organization_id)
        .await
        .map_err(document_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /organizations/:id/members
pub async fn list_members(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(organization_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<OrganizationUserWithUser>>> {
    let members = state
        .organization_service
        .list_members(auth_user.user_id, organization_id)
        .await
        .map_err(document_error)?;

    Ok(Json(members))
}

/// PATCH /organizations/:id/members/:user_id
pub async fn update_member_role(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath((organization_id, member_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(request): ApiJson<UpdateMemberRole>,
) -> ApiResult<Json<OrganizationUser>> {
    let membership = state
        .organization_service
        .update_member_role(auth_user.user_id, organization_id, member_id, request.role)
        .await
        .map_err(document_error)?;

    Ok(Json(membership))
}

/// DELETE /organizations/:id/members/:user_id
pub async fn remove_member(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath((organization_id, member_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .organization_service
        .remove_member(auth_user.user_id, organization_id, member_id)
        .await
        .map_err(document_error)?;

    Ok(StatusCode::NO_CONTENT)
}
