use crate::error::{AuthzError, Result};
use crate::permission::{Permission, RolePolicy};
use docvault_cache::{membership_cache_key, Cache};
use docvault_database::{OrganizationRepository, OrganizationUserRepository};
use docvault_models::OrganizationRole;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const MEMBERSHIP_TTL_SECONDS: u64 = 300;

/// Accepted membership resolved for a request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Membership {
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub role: OrganizationRole,
}

impl Membership {
    pub fn can(&self, permission: Permission) -> bool {
        self.role.grants(permission)
    }
}

/// Resolves a caller's role in an organization and enforces the role policy
#[derive(Clone)]
pub struct AccessGuard {
    org_repo: OrganizationRepository,
    member_repo: OrganizationUserRepository,
    cache: Option<Cache>,
}

impl AccessGuard {
    pub fn new(pool: PgPool, cache: Option<Cache>) -> Self {
        Self {
            org_repo: OrganizationRepository::new(pool.clone()),
            member_repo: OrganizationUserRepository::new(pool),
            cache,
        }
    }

    /// Require `permission` for `user_id` in `organization_id`.
    ///
    /// A missing organization is `NotFound`; strangers, pending invitees and
    /// members whose role is too weak are `PermissionDenied`.
    pub async fn authorize(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        permission: Permission,
    ) -> Result<Membership> {
        let role = match self.role_of(user_id, organization_id).await? {
            Some(role) => role,
            None => {
                if !self.org_repo.exists(organization_id).await? {
                    return Err(AuthzError::NotFound("Organization not found".to_string()));
                }
                return Err(AuthzError::PermissionDenied(
                    "You do not have access to this organization".to_string(),
                ));
            }
        };

        if !role.grants(permission) {
            tracing::debug!(
                user_id = %user_id,
                organization_id = %organization_id,
                role = %role,
                permission = %permission,
                "Permission denied"
            );
            return Err(AuthzError::PermissionDenied(format!(
                "This action requires the {} role",
                permission.minimum_role()
            )));
        }

        Ok(Membership {
            organization_id,
            user_id,
            role,
        })
    }

    /// Accepted role of a user, cache first
    pub async fn role_of(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<OrganizationRole>> {
        let cache_key = membership_cache_key(&organization_id.to_string(), &user_id.to_string());

        if let Some(cache) = &self.cache {
            match cache.get::<OrganizationRole>(&cache_key).await {
                Ok(Some(role)) => return Ok(Some(role)),
                Ok(None) => {}
                Err(e) => tracing::warn!("Membership cache read failed: {}", e),
            }
        }

        let role = self
            .member_repo
            .accepted_role(organization_id, user_id)
            .await?;

        if let (Some(cache), Some(role)) = (&self.cache, role) {
            if let Err(e) = cache.set(&cache_key, &role, MEMBERSHIP_TTL_SECONDS).await {
                tracing::warn!("Membership cache write failed: {}", e);
            }
        }

        Ok(role)
    }

    /// Forget the cached role of one member
    pub async fn invalidate(&self, organization_id: Uuid, user_id: Uuid) {
        if let Some(cache) = &self.cache {
            let key = membership_cache_key(&organization_id.to_string(), &user_id.to_string());
            if let Err(e) = cache.delete(&key).await {
                tracing::warn!("Membership cache invalidation failed: {}", e);
            }
        }
    }

    /// Forget every cached role of an organization
    pub async fn invalidate_organization(&self, organization_id: Uuid) {
        if let Some(cache) = &self.cache {
            let pattern = membership_cache_key(&organization_id.to_string(), "*");
            if let Err(e) = cache.delete_pattern(&pattern).await {
                tracing::warn!("Membership cache invalidation failed: {}", e);
            }
        }
    }
}
