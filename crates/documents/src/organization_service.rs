use crate::error::{DocumentError, Result};
use crate::storage::{remove_blobs, Storage};
use docvault_authz::{AccessGuard, Permission};
use docvault_database::{
    Database, DocumentVersionRepository, OrganizationRepository, OrganizationUserRepository,
    UserRepository,
};
use docvault_models::{
    AddOrganizationUser, CreateOrganization, Organization, OrganizationRole, OrganizationType,
    OrganizationUser, OrganizationUserWithUser, OrganizationWithRole, PendingInvitation,
    UpdateOrganization,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Organizations, memberships and invitations
#[derive(Clone)]
pub struct OrganizationService {
    db: Database,
    guard: AccessGuard,
    storage: Arc<dyn Storage>,
    org_repo: OrganizationRepository,
    member_repo: OrganizationUserRepository,
    user_repo: UserRepository,
    version_repo: DocumentVersionRepository,
}

impl OrganizationService {
    pub fn new(db: Database, guard: AccessGuard, storage: Arc<dyn Storage>) -> Self {
        let pool = db.pool().clone();

        Self {
            db,
            guard,
            storage,
            org_repo: OrganizationRepository::new(pool.clone()),
            member_repo: OrganizationUserRepository::new(pool.clone()),
            user_repo: UserRepository::new(pool.clone()),
            version_repo: DocumentVersionRepository::new(pool),
        }
    }

    /// Create an organization owned by the caller
    pub async fn create(
        &self,
        user_id: Uuid,
        request: CreateOrganization,
    ) -> Result<OrganizationWithRole> {
        request.validate()?;

        let mut tx = self.db.begin().await?;

        let organization = self
            .org_repo
            .create(
                &mut *tx,
                request.name.trim(),
                request.description.as_deref(),
                request.organization_type,
                user_id,
            )
            .await?;

        self.member_repo
            .add(
                &mut *tx,
                organization.id,
                user_id,
                OrganizationRole::Owner,
                true,
                None,
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            organization_id = %organization.id,
            user_id = %user_id,
            organization_type = %organization.organization_type,
            "Organization created"
        );

        Ok(OrganizationWithRole {
            organization,
            role: OrganizationRole::Owner,
        })
    }

    /// Organizations the caller has accepted membership in
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrganizationWithRole>> {
        Ok(self.org_repo.list_for_user(user_id).await?)
    }

    pub async fn get(&self, user_id: Uuid, organization_id: Uuid) -> Result<OrganizationWithRole> {
        let membership = self
            .guard
            .authorize(user_id, organization_id, Permission::View)
            .await?;
        let organization = self.org_repo.find_by_id(organization_id).await?;

        Ok(OrganizationWithRole {
            organization,
            role: membership.role,
        })
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        mut request: UpdateOrganization,
    ) -> Result<Organization> {
        request.validate()?;
        if request.is_empty() {
            return Err(DocumentError::BadRequest("No fields to update".to_string()));
        }
        request.normalize();

        self.guard
            .authorize(user_id, organization_id, Permission::Manage)
            .await?;

        let current = self.org_repo.find_by_id(organization_id).await?;

        if request.organization_type == Some(OrganizationType::Individual)
            && current.organization_type == OrganizationType::Collaborative
        {
            let members = self.member_repo.count_by_organization(organization_id).await?;
            if members > 1 {
                return Err(DocumentError::Conflict(
                    "An organization with other members or pending invitations cannot become individual"
                        .to_string(),
                ));
            }
        }

        let organization = self.org_repo.update(organization_id, &request).await?;

        tracing::info!(organization_id = %organization_id, user_id = %user_id, "Organization updated");
        Ok(organization)
    }

    /// Delete an organization with all of its documents, versions and memberships
    pub async fn delete(&self, user_id: Uuid, organization_id: Uuid) -> Result<()> {
        self.guard
            .authorize(user_id, organization_id, Permission::Manage)
            .await?;

        let organization = self.org_repo.find_by_id(organization_id).await?;
        if self.is_personal(&organization).await? {
            return Err(DocumentError::BadRequest(
                "A personal organization cannot be deleted".to_string(),
            ));
        }

        let mut tx = self.db.begin().await?;
        let keys = self
            .version_repo
            .storage_keys_for_organization(&mut *tx, organization_id)
            .await?;
        if !self.org_repo.delete(&mut *tx, organization_id).await? {
            return Err(DocumentError::NotFound("Organization not found".to_string()));
        }
        tx.commit().await?;

        self.guard.invalidate_organization(organization_id).await;
        remove_blobs(self.storage.as_ref(), &keys).await;

        tracing::info!(
            organization_id = %organization_id,
            user_id = %user_id,
            blobs = keys.len(),
            "Organization deleted"
        );
        Ok(())
    }

    /// Invite an existing user; the membership stays pending until accepted
    pub async fn add_user(
        &self,
        user_id: Uuid,
        request: AddOrganizationUser,
    ) -> Result<OrganizationUser> {
        request.validate()?;

        let organization_id = request.organization_id;
        self.guard
            .authorize(user_id, organization_id, Permission::Manage)
            .await?;

        let organization = self.org_repo.find_by_id(organization_id).await?;
        if organization.organization_type == OrganizationType::Individual {
            return Err(DocumentError::BadRequest(
                "Users cannot be added to an individual organization".to_string(),
            ));
        }

        let invitee = self
            .user_repo
            .find_by_email(request.email.trim())
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    DocumentError::NotFound("No user with this email".to_string())
                } else {
                    e.into()
                }
            })?;

        if self.member_repo.get(organization_id, invitee.id).await?.is_some() {
            return Err(DocumentError::Conflict(
                "User is already a member or has a pending invitation".to_string(),
            ));
        }

        let membership = self
            .member_repo
            .add(
                self.db.pool(),
                organization_id,
                invitee.id,
                request.role,
                false,
                Some(user_id),
            )
            .await?;

        tracing::info!(
            organization_id = %organization_id,
            invitee_id = %invitee.id,
            invited_by = %user_id,
            role = %request.role,
            "User invited to organization"
        );

        Ok(membership)
    }

    pub async fn list_invitations(&self, user_id: Uuid) -> Result<Vec<PendingInvitation>> {
        Ok(self.member_repo.list_pending_for_user(user_id).await?)
    }

    pub async fn accept_invitation(&self, user_id: Uuid, organization_id: Uuid) -> Result<()> {
        if !self.member_repo.accept(organization_id, user_id).await? {
            return Err(DocumentError::NotFound(
                "No pending invitation for this organization".to_string(),
            ));
        }

        self.guard.invalidate(organization_id, user_id).await;

        tracing::info!(organization_id = %organization_id, user_id = %user_id, "Invitation accepted");
        Ok(())
    }

    pub async fn decline_invitation(&self, user_id: Uuid, organization_id: Uuid) -> Result<()> {
        if !self.member_repo.delete_pending(organization_id, user_id).await? {
            return Err(DocumentError::NotFound(
                "No pending invitation for this organization".to_string(),
            ));
        }

        tracing::info!(organization_id = %organization_id, user_id = %user_id, "Invitation declined");
        Ok(())
    }

    /// Accepted and pending memberships with user details
    pub async fn list_members(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Vec<OrganizationUserWithUser>> {
        self.guard
            .authorize(user_id, organization_id, Permission::View)
            .await?;

        Ok(self.member_repo.list_with_users(organization_id).await?)
    }

    pub async fn update_member_role(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        member_id: Uuid,
        role: OrganizationRole,
    ) -> Result<OrganizationUser> {
        self.guard
            .authorize(user_id, organization_id, Permission::Manage)
            .await?;

        let mut tx = self.db.begin().await?;
        let owners = self
            .member_repo
            .count_owners_for_update(&mut *tx, organization_id)
            .await?;

        let current = self.find_member(organization_id, member_id).await?;
        if is_accepted_owner(&current) && role != OrganizationRole::Owner && owners <= 1 {
            return Err(DocumentError::Conflict(
                "Cannot demote the last owner of an organization".to_string(),
            ));
        }

        let membership = self
            .member_repo
            .update_role(&mut *tx, organization_id, member_id, role)
            .await?;
        tx.commit().await?;

        self.guard.invalidate(organization_id, member_id).await;

        tracing::info!(
            organization_id = %organization_id,
            member_id = %member_id,
            role = %role,
            changed_by = %user_id,
            "Member role updated"
        );

        Ok(membership)
    }

    /// Remove a member or withdraw an invitation. Members may always remove
    /// themselves; removing anyone else requires ownership.
    pub async fn remove_member(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        member_id: Uuid,
    ) -> Result<()> {
        let required = if member_id == user_id {
            Permission::View
        } else {
            Permission::Manage
        };
        self.guard.authorize(user_id, organization_id, required).await?;

        let mut tx = self.db.begin().await?;
        let owners = self
            .member_repo
            .count_owners_for_update(&mut *tx, organization_id)
            .await?;

        let current = self.find_member(organization_id, member_id).await?;
        if is_accepted_owner(&current) && owners <= 1 {
            return Err(DocumentError::Conflict(
                "Cannot remove the last owner of an organization".to_string(),
            ));
        }

        self.member_repo
            .remove(&mut *tx, organization_id, member_id)
            .await?;
        tx.commit().await?;

        self.guard.invalidate(organization_id, member_id).await;

        tracing::info!(
            organization_id = %organization_id,
            member_id = %member_id,
            removed_by = %user_id,
            "Member removed"
        );

        Ok(())
    }

    /// Leave an organization the caller belongs to
    pub async fn leave(&self, user_id: Uuid, organization_id: Uuid) -> Result<()> {
        self.remove_member(user_id, organization_id, user_id).await
    }

    async fn find_member(&self, organization_id: Uuid, member_id: Uuid) -> Result<OrganizationUser> {
        self.member_repo
            .get(organization_id, member_id)
            .await?
            .ok_or_else(|| DocumentError::NotFound("Membership not found".to_string()))
    }

    /// The oldest individual organization of its creator is their personal workspace
    async fn is_personal(&self, organization: &Organization) -> Result<bool> {
        if organization.organization_type != OrganizationType::Individual {
            return Ok(false);
        }

        let personal = self.org_repo.find_personal(organization.created_by).await?;
        Ok(personal.map(|o| o.id) == Some(organization.id))
    }
}

fn is_accepted_owner(membership: &OrganizationUser) -> bool {
    membership.invite_accepted && membership.role == OrganizationRole::Owner
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixture;
    use chrono::Utc;

    fn membership(role: OrganizationRole, invite_accepted: bool) -> OrganizationUser {
        OrganizationUser {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            role,
            invite_accepted,
            invited_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_only_accepted_owners_count_as_owners() {
        assert!(is_accepted_owner(&membership(OrganizationRole::Owner, true)));
        assert!(!is_accepted_owner(&membership(OrganizationRole::Owner, false)));
        assert!(!is_accepted_owner(&membership(OrganizationRole::Write, true)));
    }

    #[tokio::test]
    #[ignore] // Only run with database available
    async fn test_last_owner_is_protected() {
        let f = fixture().await;
        let owner = f.user().await;
        let org_id = f.organization(owner.id, OrganizationType::Collaborative).await;

        let demote = f
            .organizations
            .update_member_role(owner.id, org_id, owner.id, OrganizationRole::Write)
            .await;
        assert!(matches!(demote, Err(DocumentError::Conflict(_))));
        assert!(matches!(
            f.organizations.remove_member(owner.id, org_id, owner.id).await,
            Err(DocumentError::Conflict(_))
        ));
        assert!(matches!(
            f.organizations.leave(owner.id, org_id).await,
            Err(DocumentError::Conflict(_))
        ));

        // A pending owner invitation does not count as a second owner
        let pending = f.user().await;
        f.invite(owner.id, org_id, &pending, OrganizationRole::Owner, false).await;
        assert!(matches!(
            f.organizations.leave(owner.id, org_id).await,
            Err(DocumentError::Conflict(_))
        ));

        f.organizations.accept_invitation(pending.id, org_id).await.unwrap();
        f.organizations
            .update_member_role(owner.id, org_id, owner.id, OrganizationRole::Read)
            .await
            .unwrap();
        assert!(matches!(
            f.organizations.delete(owner.id, org_id).await,
            Err(DocumentError::Forbidden(_))
        ));

        f.organizations.delete(pending.id, org_id).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Only run with database available
    async fn test_collaborative_with_members_cannot_become_individual() {
        let f = fixture().await;
        let owner = f.user().await;
        let invitee = f.user().await;
        let org_id = f.organization(owner.id, OrganizationType::Collaborative).await;
        f.invite(owner.id, org_id, &invitee, OrganizationRole::Read, false).await;

        let to_individual = UpdateOrganization {
            name: None,
            description: None,
            organization_type: Some(OrganizationType::Individual),
        };
        assert!(matches!(
            f.organizations.update(owner.id, org_id, to_individual.clone()).await,
            Err(DocumentError::Conflict(_))
        ));

        f.organizations.decline_invitation(invitee.id, org_id).await.unwrap();
        let updated = f.organizations.update(owner.id, org_id, to_individual).await.unwrap();
        assert_eq!(updated.organization_type, OrganizationType::Individual);
    }

    #[tokio::test]
    #[ignore] // Only run with database available
    async fn test_invitation_rules() {
        let f = fixture().await;
        let owner = f.user().await;
        let invitee = f.user().await;

        let personal = f.organization(owner.id, OrganizationType::Individual).await;
        let add_to_personal = f
            .organizations
            .add_user(
                owner.id,
                AddOrganizationUser {
                    organization_id: personal,
                    email: invitee.email.clone(),
                    role: OrganizationRole::Write,
                },
            )
            .await;
        assert!(matches!(add_to_personal, Err(DocumentError::BadRequest(_))));

        let org_id = f.organization(owner.id, OrganizationType::Collaborative).await;
        assert!(matches!(
            f.organizations.accept_invitation(invitee.id, org_id).await,
            Err(DocumentError::NotFound(_))
        ));
        assert!(matches!(
            f.organizations.decline_invitation(invitee.id, org_id).await,
            Err(DocumentError::NotFound(_))
        ));

        f.invite(owner.id, org_id, &invitee, OrganizationRole::Write, false).await;
        let duplicate = f
            .organizations
            .add_user(
                owner.id,
                AddOrganizationUser {
                    organization_id: org_id,
                    email: invitee.email.to_uppercase(),
                    role: OrganizationRole::Read,
                },
            )
            .await;
        assert!(matches!(duplicate, Err(DocumentError::Conflict(_))));

        // Pending invitees see the invitation but not the organization
        let invitations = f.organizations.list_invitations(invitee.id).await.unwrap();
        assert_eq!(invitations.len(), 1);
        assert!(matches!(
            f.organizations.get(invitee.id, org_id).await,
            Err(DocumentError::Forbidden(_))
        ));

        f.organizations.accept_invitation(invitee.id, org_id).await.unwrap();
        let membership = f.organizations.get(invitee.id, org_id).await.unwrap();
        assert_eq!(membership.role, OrganizationRole::Write);
        assert!(matches!(
            f.organizations.accept_invitation(invitee.id, org_id).await,
            Err(DocumentError::NotFound(_))
        ));

        f.organizations.leave(invitee.id, org_id).await.unwrap();
        f.organizations.delete(owner.id, org_id).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Only run with database available
    async fn test_personal_organization_cannot_be_deleted() {
        let f = fixture().await;
        let owner = f.user().await;

        let personal = f.organization(owner.id, OrganizationType::Individual).await;
        let second = f.organization(owner.id, OrganizationType::Individual).await;

        assert!(matches!(
            f.organizations.delete(owner.id, personal).await,
            Err(DocumentError::BadRequest(_))
        ));
        f.organizations.delete(owner.id, second).await.unwrap();
        assert!(matches!(
            f.organizations.get(owner.id, second).await,
            Err(DocumentError::NotFound(_))
        ));
    }
}
