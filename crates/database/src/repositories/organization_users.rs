use crate::error::{DatabaseError, Result};
use docvault_models::{
    OrganizationRole, OrganizationUser, OrganizationUserWithUser, PendingInvitation,
};
use sqlx::postgres::PgExecutor;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct OrganizationUserRepository {
    pool: PgPool,
}

impl OrganizationUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Add a user to an organization
    pub async fn add<'e, E: PgExecutor<'e>>(
        &self,
        executor: E,
        organization_id: Uuid,
        user_id: Uuid,
        role: OrganizationRole,
        invite_accepted: bool,
        invited_by: Option<Uuid>,
    ) -> Result<OrganizationUser> {
        sqlx::query_as::<_, OrganizationUser>(
            r#"
            INSERT INTO organization_users
                (organization_id, user_id, role, invite_accepted, invited_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .bind(role)
        .bind(invite_accepted)
        .bind(invited_by)
        .fetch_one(executor)
        .await
        .map_err(|e| DatabaseError::from_constraint(e, "Membership", "this user"))
    }

    /// Get a specific membership, accepted or not
    pub async fn get(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<OrganizationUser>> {
        let member = sqlx::query_as::<_, OrganizationUser>(
            r#"
            SELECT * FROM organization_users
            WHERE organization_id = $1 AND user_id = $2
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    /// Role of an accepted member, `None` for strangers and pending invitees
    pub async fn accepted_role(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<OrganizationRole>> {
        let role: Option<(OrganizationRole,)> = sqlx::query_as(
            r#"
            SELECT role FROM organization_users
            WHERE organization_id = $1 AND user_id = $2 AND invite_accepted = TRUE
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role.map(|(role,)| role))
    }

    /// List members of an organization with user details, pending invitations included
    pub async fn list_with_users(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<OrganizationUserWithUser>> {
        let members = sqlx::query_as::<_, OrganizationUserWithUser>(
            r#"
            SELECT
                ou.id,
                ou.organization_id,
                ou.user_id,
                ou.role,
                ou.invite_accepted,
                ou.invited_by,
                ou.created_at,
                u.email,
                u.first_name,
                u.last_name
            FROM organization_users ou
            INNER JOIN users u ON ou.user_id = u.id
            WHERE ou.organization_id = $1
            ORDER BY ou.invite_accepted DESC, ou.created_at ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// Pending invitations addressed to a user
    pub async fn list_pending_for_user(&self, user_id: Uuid) -> Result<Vec<PendingInvitation>> {
        let invitations = sqlx::query_as::<_, PendingInvitation>(
            r#"
            SELECT
                ou.organization_id,
                o.name AS organization_name,
                ou.role,
                ou.invited_by,
                inviter.email AS invited_by_email,
                ou.created_at
            FROM organization_users ou
            INNER JOIN organizations o ON o.id = ou.organization_id
            LEFT JOIN users inviter ON inviter.id = ou.invited_by
            WHERE ou.user_id = $1 AND ou.invite_accepted = FALSE
            ORDER BY ou.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(invitations)
    }

    /// Mark a pending invitation as accepted; false when nothing was pending
    pub async fn accept(&self, organization_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE organization_users
            SET invite_accepted = TRUE, updated_at = NOW()
            WHERE organization_id = $1 AND user_id = $2 AND invite_accepted = FALSE
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a pending invitation; false when nothing was pending
    pub async fn delete_pending(&self, organization_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM organization_users
            WHERE organization_id = $1 AND user_id = $2 AND invite_accepted = FALSE
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a membership regardless of its state
    pub async fn remove<'e, E: PgExecutor<'e>>(
        &self,
        executor: E,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM organization_users WHERE organization_id = $1 AND user_id = $2",
        )
        .bind(organization_id)
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Update a member's role
    pub async fn update_role<'e, E: PgExecutor<'e>>(
        &self,
        executor: E,
        organization_id: Uuid,
        user_id: Uuid,
        role: OrganizationRole,
    ) -> Result<OrganizationUser> {
        sqlx::query_as::<_, OrganizationUser>(
            r#"
            UPDATE organization_users
            SET role = $3, updated_at = NOW()
            WHERE organization_id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .bind(role)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Membership not found".to_string()))
    }

    /// Count accepted owners, locking their rows for the rest of the transaction
    pub async fn count_owners_for_update<'e, E: PgExecutor<'e>>(
        &self,
        executor: E,
        organization_id: Uuid,
    ) -> Result<i64> {
        let owners: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM organization_users
            WHERE organization_id = $1 AND role = 'owner' AND invite_accepted = TRUE
            FOR UPDATE
            "#,
        )
        .bind(organization_id)
        .fetch_all(executor)
        .await?;

        Ok(owners.len() as i64)
    }

    /// Count memberships (accepted and pending) of an organization
    pub async fn count_by_organization(&self, organization_id: Uuid) -> Result<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM organization_users WHERE organization_id = $1")
                .bind(organization_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count.0)
    }
}
