use crate::error::{DatabaseError, Result};
use docvault_models::{Organization, OrganizationType, OrganizationWithRole, UpdateOrganization};
use sqlx::postgres::PgExecutor;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

#[derive(Clone)]
pub struct OrganizationRepository {
    pool: PgPool,
}

impl OrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new organization
    pub async fn create<'e, E: PgExecutor<'e>>(
        &self,
        executor: E,
        name: &str,
        description: Option<&str>,
        organization_type: OrganizationType,
        created_by: Uuid,
    ) -> Result<Organization> {
        let organization = sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (name, description, organization_type, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(organization_type)
        .bind(created_by)
        .fetch_one(executor)
        .await?;

        Ok(organization)
    }

    /// Find organization by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Organization> {
        sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Organization", &id.to_string()))
    }

    /// Check if an organization exists
    pub async fn exists(&self, id: Uuid) -> Result<bool> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM organizations WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists.0)
    }

    /// Organizations where the user holds an accepted membership
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrganizationWithRole>> {
        let organizations = sqlx::query_as::<_, OrganizationWithRole>(
            r#"
            SELECT o.*, ou.role
            FROM organizations o
            INNER JOIN organization_users ou ON ou.organization_id = o.id
            WHERE ou.user_id = $1 AND ou.invite_accepted = TRUE
            ORDER BY o.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(organizations)
    }

    /// The oldest individual organization a user created (their personal workspace)
    pub async fn find_personal(&self, user_id: Uuid) -> Result<Option<Organization>> {
        let organization = sqlx::query_as::<_, Organization>(
            r#"
            SELECT * FROM organizations
            WHERE created_by = $1 AND organization_type = 'individual'
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(organization)
    }

    /// Update organization
    pub async fn update(&self, id: Uuid, update: &UpdateOrganization) -> Result<Organization> {
        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE organizations SET updated_at = NOW()");

        if let Some(name) = &update.name {
            query_builder.push(", name = ");
            query_builder.push_bind(name);
        }

        if let Some(description) = &update.description {
            query_builder.push(", description = ");
            query_builder.push_bind(description);
        }

        if let Some(organization_type) = update.organization_type {
            query_builder.push(", organization_type = ");
            query_builder.push_bind(organization_type);
        }

        query_builder.push(" WHERE id = ");
        query_builder.push_bind(id);
        query_builder.push(" RETURNING *");

        query_builder
            .build_query_as::<Organization>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Organization", &id.to_string()))
    }

    /// Delete organization; memberships, documents, versions and audit logs cascade
    pub async fn delete<'e, E: PgExecutor<'e>>(&self, executor: E, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
