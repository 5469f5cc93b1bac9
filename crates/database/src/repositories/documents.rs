use crate::error::{DatabaseError, Result};
use docvault_models::{Document, UpdateDocument};
use sqlx::postgres::PgExecutor;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

#[derive(Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new document
    pub async fn create<'e, E: PgExecutor<'e>>(
        &self,
        executor: E,
        organization_id: Uuid,
        title: &str,
        description: Option<&str>,
        created_by: Uuid,
    ) -> Result<Document> {
        let document = sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (organization_id, title, description, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(organization_id)
        .bind(title)
        .bind(description)
        .bind(created_by)
        .fetch_one(executor)
        .await
        .map_err(|e| DatabaseError::from_constraint(e, "Document", "this id"))?;

        Ok(document)
    }

    /// Find document by ID, trashed or not
    pub async fn find_by_id(&self, id: Uuid) -> Result<Document> {
        sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Document", &id.to_string()))
    }

    /// Find and lock a document row for the rest of the transaction
    pub async fn find_for_update<'e, E: PgExecutor<'e>>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Document> {
        sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Document", &id.to_string()))
    }

    /// Documents of an organization that are not in the trash
    pub async fn list_active(&self, organization_id: Uuid) -> Result<Vec<Document>> {
        let documents = sqlx::query_as::<_, Document>(
            r#"
            SELECT * FROM documents
            WHERE organization_id = $1 AND trashed_at IS NULL
            ORDER BY updated_at DESC
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(documents)
    }

    /// Documents of an organization that are in the trash
    pub async fn list_trashed(&self, organization_id: Uuid) -> Result<Vec<Document>> {
        let documents = sqlx::query_as::<_, Document>(
            r#"
            SELECT * FROM documents
            WHERE organization_id = $1 AND trashed_at IS NOT NULL
            ORDER BY trashed_at DESC
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(documents)
    }

    /// Update title/description of a document that is not trashed
    pub async fn update<'e, E: PgExecutor<'e>>(
        &self,
        executor: E,
        id: Uuid,
        update: &UpdateDocument,
    ) -> Result<Option<Document>> {
        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE documents SET updated_at = NOW()");

        if let Some(title) = &update.title {
            query_builder.push(", title = ");
            query_builder.push_bind(title);
        }

        if let Some(description) = &update.description {
            query_builder.push(", description = ");
            query_builder.push_bind(description);
        }

        query_builder.push(" WHERE trashed_at IS NULL AND id = ");
        query_builder.push_bind(id);
        query_builder.push(" RETURNING *");

        let document = query_builder
            .build_query_as::<Document>()
            .fetch_optional(executor)
            .await?;

        Ok(document)
    }

    /// Move a document to the trash; `None` if it was already trashed
    pub async fn trash<'e, E: PgExecutor<'e>>(
        &self,
        executor: E,
        id: Uuid,
        trashed_by: Uuid,
    ) -> Result<Option<Document>> {
        let document = sqlx::query_as::<_, Document>(
            r#"
            UPDATE documents
            SET trashed_at = NOW(), trashed_by = $2
            WHERE id = $1 AND trashed_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(trashed_by)
        .fetch_optional(executor)
        .await?;

        Ok(document)
    }

    /// Take a document out of the trash; `None` if it was not trashed
    pub async fn restore<'e, E: PgExecutor<'e>>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Document>> {
        let document = sqlx::query_as::<_, Document>(
            r#"
            UPDATE documents
            SET trashed_at = NULL, trashed_by = NULL, updated_at = NOW()
            WHERE id = $1 AND trashed_at IS NOT NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(document)
    }

    /// Record a freshly uploaded version as current and advance the sequence
    pub async fn advance_version<'e, E: PgExecutor<'e>>(
        &self,
        executor: E,
        id: Uuid,
        version_number: i32,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE documents
            SET current_version = $2, version_seq = GREATEST(version_seq, $2), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(version_number)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Point the document at an existing version number; the sequence is untouched
    pub async fn set_current_version<'e, E: PgExecutor<'e>>(
        &self,
        executor: E,
        id: Uuid,
        version_number: i32,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE documents SET current_version = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(version_number)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Permanently delete a document; versions cascade
    pub async fn delete<'e, E: PgExecutor<'e>>(&self, executor: E, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
