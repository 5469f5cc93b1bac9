use crate::error::{DatabaseError, Result};
use docvault_models::{DocumentVersion, NewDocumentVersion};
use sqlx::postgres::PgExecutor;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct DocumentVersionRepository {
    pool: PgPool,
}

impl DocumentVersionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a version with an already assigned number
    pub async fn create<'e, E: PgExecutor<'e>>(
        &self,
        executor: E,
        version: &NewDocumentVersion,
        version_number: i32,
    ) -> Result<DocumentVersion> {
        sqlx::query_as::<_, DocumentVersion>(
            r#"
            INSERT INTO document_versions (
                id, document_id, version_number,
                file_name, mime_type, size_bytes, checksum, storage_key,
                comment, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(version.id)
        .bind(version.document_id)
        .bind(version_number)
        .bind(&version.file_name)
        .bind(&version.mime_type)
        .bind(version.size_bytes)
        .bind(&version.checksum)
        .bind(&version.storage_key)
        .bind(&version.comment)
        .bind(version.created_by)
        .fetch_one(executor)
        .await
        .map_err(|e| DatabaseError::from_constraint(e, "Version", "this number"))
    }

    /// Find version by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<DocumentVersion> {
        sqlx::query_as::<_, DocumentVersion>("SELECT * FROM document_versions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Document version", &id.to_string()))
    }

    /// Versions of a document, newest first
    pub async fn list_by_document(&self, document_id: Uuid) -> Result<Vec<DocumentVersion>> {
        let versions = sqlx::query_as::<_, DocumentVersion>(
            r#"
            SELECT * FROM document_versions
            WHERE document_id = $1
            ORDER BY version_number DESC
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(versions)
    }

    /// Highest remaining version number of a document (0 when none)
    pub async fn max_version<'e, E: PgExecutor<'e>>(
        &self,
        executor: E,
        document_id: Uuid,
    ) -> Result<i32> {
        let max: (Option<i32>,) = sqlx::query_as(
            "SELECT MAX(version_number) FROM document_versions WHERE document_id = $1",
        )
        .bind(document_id)
        .fetch_one(executor)
        .await?;

        Ok(max.0.unwrap_or(0))
    }

    /// Count versions of a document
    pub async fn count_by_document<'e, E: PgExecutor<'e>>(
        &self,
        executor: E,
        document_id: Uuid,
    ) -> Result<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM document_versions WHERE document_id = $1")
                .bind(document_id)
                .fetch_one(executor)
                .await?;

        Ok(count.0)
    }

    /// Delete a single version
    pub async fn delete<'e, E: PgExecutor<'e>>(&self, executor: E, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM document_versions WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Storage keys of every version of a document
    pub async fn storage_keys_for_document<'e, E: PgExecutor<'e>>(
        &self,
        executor: E,
        document_id: Uuid,
    ) -> Result<Vec<String>> {
        let keys: Vec<(String,)> =
            sqlx::query_as("SELECT storage_key FROM document_versions WHERE document_id = $1")
                .bind(document_id)
                .fetch_all(executor)
                .await?;

        Ok(keys.into_iter().map(|(key,)| key).collect())
    }

    /// Storage keys of every version in an organization
    pub async fn storage_keys_for_organization<'e, E: PgExecutor<'e>>(
        &self,
        executor: E,
        organization_id: Uuid,
    ) -> Result<Vec<String>> {
        let keys: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT v.storage_key
            FROM document_versions v
            INNER JOIN documents d ON d.id = v.document_id
            WHERE d.organization_id = $1
            "#,
        )
        .bind(organization_id)
        .fetch_all(executor)
        .await?;

        Ok(keys.into_iter().map(|(key,)| key).collect())
    }
}
