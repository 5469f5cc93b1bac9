use crate::error::Result;
use docvault_models::{AuditLog, AuditLogQuery, CreateAuditLog};
use sqlx::postgres::PgExecutor;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new audit log entry (immutable, append-only)
    pub async fn create<'e, E: PgExecutor<'e>>(
        &self,
        executor: E,
        log: &CreateAuditLog,
    ) -> Result<AuditLog> {
        let audit_log = sqlx::query_as::<_, AuditLog>(
            r#"
            INSERT INTO audit_logs (organization_id, document_id, user_id, action, details)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(log.organization_id)
        .bind(log.document_id)
        .bind(log.user_id)
        .bind(log.action)
        .bind(&log.details)
        .fetch_one(executor)
        .await?;

        Ok(audit_log)
    }

    /// Query audit logs with filters, most recent first
    pub async fn query(&self, query: &AuditLogQuery) -> Result<Vec<AuditLog>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM audit_logs WHERE organization_id = ");
        builder.push_bind(query.organization_id);
        Self::push_filters(&mut builder, query);

        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(query.limit);
        builder.push(" OFFSET ");
        builder.push_bind(query.offset);

        let logs = builder
            .build_query_as::<AuditLog>()
            .fetch_all(&self.pool)
            .await?;

        Ok(logs)
    }

    /// Count audit logs matching the same filters as `query`
    pub async fn count(&self, query: &AuditLogQuery) -> Result<i64> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM audit_logs WHERE organization_id = ");
        builder.push_bind(query.organization_id);
        Self::push_filters(&mut builder, query);

        let count: (i64,) = builder.build_query_as().fetch_one(&self.pool).await?;
        Ok(count.0)
    }

    /// History of a single document, most recent first
    pub async fn list_for_document(&self, document_id: Uuid) -> Result<Vec<AuditLog>> {
        let logs = sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT * FROM audit_logs
            WHERE document_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &AuditLogQuery) {
        if let Some(action) = query.action {
            builder.push(" AND action = ");
            builder.push_bind(action.to_string());
        }

        if let Some(document_id) = query.document_id {
            builder.push(" AND document_id = ");
            builder.push_bind(document_id);
        }

        if let Some(user_id) = query.user_id {
            builder.push(" AND user_id = ");
            builder.push_bind(user_id);
        }

        if let Some(from_date) = query.from_date {
            builder.push(" AND created_at >= ");
            builder.push_bind(from_date);
        }

        if let Some(to_date) = query.to_date {
            builder.push(" AND created_at <= ");
            builder.push_bind(to_date);
        }
    }
}
