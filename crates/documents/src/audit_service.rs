use crate::error::Result;
use docvault_authz::{AccessGuard, Permission};
use docvault_database::{AuditRepository, Database, DocumentRepository};
use docvault_models::{AuditLog, AuditLogQuery, CreateAuditLog};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;
use uuid::Uuid;

/// One page of an organization's audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogPage {
    pub logs: Vec<AuditLog>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Clone)]
pub struct AuditService {
    audit_repo: AuditRepository,
    document_repo: DocumentRepository,
    guard: AccessGuard,
}

impl AuditService {
    pub fn new(db: &Database, guard: AccessGuard) -> Self {
        let pool = db.pool().clone();

        Self {
            audit_repo: AuditRepository::new(pool.clone()),
            document_repo: DocumentRepository::new(pool),
            guard,
        }
    }

    /// Append an entry as part of the caller's transaction
    pub async fn record<'e, E: PgExecutor<'e>>(
        &self,
        executor: E,
        log: CreateAuditLog,
    ) -> Result<AuditLog> {
        let entry = self.audit_repo.create(executor, &log).await?;

        tracing::debug!(
            organization_id = %entry.organization_id,
            document_id = ?entry.document_id,
            action = %entry.action,
            "Audit entry recorded"
        );

        Ok(entry)
    }

    /// Filtered audit trail of an organization; owners only
    pub async fn list_for_organization(
        &self,
        user_id: Uuid,
        query: AuditLogQuery,
    ) -> Result<AuditLogPage> {
        self.guard
            .authorize(user_id, query.organization_id, Permission::Manage)
            .await?;

        let logs = self.audit_repo.query(&query).await?;
        let total = self.audit_repo.count(&query).await?;

        Ok(AuditLogPage {
            logs,
            total,
            limit: query.limit,
            offset: query.offset,
        })
    }

    /// Full history of a document, including while it sits in the trash
    pub async fn list_for_document(&self, user_id: Uuid, document_id: Uuid) -> Result<Vec<AuditLog>> {
        let document = self.document_repo.find_by_id(document_id).await?;

        self.guard
            .authorize(user_id, document.organization_id, Permission::View)
            .await?;

        Ok(self.audit_repo.list_for_document(document_id).await?)
    }
}
