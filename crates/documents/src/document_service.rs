use crate::audit_service::AuditService;
use crate::error::{DocumentError, Result};
use crate::storage::{remove_blobs, Storage};
use docvault_authz::{AccessGuard, Permission};
use docvault_database::{Database, DocumentRepository, DocumentVersionRepository};
use docvault_models::{AuditAction, CreateAuditLog, CreateDocument, Document, UpdateDocument};
use serde_json::json;
use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct DocumentService {
    db: Database,
    guard: AccessGuard,
    audit: AuditService,
    storage: Arc<dyn Storage>,
    document_repo: DocumentRepository,
    version_repo: DocumentVersionRepository,
}

impl DocumentService {
    pub fn new(
        db: Database,
        guard: AccessGuard,
        audit: AuditService,
        storage: Arc<dyn Storage>,
    ) -> Self {
        let pool = db.pool().clone();

        Self {
            db,
            guard,
            audit,
            storage,
            document_repo: DocumentRepository::new(pool.clone()),
            version_repo: DocumentVersionRepository::new(pool),
        }
    }

    pub async fn create(&self, user_id: Uuid, request: CreateDocument) -> Result<Document> {
        request.validate()?;

        self.guard
            .authorize(user_id, request.organization_id, Permission::Edit)
            .await?;

        let mut tx = self.db.begin().await?;
        let document = self
            .document_repo
            .create(
                &mut *tx,
                request.organization_id,
                request.title.trim(),
                request.description.as_deref(),
                user_id,
            )
            .await?;

        self.audit
            .record(
                &mut *tx,
                CreateAuditLog::new(document.organization_id, AuditAction::Created)
                    .document(document.id)
                    .user(user_id)
                    .details(json!({ "title": document.title })),
            )
            .await?;
        tx.commit().await?;

        tracing::info!(document_id = %document.id, organization_id = %document.organization_id, "Document created");
        Ok(document)
    }

    /// Documents of an organization that are not in the trash
    pub async fn list(&self, user_id: Uuid, organization_id: Uuid) -> Result<Vec<Document>> {
        self.guard
            .authorize(user_id, organization_id, Permission::View)
            .await?;

        Ok(self.document_repo.list_active(organization_id).await?)
    }

    pub async fn list_trashed(&self, user_id: Uuid, organization_id: Uuid) -> Result<Vec<Document>> {
        self.guard
            .authorize(user_id, organization_id, Permission::View)
            .await?;

        Ok(self.document_repo.list_trashed(organization_id).await?)
    }

    /// A live document; trashed documents are only reachable through the trash listing
    pub async fn get(&self, user_id: Uuid, document_id: Uuid) -> Result<Document> {
        let document = self.find_authorized(user_id, document_id, Permission::View).await?;
        if document.is_trashed() {
            return Err(DocumentError::NotFound("Document not found".to_string()));
        }

        Ok(document)
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        document_id: Uuid,
        mut request: UpdateDocument,
    ) -> Result<Document> {
        request.validate()?;
        if request.is_empty() {
            return Err(DocumentError::BadRequest("No fields to update".to_string()));
        }
        request.normalize();

        let document = self.find_authorized(user_id, document_id, Permission::Edit).await?;
        if document.is_trashed() {
            return Err(trashed_conflict());
        }

        let mut tx = self.db.begin().await?;
        let updated = self
            .document_repo
            .update(&mut *tx, document_id, &request)
            .await?
            .ok_or_else(trashed_conflict)?;

        self.audit
            .record(
                &mut *tx,
                CreateAuditLog::new(updated.organization_id, AuditAction::Updated)
                    .document(updated.id)
                    .user(user_id)
                    .details(json!({ "fields": request.changed_fields() })),
            )
            .await?;
        tx.commit().await?;

        Ok(updated)
    }

    /// Move a document to the trash; it can be restored later
    pub async fn trash(&self, user_id: Uuid, document_id: Uuid) -> Result<Document> {
        let document = self.find_authorized(user_id, document_id, Permission::Edit).await?;

        let mut tx = self.db.begin().await?;
        let trashed = self
            .document_repo
            .trash(&mut *tx, document.id, user_id)
            .await?
            .ok_or_else(|| DocumentError::Conflict("Document is already in the trash".to_string()))?;

        self.audit
            .record(
                &mut *tx,
                CreateAuditLog::new(trashed.organization_id, AuditAction::Trashed)
                    .document(trashed.id)
                    .user(user_id),
            )
            .await?;
        tx.commit().await?;

        tracing::info!(document_id = %document_id, user_id = %user_id, "Document moved to trash");
        Ok(trashed)
    }

    pub async fn restore(&self, user_id: Uuid, document_id: Uuid) -> Result<Document> {
        let document = self.find_authorized(user_id, document_id, Permission::Edit).await?;

        let mut tx = self.db.begin().await?;
        let restored = self
            .document_repo
            .restore(&mut *tx, document.id)
            .await?
            .ok_or_else(|| DocumentError::Conflict("Document is not in the trash".to_string()))?;

        self.audit
            .record(
                &mut *tx,
                CreateAuditLog::new(restored.organization_id, AuditAction::Restored)
                    .document(restored.id)
                    .user(user_id),
            )
            .await?;
        tx.commit().await?;

        tracing::info!(document_id = %document_id, user_id = %user_id, "Document restored");
        Ok(restored)
    }

    /// Permanently delete a document and all of its versions
    pub async fn delete(&self, user_id: Uuid, document_id: Uuid) -> Result<()> {
        let document = self.find_authorized(user_id, document_id, Permission::Manage).await?;

        let mut tx = self.db.begin().await?;
        let keys = self.purge(&mut tx, user_id, &document).await?;
        tx.commit().await?;

        remove_blobs(self.storage.as_ref(), &keys).await;

        tracing::info!(document_id = %document_id, user_id = %user_id, "Document deleted");
        Ok(())
    }

    /// Permanently delete every trashed document of an organization
    pub async fn empty_trash(&self, user_id: Uuid, organization_id: Uuid) -> Result<u64> {
        self.guard
            .authorize(user_id, organization_id, Permission::Manage)
            .await?;

        let trashed = self.document_repo.list_trashed(organization_id).await?;
        if trashed.is_empty() {
            return Ok(0);
        }

        let mut tx = self.db.begin().await?;
        let mut keys = Vec::new();
        let mut deleted = 0u64;
        for document in &trashed {
            // Restored or deleted since the listing
            let locked = match self.document_repo.find_for_update(&mut *tx, document.id).await {
                Ok(locked) => locked,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e.into()),
            };
            if !locked.is_trashed() {
                continue;
            }

            keys.extend(self.purge(&mut tx, user_id, &locked).await?);
            deleted += 1;
        }
        tx.commit().await?;

        remove_blobs(self.storage.as_ref(), &keys).await;

        tracing::info!(organization_id = %organization_id, user_id = %user_id, deleted, "Trash emptied");
        Ok(deleted)
    }

    /// Delete the document row inside `tx` and return the blob keys to remove after commit
    async fn purge(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        user_id: Uuid,
        document: &Document,
    ) -> Result<Vec<String>> {
        let keys = self
            .version_repo
            .storage_keys_for_document(&mut **tx, document.id)
            .await?;

        if !self.document_repo.delete(&mut **tx, document.id).await? {
            return Err(DocumentError::NotFound("Document not found".to_string()));
        }

        self.audit
            .record(
                &mut **tx,
                CreateAuditLog::new(document.organization_id, AuditAction::Deleted)
                    .document(document.id)
                    .user(user_id)
                    .details(json!({
                        "title": document.title,
                        "versions": keys.len(),
                    })),
            )
            .await?;

        Ok(keys)
    }

    async fn find_authorized(
        &self,
        user_id: Uuid,
        document_id: Uuid,
        permission: Permission,
    ) -> Result<Document> {
        let document = self.document_repo.find_by_id(document_id).await?;
        self.guard
            .authorize(user_id, document.organization_id, permission)
            .await?;

        Ok(document)
    }
}

fn trashed_conflict() -> DocumentError {
    DocumentError::Conflict("Document is in the trash".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixture;
    use docvault_models::{AuditLogQuery, OrganizationRole, OrganizationType};

    #[tokio::test]
    #[ignore] // Only run with database available
    async fn test_document_lifecycle() {
        let f = fixture().await;
        let owner = f.user().await.id;
        let org_id = f.organization(owner, OrganizationType::Collaborative).await;

        let document = f.document(owner, org_id).await;
        assert_eq!(document.current_version, 0);

        f.upload(owner, document.id, b"v1").await;
        f.upload(owner, document.id, b"v2").await;
        assert_eq!(f.documents.get(owner, document.id).await.unwrap().current_version, 2);

        f.documents.trash(owner, document.id).await.unwrap();
        assert!(matches!(
            f.documents.get(owner, document.id).await,
            Err(DocumentError::NotFound(_))
        ));
        assert!(matches!(
            f.documents.trash(owner, document.id).await,
            Err(DocumentError::Conflict(_))
        ));

        f.documents.restore(owner, document.id).await.unwrap();
        assert!(matches!(
            f.documents.restore(owner, document.id).await,
            Err(DocumentError::Conflict(_))
        ));

        f.documents.trash(owner, document.id).await.unwrap();
        assert_eq!(f.documents.empty_trash(owner, org_id).await.unwrap(), 1);

        let query = AuditLogQuery {
            document_id: Some(document.id),
            ..AuditLogQuery::new(org_id)
        };
        let page = f.audit.list_for_organization(owner, query).await.unwrap();
        let actions: Vec<AuditAction> = page.logs.iter().rev().map(|log| log.action).collect();
        assert_eq!(
            actions,
            vec![
                AuditAction::Created,
                AuditAction::Updated,
                AuditAction::Updated,
                AuditAction::Trashed,
                AuditAction::Restored,
                AuditAction::Trashed,
                AuditAction::Deleted,
            ]
        );

        f.organizations.delete(owner, org_id).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Only run with database available
    async fn test_strangers_cannot_create_documents() {
        let f = fixture().await;
        let owner = f.user().await.id;
        let stranger = f.user().await.id;
        let org_id = f.organization(owner, OrganizationType::Collaborative).await;

        let result = f
            .documents
            .create(
                stranger,
                CreateDocument {
                    organization_id: org_id,
                    title: "Sneaky".to_string(),
                    description: None,
                },
            )
            .await;
        assert!(matches!(result, Err(DocumentError::Forbidden(_))));

        f.organizations.delete(owner, org_id).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Only run with database available
    async fn test_readers_cannot_edit() {
        let f = fixture().await;
        let owner = f.user().await.id;
        let reader = f.user().await;
        let org_id = f.organization(owner, OrganizationType::Collaborative).await;
        f.invite(owner, org_id, &reader, OrganizationRole::Read, true).await;

        let document = f.document(owner, org_id).await;
        assert!(f.documents.get(reader.id, document.id).await.is_ok());

        let update = UpdateDocument {
            title: Some("Mine now".to_string()),
            description: None,
        };
        assert!(matches!(
            f.documents.update(reader.id, document.id, update).await,
            Err(DocumentError::Forbidden(_))
        ));
        assert!(matches!(
            f.documents.trash(reader.id, document.id).await,
            Err(DocumentError::Forbidden(_))
        ));

        f.organizations.delete(owner, org_id).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Only run with database available
    async fn test_update_trims_title() {
        let f = fixture().await;
        let owner = f.user().await.id;
        let org_id = f.organization(owner, OrganizationType::Collaborative).await;
        let document = f.document(owner, org_id).await;

        let blank = UpdateDocument {
            title: Some("   ".to_string()),
            description: None,
        };
        assert!(matches!(
            f.documents.update(owner, document.id, blank).await,
            Err(DocumentError::ValidationError(_))
        ));

        let padded = UpdateDocument {
            title: Some("  Budget  ".to_string()),
            description: None,
        };
        let updated = f.documents.update(owner, document.id, padded).await.unwrap();
        assert_eq!(updated.title, "Budget");

        f.organizations.delete(owner, org_id).await.unwrap();
    }
}
