use crate::audit_service::AuditService;
use crate::error::{DocumentError, Result};
use crate::storage::{version_storage_key, Storage};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use docvault_authz::{AccessGuard, Permission};
use docvault_database::{Database, DocumentRepository, DocumentVersionRepository};
use docvault_models::{
    AuditAction, CreateAuditLog, Document, DocumentVersion, NewDocumentVersion, UploadVersion,
};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// 25 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Uploads, downloads and pruning of document versions
#[derive(Clone)]
pub struct VersionService {
    db: Database,
    guard: AccessGuard,
    audit: AuditService,
    storage: Arc<dyn Storage>,
    document_repo: DocumentRepository,
    version_repo: DocumentVersionRepository,
    max_upload_bytes: usize,
}

impl VersionService {
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
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// Store new content as the next version and make it current
    pub async fn upload(&self, user_id: Uuid, request: UploadVersion) -> Result<DocumentVersion> {
        request.validate()?;

        let content = decode_content(&request.content, self.max_upload_bytes)?;

        let document = self.document_repo.find_by_id(request.document_id).await?;
        self.guard
            .authorize(user_id, document.organization_id, Permission::Edit)
            .await?;

        let version_id = Uuid::new_v4();
        let storage_key = version_storage_key(document.organization_id, document.id, version_id);

        self.storage.put(&storage_key, &content).await?;

        let new_version = NewDocumentVersion {
            id: version_id,
            document_id: document.id,
            file_name: request.file_name.trim().to_string(),
            mime_type: request.mime_type.trim().to_string(),
            size_bytes: content.len() as i64,
            checksum: sha256_hex(&content),
            storage_key: storage_key.clone(),
            comment: request.comment,
            created_by: user_id,
        };

        match self.insert_version(user_id, &new_version).await {
            Ok(version) => {
                tracing::info!(
                    document_id = %version.document_id,
                    version = version.version_number,
                    size_bytes = version.size_bytes,
                    "Version uploaded"
                );
                Ok(version)
            }
            Err(e) => {
                if let Err(cleanup) = self.storage.delete(&storage_key).await {
                    tracing::warn!(key = %storage_key, error = %cleanup, "Failed to remove orphaned upload");
                }
                Err(e)
            }
        }
    }

    async fn insert_version(
        &self,
        user_id: Uuid,
        new_version: &NewDocumentVersion,
    ) -> Result<DocumentVersion> {
        let mut tx = self.db.begin().await?;

        let document = self
            .document_repo
            .find_for_update(&mut *tx, new_version.document_id)
            .await?;
        if document.is_trashed() {
            return Err(DocumentError::Conflict(
                "Cannot upload to a document in the trash".to_string(),
            ));
        }

        let version_number = document.version_seq + 1;
        let version = self
            .version_repo
            .create(&mut *tx, new_version, version_number)
            .await?;

        self.document_repo
            .advance_version(&mut *tx, document.id, version_number)
            .await?;

        self.audit
            .record(
                &mut *tx,
                CreateAuditLog::new(document.organization_id, AuditAction::Updated)
                    .document(document.id)
                    .user(user_id)
                    .details(json!({
                        "version": version_number,
                        "file_name": version.file_name,
                    })),
            )
            .await?;

        tx.commit().await?;
        Ok(version)
    }

    /// Versions of a live document, newest first
    pub async fn list(&self, user_id: Uuid, document_id: Uuid) -> Result<Vec<DocumentVersion>> {
        let document = self.document_repo.find_by_id(document_id).await?;
        self.authorize_live(user_id, &document, Permission::View).await?;

        Ok(self.version_repo.list_by_document(document_id).await?)
    }

    pub async fn get(&self, user_id: Uuid, version_id: Uuid) -> Result<DocumentVersion> {
        let version = self.version_repo.find_by_id(version_id).await?;
        let document = self.document_repo.find_by_id(version.document_id).await?;
        self.authorize_live(user_id, &document, Permission::View).await?;

        Ok(version)
    }

    /// Version metadata together with its stored bytes
    pub async fn download(
        &self,
        user_id: Uuid,
        version_id: Uuid,
    ) -> Result<(DocumentVersion, Vec<u8>)> {
        let version = self.get(user_id, version_id).await?;
        let content = self.storage.get(&version.storage_key).await?;

        Ok((version, content))
    }

    /// Delete one version; the last remaining version of a document cannot go
    pub async fn delete(&self, user_id: Uuid, version_id: Uuid) -> Result<()> {
        let version = self.version_repo.find_by_id(version_id).await?;
        let document = self.document_repo.find_by_id(version.document_id).await?;
        self.guard
            .authorize(user_id, document.organization_id, Permission::Edit)
            .await?;

        let mut tx = self.db.begin().await?;
        let document = self
            .document_repo
            .find_for_update(&mut *tx, document.id)
            .await?;
        if document.is_trashed() {
            return Err(DocumentError::Conflict(
                "Cannot change versions of a document in the trash".to_string(),
            ));
        }

        let remaining = self
            .version_repo
            .count_by_document(&mut *tx, document.id)
            .await?;
        if remaining <= 1 {
            return Err(DocumentError::Conflict(
                "Cannot delete the only version of a document".to_string(),
            ));
        }

        if !self.version_repo.delete(&mut *tx, version.id).await? {
            return Err(DocumentError::NotFound("Document version not found".to_string()));
        }

        if document.current_version == version.version_number {
            let latest = self.version_repo.max_version(&mut *tx, document.id).await?;
            self.document_repo
                .set_current_version(&mut *tx, document.id, latest)
                .await?;
        }

        self.audit
            .record(
                &mut *tx,
                CreateAuditLog::new(document.organization_id, AuditAction::Updated)
                    .document(document.id)
                    .user(user_id)
                    .details(json!({ "deleted_version": version.version_number })),
            )
            .await?;
        tx.commit().await?;

        if let Err(e) = self.storage.delete(&version.storage_key).await {
            tracing::warn!(key = %version.storage_key, error = %e, "Failed to remove stored blob");
        }

        tracing::info!(
            document_id = %document.id,
            version = version.version_number,
            user_id = %user_id,
            "Version deleted"
        );
        Ok(())
    }

    async fn authorize_live(
        &self,
        user_id: Uuid,
        document: &Document,
        permission: Permission,
    ) -> Result<()> {
        self.guard
            .authorize(user_id, document.organization_id, permission)
            .await?;

        if document.is_trashed() {
            return Err(DocumentError::NotFound("Document not found".to_string()));
        }

        Ok(())
    }
}

/// Decode base64 upload content and enforce the size limit
fn decode_content(encoded: &str, max_bytes: usize) -> Result<Vec<u8>> {
    // base64 inflates by 4/3; reject obviously oversized input before decoding
    if encoded.len() / 4 * 3 > max_bytes + 3 {
        return Err(too_large(max_bytes));
    }

    let content = STANDARD
        .decode(encoded.trim())
        .map_err(|_| DocumentError::BadRequest("Content is not valid base64".to_string()))?;

    if content.len() > max_bytes {
        return Err(too_large(max_bytes));
    }

    Ok(content)
}

fn too_large(max_bytes: usize) -> DocumentError {
    DocumentError::BadRequest(format!("Content exceeds the maximum size of {} bytes", max_bytes))
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixture;
    use docvault_models::OrganizationType;

    #[test]
    fn test_decode_content() {
        let encoded = STANDARD.encode(b"quarterly numbers");
        assert_eq!(decode_content(&encoded, 1024).unwrap(), b"quarterly numbers");
    }

    #[test]
    fn test_decode_rejects_invalid_base64() {
        assert!(matches!(
            decode_content("not base64!!", 1024),
            Err(DocumentError::BadRequest(_))
        ));
    }

    #[test]
    fn test_decode_enforces_limit() {
        let encoded = STANDARD.encode(vec![0u8; 11]);
        assert!(matches!(decode_content(&encoded, 10), Err(DocumentError::BadRequest(_))));
        assert_eq!(decode_content(&encoded, 11).unwrap().len(), 11);

        let huge = "A".repeat(4000);
        assert!(matches!(decode_content(&huge, 10), Err(DocumentError::BadRequest(_))));
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    #[ignore] // Only run with database available
    async fn test_version_numbers_are_never_reused() {
        let f = fixture().await;
        let owner = f.user().await.id;
        let org_id = f.organization(owner, OrganizationType::Collaborative).await;
        let document = f.document(owner, org_id).await;

        let v1 = f.upload(owner, document.id, b"first").await;
        assert!(matches!(
            f.versions.delete(owner, v1.id).await,
            Err(DocumentError::Conflict(_))
        ));

        let v2 = f.upload(owner, document.id, b"second").await;
        assert_eq!((v1.version_number, v2.version_number), (1, 2));

        // Deleting the current version falls back to the newest remaining one
        f.versions.delete(owner, v2.id).await.unwrap();
        assert_eq!(f.documents.get(owner, document.id).await.unwrap().current_version, 1);

        let v3 = f.upload(owner, document.id, b"third").await;
        assert_eq!(v3.version_number, 3);
        assert_eq!(f.documents.get(owner, document.id).await.unwrap().current_version, 3);

        // Deleting an older version leaves the current one alone
        f.versions.delete(owner, v1.id).await.unwrap();
        assert_eq!(f.documents.get(owner, document.id).await.unwrap().current_version, 3);

        let remaining: Vec<i32> = f
            .versions
            .list(owner, document.id)
            .await
            .unwrap()
            .iter()
            .map(|v| v.version_number)
            .collect();
        assert_eq!(remaining, vec![3]);

        let (version, content) = f.versions.download(owner, v3.id).await.unwrap();
        assert_eq!(content, b"third");
        assert_eq!(version.checksum, sha256_hex(b"third"));

        f.organizations.delete(owner, org_id).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Only run with database available
    async fn test_trashed_documents_freeze_versions() {
        let f = fixture().await;
        let owner = f.user().await.id;
        let org_id = f.organization(owner, OrganizationType::Collaborative).await;
        let document = f.document(owner, org_id).await;
        let v1 = f.upload(owner, document.id, b"first").await;
        let v2 = f.upload(owner, document.id, b"second").await;

        f.documents.trash(owner, document.id).await.unwrap();

        let upload = f
            .versions
            .upload(
                owner,
                UploadVersion {
                    document_id: document.id,
                    file_name: "plan.txt".to_string(),
                    mime_type: "text/plain".to_string(),
                    content: STANDARD.encode(b"third"),
                    comment: None,
                },
            )
            .await;
        assert!(matches!(upload, Err(DocumentError::Conflict(_))));
        assert!(matches!(
            f.versions.delete(owner, v1.id).await,
            Err(DocumentError::Conflict(_))
        ));
        assert!(matches!(
            f.versions.list(owner, document.id).await,
            Err(DocumentError::NotFound(_))
        ));
        assert!(matches!(
            f.versions.download(owner, v2.id).await,
            Err(DocumentError::NotFound(_))
        ));

        f.organizations.delete(owner, org_id).await.unwrap();
    }
}
