//! Database-backed fixture shared by the service tests

use crate::audit_service::AuditService;
use crate::document_service::DocumentService;
use crate::organization_service::OrganizationService;
use crate::storage::{LocalStorage, Storage};
use crate::version_service::VersionService;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use docvault_authz::AccessGuard;
use docvault_database::{Database, DatabaseConfig, UserRepository};
use docvault_models::{
    AddOrganizationUser, CreateDocument, CreateOrganization, Document, DocumentVersion,
    OrganizationRole, OrganizationType, UploadVersion, User,
};
use std::sync::Arc;
use uuid::Uuid;

pub struct Fixture {
    pub db: Database,
    pub organizations: OrganizationService,
    pub documents: DocumentService,
    pub versions: VersionService,
    pub audit: AuditService,
}

pub async fn fixture() -> Fixture {
    let db = Database::new(DatabaseConfig::from_env())
        .await
        .expect("Failed to connect to database");
    db.migrate().await.expect("Failed to run migrations");

    let guard = AccessGuard::new(db.pool().clone(), None);
    let storage: Arc<dyn Storage> = Arc::new(LocalStorage::new(
        std::env::temp_dir().join(format!("docvault-test-{}", Uuid::new_v4())),
    ));
    let audit = AuditService::new(&db, guard.clone());

    Fixture {
        organizations: OrganizationService::new(db.clone(), guard.clone(), storage.clone()),
        documents: DocumentService::new(db.clone(), guard.clone(), audit.clone(), storage.clone()),
        versions: VersionService::new(db.clone(), guard, audit.clone(), storage),
        audit,
        db,
    }
}

impl Fixture {
    pub async fn user(&self) -> User {
        let email = format!("{}@example.com", Uuid::new_v4());
        UserRepository::new(self.db.pool().clone())
            .create(self.db.pool(), &email, "not-a-real-hash", Some("Test"), None)
            .await
            .expect("Failed to create user")
    }

    pub async fn organization(&self, owner: Uuid, organization_type: OrganizationType) -> Uuid {
        self.organizations
            .create(
                owner,
                CreateOrganization {
                    name: format!("Org {}", Uuid::new_v4()),
                    description: None,
                    organization_type,
                },
            )
            .await
            .expect("Failed to create organization")
            .organization
            .id
    }

    /// Invite `member` and, when `accept` is set, accept on their behalf
    pub async fn invite(
        &self,
        owner: Uuid,
        organization_id: Uuid,
        member: &User,
        role: OrganizationRole,
        accept: bool,
    ) {
        self.organizations
            .add_user(
                owner,
                AddOrganizationUser {
                    organization_id,
                    email: member.email.clone(),
                    role,
                },
            )
            .await
            .expect("Failed to invite user");

        if accept {
            self.organizations
                .accept_invitation(member.id, organization_id)
                .await
                .expect("Failed to accept invitation");
        }
    }

    pub async fn document(&self, user_id: Uuid, organization_id: Uuid) -> Document {
        self.documents
            .create(
                user_id,
                CreateDocument {
                    organization_id,
                    title: "Plan".to_string(),
                    description: None,
                },
            )
            .await
            .expect("Failed to create document")
    }

    pub async fn upload(&self, user_id: Uuid, document_id: Uuid, body: &[u8]) -> DocumentVersion {
        self.versions
            .upload(
                user_id,
                UploadVersion {
                    document_id,
                    file_name: "plan.txt".to_string(),
                    mime_type: "text/plain".to_string(),
                    content: STANDARD.encode(body),
                    comment: None,
                },
            )
            .await
            .expect("Failed to upload version")
    }
}
