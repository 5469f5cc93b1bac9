pub mod audit;
pub mod document;
pub mod document_version;
pub mod organization;
pub mod organization_user;
pub mod user;
pub mod validation;

// Re-export commonly used types
pub use audit::{AuditAction, AuditLog, AuditLogQuery, CreateAuditLog};
pub use document::{CreateDocument, Document, UpdateDocument};
pub use document_version::{
    validate_file_name, DocumentVersion, NewDocumentVersion, UploadVersion,
};
pub use organization::{
    CreateOrganization, Organization, OrganizationType, OrganizationWithRole, UpdateOrganization,
};
pub use organization_user::{
    AddOrganizationUser, OrganizationRole, OrganizationUser, OrganizationUserWithUser,
    PendingInvitation, UpdateMemberRole,
};
pub use user::{ChangePassword, NewUser, UpdateUser, User, UserProfile};
