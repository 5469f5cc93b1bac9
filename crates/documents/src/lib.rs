pub mod audit_service;
pub mod document_service;
pub mod error;
pub mod organization_service;
pub mod storage;
pub mod version_service;

#[cfg(test)]
mod test_support;

pub use audit_service::{AuditLogPage, AuditService};
pub use document_service::DocumentService;
pub use error::{DocumentError, Result};
pub use organization_service::OrganizationService;
pub use storage::{version_storage_key, LocalStorage, Storage};
pub use version_service::{VersionService, DEFAULT_MAX_UPLOAD_BYTES};
