pub mod connection;
pub mod error;
pub mod repositories;

pub use connection::{Database, DatabaseConfig};
pub use error::{DatabaseError, Result};
pub use repositories::{
    audit::AuditRepository,
    document_versions::DocumentVersionRepository,
    documents::DocumentRepository,
    organization_users::OrganizationUserRepository,
    organizations::OrganizationRepository,
    users::UserRepository,
};
