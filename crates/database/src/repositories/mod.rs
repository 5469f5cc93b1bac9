pub mod audit;
pub mod document_versions;
pub mod documents;
pub mod organization_users;
pub mod organizations;
pub mod users;
