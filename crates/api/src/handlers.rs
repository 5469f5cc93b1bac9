pub mod audit;
pub mod auth;
pub mod documents;
pub mod error;
pub mod health;
pub mod organizations;
pub mod users;
pub mod versions;

// Re-export common types
pub use error::{ApiResult, ErrorResponse};
