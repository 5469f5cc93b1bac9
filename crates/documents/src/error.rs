use docvault_authz::AuthzError;
use docvault_database::DatabaseError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DocumentError>;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(DatabaseError),
}

impl From<DatabaseError> for DocumentError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => DocumentError::NotFound(msg),
            DatabaseError::DuplicateEntry(msg) => DocumentError::Conflict(msg),
            DatabaseError::ConstraintViolation(msg) => DocumentError::BadRequest(msg),
            other => DocumentError::Database(other),
        }
    }
}

impl From<sqlx::Error> for DocumentError {
    fn from(err: sqlx::Error) -> Self {
        DocumentError::Database(DatabaseError::ConnectionError(err))
    }
}

impl From<AuthzError> for DocumentError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotFound(msg) => DocumentError::NotFound(msg),
            AuthzError::PermissionDenied(msg) => DocumentError::Forbidden(msg),
            AuthzError::Database(err) => err.into(),
        }
    }
}

impl From<validator::ValidationErrors> for DocumentError {
    fn from(err: validator::ValidationErrors) -> Self {
        DocumentError::ValidationError(err.to_string())
    }
}

impl From<std::io::Error> for DocumentError {
    fn from(err: std::io::Error) -> Self {
        DocumentError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_errors_map_to_domain_errors() {
        let err: DocumentError = DatabaseError::not_found("Document", "1").into();
        assert!(matches!(err, DocumentError::NotFound(_)));

        let err: DocumentError = DatabaseError::duplicate("Membership", "this user").into();
        assert!(matches!(err, DocumentError::Conflict(_)));

        let err: DocumentError = DatabaseError::Other("boom".to_string()).into();
        assert!(matches!(err, DocumentError::Database(_)));
    }

    #[test]
    fn test_authz_errors_map_to_domain_errors() {
        let err: DocumentError = AuthzError::PermissionDenied("nope".to_string()).into();
        assert!(matches!(err, DocumentError::Forbidden(_)));

        let err: DocumentError = AuthzError::NotFound("Organization not found".to_string()).into();
        assert!(matches!(err, DocumentError::NotFound(_)));
    }
}
