use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// One uploaded revision of a document
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentVersion {
    pub id: Uuid,
    pub document_id: Uuid,
    pub version_number: i32,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub checksum: String,

    #[serde(skip_serializing)]
    pub storage_key: String,

    pub comment: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Upload request; `content` is the file body in standard base64
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UploadVersion {
    pub document_id: Uuid,

    #[validate(custom(function = "validate_file_name"))]
    pub file_name: String,

    #[validate(length(min = 1, max = 255))]
    pub mime_type: String,

    pub content: String,

    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

/// Row values for a version insert
#[derive(Debug, Clone)]
pub struct NewDocumentVersion {
    pub id: Uuid,
    pub document_id: Uuid,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub checksum: String,
    pub storage_key: String,
    pub comment: Option<String>,
    pub created_by: Uuid,
}

lazy_static::lazy_static! {
    static ref FILE_NAME_REGEX: regex::Regex = regex::Regex::new(r"^[^/\\\x00]{1,255}$").unwrap();
}

/// File names are display metadata only, but must not look like paths
pub fn validate_file_name(name: &str) -> Result<(), ValidationError> {
    if name == "." || name == ".." || !FILE_NAME_REGEX.is_match(name) {
        return Err(ValidationError::new("invalid_file_name"));
    }
    Ok(())
}
