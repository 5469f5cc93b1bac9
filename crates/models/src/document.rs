use crate::validation::not_blank;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A logical file owned by an organization
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_by: Uuid,
    pub current_version: i32,

    /// Highest version number ever assigned; numbers are never reused
    #[serde(skip_serializing)]
    pub version_seq: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    // Trash
    pub trashed_at: Option<DateTime<Utc>>,
    pub trashed_by: Option<Uuid>,
}

impl Document {
    pub fn is_trashed(&self) -> bool {
        self.trashed_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateDocument {
    pub organization_id: Uuid,

    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub title: String,

    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateDocument {
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub title: Option<String>,

    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

impl UpdateDocument {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }

    /// Strip surrounding whitespace from the title before it is stored
    pub fn normalize(&mut self) {
        if let Some(title) = self.title.as_mut() {
            *title = title.trim().to_string();
        }
    }

    /// Names of the fields this update touches, for audit details
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push("title");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_fields() {
        let update = UpdateDocument {
            title: Some("Q3 report".to_string()),
            description: None,
        };
        assert_eq!(update.changed_fields(), vec!["title"]);
        assert!(!update.is_empty());

        let empty = UpdateDocument {
            title: None,
            description: None,
        };
        assert!(empty.is_empty());
        assert!(empty.changed_fields().is_empty());
    }

    #[test]
    fn test_title_length_rules() {
        let request = CreateDocument {
            organization_id: Uuid::new_v4(),
            title: "x".repeat(256),
            description: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_blank_title_rejected() {
        let request = CreateDocument {
            organization_id: Uuid::new_v4(),
            title: "   ".to_string(),
            description: None,
        };
        assert!(request.validate().is_err());

        let update = UpdateDocument {
            title: Some(" \t ".to_string()),
            description: None,
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_update_title_is_trimmed() {
        let mut update = UpdateDocument {
            title: Some("  Q3 report ".to_string()),
            description: Some(" kept as is ".to_string()),
        };
        assert!(update.validate().is_ok());
        update.normalize();
        assert_eq!(update.title.as_deref(), Some("Q3 report"));
        assert_eq!(update.description.as_deref(), Some(" kept as is "));
    }
}
