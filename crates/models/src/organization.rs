use crate::organization_user::OrganizationRole;
use crate::validation::not_blank;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Tenant grouping of users and documents
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub organization_type: OrganizationType,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Organization as seen by one of its members
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrganizationWithRole {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub organization: Organization,
    pub role: OrganizationRole,
}

/// Create new organization request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrganization {
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub name: String,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[serde(default, rename = "type")]
    pub organization_type: OrganizationType,
}

/// Update organization request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateOrganization {
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub name: Option<String>,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[serde(rename = "type")]
    pub organization_type: Option<OrganizationType>,
}

impl UpdateOrganization {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.organization_type.is_none()
    }

    pub fn normalize(&mut self) {
        if let Some(name) = self.name.as_mut() {
            *name = name.trim().to_string();
        }
    }
}

/// An individual organization belongs to one user; a collaborative one can be shared
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrganizationType {
    Individual,
    Collaborative,
}

impl Default for OrganizationType {
    fn default() -> Self {
        OrganizationType::Collaborative
    }
}

impl std::fmt::Display for OrganizationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrganizationType::Individual => write!(f, "individual"),
            OrganizationType::Collaborative => write!(f, "collaborative"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_organization_defaults_to_collaborative() {
        let request: CreateOrganization =
            serde_json::from_str(r#"{"name": "Acme"}"#).unwrap();
        assert_eq!(request.organization_type, OrganizationType::Collaborative);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_organization_type_field() {
        let request: CreateOrganization =
            serde_json::from_str(r#"{"name": "Mine", "type": "individual"}"#).unwrap();
        assert_eq!(request.organization_type, OrganizationType::Individual);
    }

    #[test]
    fn test_empty_name_rejected() {
        let request: CreateOrganization = serde_json::from_str(r#"{"name": ""}"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_blank_name_rejected() {
        let request: CreateOrganization = serde_json::from_str(r#"{"name": "   "}"#).unwrap();
        assert!(request.validate().is_err());

        let update: UpdateOrganization = serde_json::from_str(r#"{"name": "  "}"#).unwrap();
        assert!(update.validate().is_err());

        let mut update: UpdateOrganization =
            serde_json::from_str(r#"{"name": " Acme Legal "}"#).unwrap();
        assert!(update.validate().is_ok());
        update.normalize();
        assert_eq!(update.name.as_deref(), Some("Acme Legal"));
    }

    #[test]
    fn test_update_is_empty() {
        let update: UpdateOrganization = serde_json::from_str("{}").unwrap();
        assert!(update.is_empty());

        let update: UpdateOrganization =
            serde_json::from_str(r#"{"description": "docs"}"#).unwrap();
        assert!(!update.is_empty());
    }
}
