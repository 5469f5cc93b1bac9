use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Membership of a user in an organization
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrganizationUser {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub role: OrganizationRole,
    pub invite_accepted: bool,
    pub invited_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Organization-scoped role.
///
/// Variants are declared from least to most privileged so the derived
/// ordering reads `Read < Write < Owner`.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrganizationRole {
    Read,
    Write,
    Owner,
}

impl OrganizationRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationRole::Read => "read",
            OrganizationRole::Write => "write",
            OrganizationRole::Owner => "owner",
        }
    }
}

impl std::fmt::Display for OrganizationRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrganizationRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "read" => Ok(OrganizationRole::Read),
            "write" => Ok(OrganizationRole::Write),
            "owner" => Ok(OrganizationRole::Owner),
            other => Err(format!(
                "Invalid role: {}. Must be one of: owner, write, read",
                other
            )),
        }
    }
}

/// Request to invite a user into an organization
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddOrganizationUser {
    pub organization_id: Uuid,

    #[validate(email)]
    pub email: String,

    pub role: OrganizationRole,
}

/// Request to update a member's role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMemberRole {
    pub role: OrganizationRole,
}

/// Membership with user details
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrganizationUserWithUser {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub role: OrganizationRole,
    pub invite_accepted: bool,
    pub invited_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,

    // User details
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Invitation still waiting for the invitee's answer
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PendingInvitation {
    pub organization_id: Uuid,
    pub organization_name: String,
    pub role: OrganizationRole,
    pub invited_by: Option<Uuid>,
    pub invited_by_email: Option<String>,
    pub created_at: DateTime<Utc>,
}
