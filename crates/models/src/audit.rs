use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Document lifecycle action
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
    Trashed,
    Restored,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditAction::Created => write!(f, "created"),
            AuditAction::Updated => write!(f, "updated"),
            AuditAction::Deleted => write!(f, "deleted"),
            AuditAction::Trashed => write!(f, "trashed"),
            AuditAction::Restored => write!(f, "restored"),
        }
    }
}

/// Append-only audit record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLog {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub document_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub action: AuditAction,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditLog {
    pub organization_id: Uuid,
    pub document_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub action: AuditAction,
    pub details: Option<serde_json::Value>,
}

impl CreateAuditLog {
    pub fn new(organization_id: Uuid, action: AuditAction) -> Self {
        Self {
            organization_id,
            document_id: None,
            user_id: None,
            action,
            details: None,
        }
    }

    pub fn document(mut self, document_id: Uuid) -> Self {
        self.document_id = Some(document_id);
        self
    }

    pub fn user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogQuery {
    pub organization_id: Uuid,
    pub action: Option<AuditAction>,
    pub document_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub limit: i64,
    pub offset: i64,
}

impl AuditLogQuery {
    pub const DEFAULT_LIMIT: i64 = 50;
    pub const MAX_LIMIT: i64 = 500;

    pub fn new(organization_id: Uuid) -> Self {
        Self {
            organization_id,
            action: None,
            document_id: None,
            user_id: None,
            from_date: None,
            to_date: None,
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
        }
    }

    /// Clamp paging values into the accepted range
    pub fn with_paging(mut self, limit: Option<i64>, offset: Option<i64>) -> Self {
        self.limit = limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT);
        self.offset = offset.unwrap_or(0).max(0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let org = Uuid::new_v4();
        let doc = Uuid::new_v4();
        let user = Uuid::new_v4();

        let log = CreateAuditLog::new(org, AuditAction::Trashed)
            .document(doc)
            .user(user)
            .details(serde_json::json!({ "title": "Plan" }));

        assert_eq!(log.organization_id, org);
        assert_eq!(log.document_id, Some(doc));
        assert_eq!(log.user_id, Some(user));
        assert_eq!(log.action, AuditAction::Trashed);
        assert_eq!(log.details.unwrap()["title"], "Plan");
    }

    #[test]
    fn test_paging_is_clamped() {
        let query = AuditLogQuery::new(Uuid::new_v4()).with_paging(Some(10_000), Some(-5));
        assert_eq!(query.limit, AuditLogQuery::MAX_LIMIT);
        assert_eq!(query.offset, 0);

        let query = AuditLogQuery::new(Uuid::new_v4()).with_paging(None, None);
        assert_eq!(query.limit, AuditLogQuery::DEFAULT_LIMIT);
    }

    #[test]
    fn test_action_serialization() {
        assert_eq!(
            serde_json::to_string(&AuditAction::Restored).unwrap(),
            "\"restored\""
        );
        assert_eq!(AuditAction::Deleted.to_string(), "deleted");
    }
}
