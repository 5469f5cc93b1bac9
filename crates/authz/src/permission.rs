use docvault_models::OrganizationRole;
use serde::{Deserialize, Serialize};

/// What a caller wants to do inside an organization
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Read organization data, documents, versions and document history
    View,
    /// Create and change documents and their versions, use the trash
    Edit,
    /// Administer the organization, its members and permanent deletion
    Manage,
}

impl Permission {
    /// Least privileged role that carries this permission
    pub fn minimum_role(&self) -> OrganizationRole {
        match self {
            Permission::View => OrganizationRole::Read,
            Permission::Edit => OrganizationRole::Write,
            Permission::Manage => OrganizationRole::Owner,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::View => "view",
            Permission::Edit => "edit",
            Permission::Manage => "manage",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait RolePolicy {
    fn grants(&self, permission: Permission) -> bool;
    fn permissions(&self) -> Vec<Permission>;
}

impl RolePolicy for OrganizationRole {
    fn grants(&self, permission: Permission) -> bool {
        *self >= permission.minimum_role()
    }

    fn permissions(&self) -> Vec<Permission> {
        [Permission::View, Permission::Edit, Permission::Manage]
            .into_iter()
            .filter(|p| self.grants(*p))
            .collect()
    }
}
