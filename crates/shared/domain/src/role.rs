//! User roles and the permission table behind them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Fine-grained capability granted by a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "employee:read")]
    EmployeeRead,
    #[serde(rename = "employee:write")]
    EmployeeWrite,
    #[serde(rename = "employee:delete")]
    EmployeeDelete,
    #[serde(rename = "user:read")]
    UserRead,
    #[serde(rename = "user:write")]
    UserWrite,
    #[serde(rename = "user:delete")]
    UserDelete,
    #[serde(rename = "audit:read")]
    AuditRead,
    #[serde(rename = "system:admin")]
    SystemAdmin,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::EmployeeRead => "employee:read",
            Permission::EmployeeWrite => "employee:write",
            Permission::EmployeeDelete => "employee:delete",
            Permission::UserRead => "user:read",
            Permission::UserWrite => "user:write",
            Permission::UserDelete => "user:delete",
            Permission::AuditRead => "audit:read",
            Permission::SystemAdmin => "system:admin",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User roles enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    Manager,
    Viewer,
}

impl UserRole {
    /// Every role, freshly allocated on each call.
    pub fn all() -> Vec<UserRole> {
        vec![UserRole::Admin, UserRole::Manager, UserRole::Viewer]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Manager => "MANAGER",
            UserRole::Viewer => "VIEWER",
        }
    }

    /// Permissions granted to this role.
    pub fn permissions(&self) -> Vec<Permission> {
        use Permission::*;

        match self {
            UserRole::Admin => vec![
                EmployeeRead,
                EmployeeWrite,
                EmployeeDelete,
                UserRead,
                UserWrite,
                UserDelete,
                AuditRead,
                SystemAdmin,
            ],
            UserRole::Manager => vec![EmployeeRead, EmployeeWrite, UserRead, AuditRead],
            UserRole::Viewer => vec![EmployeeRead, AuditRead],
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    pub fn can_access_salary(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Manager)
    }

    pub fn can_manage_users(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    pub fn can_delete_employees(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Every role may read the audit trail.
    pub fn can_view_audit_logs(&self) -> bool {
        true
    }

    /// Parse the wire form (`ADMIN`, `MANAGER`, `VIEWER`).
    pub fn parse(value: &str) -> DomainResult<Self> {
        match value {
            "ADMIN" => Ok(UserRole::Admin),
            "MANAGER" => Ok(UserRole::Manager),
            "VIEWER" => Ok(UserRole::Viewer),
            other => Err(DomainError::InvalidRole(other.to_string())),
        }
    }
}

impl FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
