//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles available in the access-control system.
///
/// Roles are ordered by privilege level: Admin > Lead > Member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full system administrator; bypasses all path-level checks.
    Admin,
    /// Department lead; full access within their own department.
    Lead,
    /// Regular department member; read access to the department tree and
    /// full access to their own personal folder.
    Member,
}

impl Role {
    /// Return the privilege level (higher = more privileged).
    pub fn privilege_level(&self) -> u8 {
        match self {
            Self::Admin => 3,
            Self::Lead => 2,
            Self::Member => 1,
        }
    }

    /// Check if this role has at least the given role's privileges.
    pub fn has_at_least(&self, other: &Role) -> bool {
        self.privilege_level() >= other.privilege_level()
    }

    /// Check if this role is an admin.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Lead => "lead",
            Self::Member => "member",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = orgdrive_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "lead" => Ok(Self::Lead),
            "member" => Ok(Self::Member),
            _ => Err(orgdrive_core::AppError::validation(format!(
                "Invalid role: '{s}'. Expected one of: admin, lead, member"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privilege_ordering() {
        assert!(Role::Admin.has_at_least(&Role::Member));
        assert!(Role::Admin.has_at_least(&Role::Admin));
        assert!(Role::Lead.has_at_least(&Role::Member));
        assert!(!Role::Member.has_at_least(&Role::Lead));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("LEAD".parse::<Role>().unwrap(), Role::Lead);
        assert!("supervisor".parse::<Role>().is_err());
    }
}
