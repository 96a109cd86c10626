//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use orgdrive_core::CanonicalPath;

use super::role::Role;

/// Top-level bucket holding personal folders (`Members/<username>`).
pub const MEMBERS_BUCKET: &str = "Members";

/// An authenticated identity in the OrgDrive system.
///
/// Looked up fresh from the identity store at the start of every request;
/// immutable for the duration of that request.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: i64,
    /// Unique login name.
    pub username: String,
    /// User role.
    pub role: Role,
    /// Department the user belongs to, if any.
    pub department_id: Option<i64>,
    /// Canonical department name (joined in from the department table).
    pub department_name: Option<String>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Check if this user has admin privileges.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// The user's personal folder under the top-level Members bucket.
    pub fn personal_space(&self) -> CanonicalPath {
        CanonicalPath::from_segments([MEMBERS_BUCKET, self.username.as_str()])
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Desired username.
    pub username: String,
    /// Assigned role.
    pub role: Role,
    /// Department to place the user in, if any.
    pub department_id: Option<i64>,
}
