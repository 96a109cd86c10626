//! Grant entity model and access levels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Access level requested by a caller or conferred by a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Read-only access.
    Read,
    /// Full read/write access, including delete.
    Full,
}

impl AccessLevel {
    /// Whether a grant at this level satisfies a request at `requested`.
    ///
    /// `Full` satisfies either level; `Read` satisfies only `Read`.
    pub fn satisfies(&self, requested: AccessLevel) -> bool {
        match self {
            Self::Full => true,
            Self::Read => requested == Self::Read,
        }
    }

    /// Return the level as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = orgdrive_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "read" => Ok(Self::Read),
            "full" => Ok(Self::Full),
            _ => Err(orgdrive_core::AppError::validation(format!(
                "Invalid access level: '{s}'. Expected 'read' or 'full'"
            ))),
        }
    }
}

/// An explicit, user-specific, optionally time-limited permission record
/// layered on top of department-derived implicit rules.
///
/// `folder_path` is stored in normalized form at creation time so that
/// evaluation never has to re-resolve aliases.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Grant {
    /// Unique grant identifier.
    pub id: i64,
    /// The user this grant applies to.
    pub user_id: i64,
    /// Normalized folder path, no trailing slash.
    pub folder_path: String,
    /// Conferred access level.
    pub access: AccessLevel,
    /// When this grant expires (None = permanent). An expired grant is
    /// inert but stays on record until explicitly revoked.
    pub expires_at: Option<DateTime<Utc>>,
    /// When this grant was created.
    pub created_at: DateTime<Utc>,
}

impl Grant {
    /// Check if this grant has expired relative to `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| exp <= now).unwrap_or(false)
    }
}

/// Data required to create a new grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGrant {
    /// The user to grant access to.
    pub user_id: i64,
    /// Folder path; normalized by the grant service before storage.
    pub folder_path: String,
    /// Conferred access level.
    pub access: AccessLevel,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
}
