//! Recycle entry entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Provenance record for a soft-deleted item sitting in quarantine.
///
/// Created only after the physical move into quarantine has succeeded.
/// The entry is closed by restore (item moved back) or purge (item removed
/// permanently).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecycleEntry {
    /// Unique entry identifier.
    pub id: i64,
    /// Original file or directory name.
    pub name: String,
    /// Normalized path the item lived at before deletion.
    pub original_path: String,
    /// Collision-free name inside the flat quarantine area
    /// (monotonic token prefix + original name).
    pub quarantine_name: String,
    /// When the item was soft-deleted.
    pub deleted_at: DateTime<Utc>,
    /// The user who deleted the item.
    pub actor_id: i64,
    /// Whether the item is a directory.
    pub is_directory: bool,
}

/// Data recorded when an item enters quarantine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRecycleEntry {
    /// Original file or directory name.
    pub name: String,
    /// Normalized pre-deletion path.
    pub original_path: String,
    /// Quarantine name the item was moved to.
    pub quarantine_name: String,
    /// Deletion timestamp.
    pub deleted_at: DateTime<Utc>,
    /// The deleting user.
    pub actor_id: i64,
    /// Whether the item is a directory.
    pub is_directory: bool,
}
