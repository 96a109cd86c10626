//! File record entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A metadata index row mirroring select attributes of one physical file or
/// directory entry, keyed by normalized path.
///
/// Absence of a row for an existing physical file is tolerated (lazily
/// backfillable); a row with no backing physical file is stale and reads
/// as not-found at the service layer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FileRecord {
    /// Normalized path (primary key).
    pub path: String,
    /// The user who uploaded the item, if known.
    pub uploader_id: Option<i64>,
    /// When the item was uploaded.
    pub uploaded_at: Option<DateTime<Utc>>,
    /// Size in bytes at upload time.
    pub size_bytes: i64,
    /// Read-time access counter.
    pub access_count: i64,
    /// Last access timestamp.
    pub last_access: Option<DateTime<Utc>>,
}
