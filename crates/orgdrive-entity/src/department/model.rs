//! Department entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An organizational department.
///
/// The canonical name doubles as the physical top-level folder name; the
/// short code is an externally-facing alias accepted interchangeably with
/// the legacy localized name in incoming paths. Every department has exactly
/// one canonical physical folder, created lazily if absent.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Department {
    /// Unique department identifier.
    pub id: i64,
    /// Canonical name, e.g. `"市场部 (MS)"`.
    pub canonical_name: String,
    /// Short alias code, e.g. `"MS"`.
    pub short_code: String,
}

impl Department {
    /// The legacy localized name: the canonical name minus its ` (CODE)`
    /// suffix, if it carries one.
    pub fn legacy_name(&self) -> Option<&str> {
        self.canonical_name
            .strip_suffix(&format!(" ({})", self.short_code))
    }
}
