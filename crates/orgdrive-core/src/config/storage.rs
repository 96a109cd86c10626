//! Storage configuration.

use serde::{Deserialize, Serialize};

/// Top-level storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory under which all canonical paths are resolved.
    /// No operation may escape it.
    #[serde(default = "default_root_path")]
    pub root_path: String,
    /// Days a soft-deleted item stays in quarantine before the retention
    /// sweep purges it permanently.
    #[serde(default = "default_retention_days")]
    pub recycle_retention_days: u32,
    /// Maximum upload size in bytes (default 5 GB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            recycle_retention_days: default_retention_days(),
            max_upload_size_bytes: default_max_upload(),
        }
    }
}

fn default_root_path() -> String {
    "data/storage".to_string()
}

fn default_retention_days() -> u32 {
    30
}

fn default_max_upload() -> u64 {
    5_368_709_120 // 5 GB
}
