//! # orgdrive-service
//!
//! Business logic services for OrgDrive: soft deletion and restore, upload
//! ingestion, authorized browsing, department provisioning, grant
//! administration, and operator maintenance.

pub mod browse;
pub mod context;
pub mod grants;
pub mod maintenance;
pub mod provision;
pub mod recycle;
pub mod upload;

/// Reserved top-level quarantine area for soft-deleted items. Dot-prefixed
/// so directory listings never surface it.
pub const QUARANTINE_DIR: &str = ".recycle";

/// Reserved top-level staging area for uploads in flight.
pub const STAGING_DIR: &str = ".staging";
