//! Reconciliation between the metadata index and the physical tree.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use orgdrive_core::result::AppResult;
use orgdrive_core::traits::storage::StorageGateway;
use orgdrive_core::types::path::CanonicalPath;
use orgdrive_database::repositories::file_record::FileRecordRepository;

/// Outcome of a reconciliation pass.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    /// Index rows examined.
    pub scanned: u64,
    /// Paths whose index row has no backing physical item.
    pub stale: Vec<String>,
    /// Rows removed (only in fix mode).
    pub removed: u64,
}

/// Finds the drift that `InconsistentState` errors point at: index rows
/// whose backing physical item is gone. The physical tree is authoritative,
/// so reconciliation only ever removes index rows, never files.
#[derive(Debug, Clone)]
pub struct MaintenanceService {
    /// Storage gateway.
    gateway: Arc<dyn StorageGateway>,
    /// Metadata index repository.
    file_repo: Arc<FileRecordRepository>,
}

impl MaintenanceService {
    /// Creates a new maintenance service.
    pub fn new(gateway: Arc<dyn StorageGateway>, file_repo: Arc<FileRecordRepository>) -> Self {
        Self { gateway, file_repo }
    }

    /// Scan every index row and report the stale ones; with `fix` set,
    /// delete them as well.
    pub async fn reconcile(&self, fix: bool) -> AppResult<ReconcileReport> {
        let paths = self.file_repo.list_paths().await?;
        let mut report = ReconcileReport {
            scanned: 0,
            stale: Vec::new(),
            removed: 0,
        };

        for path in paths {
            report.scanned += 1;
            let canonical = CanonicalPath::parse(&path);
            let exists = match self.gateway.exists(&canonical).await {
                Ok(exists) => exists,
                // A row whose path cannot even resolve under the root is
                // stale by definition.
                Err(e) => {
                    warn!(path = %path, error = %e, "Index row path failed to resolve");
                    false
                }
            };
            if exists {
                continue;
            }

            warn!(path = %path, "Index row has no backing physical item");
            if fix && self.file_repo.delete_path(&path).await? {
                report.removed += 1;
            }
            report.stale.push(path);
        }

        info!(
            scanned = report.scanned,
            stale = report.stale.len(),
            removed = report.removed,
            "Reconciliation pass complete"
        );
        Ok(report)
    }
}
