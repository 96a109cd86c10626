//! Soft-delete orchestration: quarantine moves, restore, and purge.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{Duration, Utc};
use tracing::{error, info, warn};

use orgdrive_auth::normalizer::PathNormalizer;
use orgdrive_auth::policy::PolicyEvaluator;
use orgdrive_core::config::storage::StorageConfig;
use orgdrive_core::error::{AppError, ErrorKind};
use orgdrive_core::result::AppResult;
use orgdrive_core::traits::storage::StorageGateway;
use orgdrive_core::types::path::CanonicalPath;
use orgdrive_database::repositories::recycle::RecycleRepository;
use orgdrive_entity::grant::AccessLevel;
use orgdrive_entity::recycle::{CreateRecycleEntry, RecycleEntry};

use crate::QUARANTINE_DIR;
use crate::context::RequestContext;

/// Last token handed out, in microseconds. Tokens are strictly increasing
/// even when the clock stalls or steps backwards, so two same-named
/// deletions can never collide in the flat quarantine namespace.
static LAST_TOKEN: AtomicI64 = AtomicI64::new(0);

fn next_delete_token() -> i64 {
    let now_micros = Utc::now().timestamp_micros();
    let prev = LAST_TOKEN
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(if now_micros > last { now_micros } else { last + 1 })
        })
        .unwrap_or_else(|prev| prev);
    if now_micros > prev { now_micros } else { prev + 1 }
}

/// Orchestrates soft-delete: physical move into quarantine first, database
/// bookkeeping second. The move is the commit point; a bookkeeping failure
/// after it surfaces as `InconsistentState`, never as success.
#[derive(Debug, Clone)]
pub struct RecycleService {
    /// Storage gateway.
    gateway: Arc<dyn StorageGateway>,
    /// Recycle entry repository.
    recycle_repo: Arc<RecycleRepository>,
    /// Policy evaluator.
    evaluator: Arc<PolicyEvaluator>,
    /// Path normalizer.
    normalizer: Arc<PathNormalizer>,
    /// Storage configuration (retention window).
    config: StorageConfig,
}

impl RecycleService {
    /// Creates a new recycle service.
    pub fn new(
        gateway: Arc<dyn StorageGateway>,
        recycle_repo: Arc<RecycleRepository>,
        evaluator: Arc<PolicyEvaluator>,
        normalizer: Arc<PathNormalizer>,
        config: StorageConfig,
    ) -> Self {
        Self {
            gateway,
            recycle_repo,
            evaluator,
            normalizer,
            config,
        }
    }

    /// Soft-delete an item: move it into quarantine and record provenance.
    ///
    /// Of two concurrent deletions of the same path, exactly one wins; the
    /// loser observes `NotFound` once the item is gone. The filesystem is
    /// the single source of truth for existence.
    pub async fn soft_delete(
        &self,
        ctx: &RequestContext,
        raw_path: &str,
    ) -> AppResult<RecycleEntry> {
        let path = self.normalizer.normalize(raw_path);
        if path.is_root() {
            return Err(AppError::validation("Cannot delete the storage root"));
        }
        self.evaluator
            .require(&ctx.user, &path, AccessLevel::Full)
            .await?;

        // Do not record entries for items that do not physically exist.
        let meta = self.gateway.stat(&path).await?;

        let name = meta.name.clone();
        let quarantine_name = format!("{}_{name}", next_delete_token());
        let quarantine_path =
            CanonicalPath::from_segments([QUARANTINE_DIR, quarantine_name.as_str()]);

        self.gateway
            .move_item(&path, &quarantine_path, false)
            .await?;

        // The move is the commit point. From here on, bookkeeping failure
        // leaves an orphaned quarantine item and must be surfaced loudly
        // for the operator reconciliation pass, never reported as success.
        let entry = self
            .recycle_repo
            .record_soft_delete(CreateRecycleEntry {
                name: name.clone(),
                original_path: path.as_str().to_string(),
                quarantine_name: quarantine_name.clone(),
                deleted_at: Utc::now(),
                actor_id: ctx.user.id,
                is_directory: meta.is_directory,
            })
            .await
            .map_err(|e| {
                error!(
                    path = %path,
                    quarantine_name = %quarantine_name,
                    error = %e,
                    "Item quarantined but bookkeeping failed; stores disagree"
                );
                AppError::with_source(
                    ErrorKind::InconsistentState,
                    format!(
                        "'{path}' was quarantined as '{quarantine_name}' but its \
                         recycle entry could not be recorded"
                    ),
                    e,
                )
            })?;

        info!(path = %path, entry_id = entry.id, actor = %ctx.user.username, "Item soft-deleted");
        Ok(entry)
    }

    /// Restore a quarantined item to its original path.
    ///
    /// Fails with `AlreadyExists` rather than overwriting a conflicting
    /// item that has since appeared at the original location.
    pub async fn restore(&self, ctx: &RequestContext, entry_id: i64) -> AppResult<CanonicalPath> {
        let entry = self.require_entry_access(ctx, entry_id).await?;

        let original = CanonicalPath::parse(&entry.original_path);
        let quarantine_path =
            CanonicalPath::from_segments([QUARANTINE_DIR, entry.quarantine_name.as_str()]);

        if self.gateway.exists(&original).await? {
            return Err(AppError::already_exists(format!(
                "Cannot restore '{}': an item already exists at '{original}'",
                entry.name
            )));
        }

        if let Some(parent) = original.parent() {
            if !parent.is_root() {
                self.gateway.ensure_dir(&parent).await?;
            }
        }

        self.gateway
            .move_item(&quarantine_path, &original, false)
            .await?;

        if !self.recycle_repo.delete(entry.id).await.map_err(|e| {
            error!(entry_id = entry.id, error = %e, "Item restored but entry removal failed");
            AppError::with_source(
                ErrorKind::InconsistentState,
                format!(
                    "'{original}' was restored but recycle entry {} could not be closed",
                    entry.id
                ),
                e,
            )
        })? {
            // The row vanished under us; the restore itself still stands.
            warn!(entry_id = entry.id, "Recycle entry was already closed");
        }

        info!(path = %original, entry_id = entry.id, "Item restored from quarantine");
        Ok(original)
    }

    /// Permanently remove a quarantined item and close its entry.
    /// Irreversible.
    pub async fn purge(&self, ctx: &RequestContext, entry_id: i64) -> AppResult<()> {
        let entry = self.require_entry_access(ctx, entry_id).await?;

        let quarantine_path =
            CanonicalPath::from_segments([QUARANTINE_DIR, entry.quarantine_name.as_str()]);
        match self.gateway.remove(&quarantine_path).await {
            Ok(()) => {}
            // Physical item already gone; still close the entry.
            Err(e) if e.kind == ErrorKind::NotFound => {
                warn!(entry_id = entry.id, "Quarantined item already absent during purge");
            }
            Err(e) => return Err(e),
        }

        self.recycle_repo.delete(entry.id).await?;
        info!(entry_id = entry.id, name = %entry.name, "Quarantined item purged");
        Ok(())
    }

    /// List quarantine entries visible to the caller: everything for
    /// admins, otherwise entries whose original path the caller may read.
    pub async fn list(&self, ctx: &RequestContext) -> AppResult<Vec<RecycleEntry>> {
        let entries = self.recycle_repo.list_all().await?;
        if ctx.is_admin() {
            return Ok(entries);
        }

        let mut visible = Vec::new();
        for entry in entries {
            let original = CanonicalPath::parse(&entry.original_path);
            if self
                .evaluator
                .authorize(&ctx.user, &original, AccessLevel::Read)
                .await?
            {
                visible.push(entry);
            }
        }
        Ok(visible)
    }

    /// Retention sweep: permanently purge entries older than the configured
    /// window. Failures on individual items are logged and skipped so one
    /// stuck item cannot wedge the sweep. Returns the number purged.
    pub async fn purge_expired(&self) -> AppResult<u64> {
        let cutoff = Utc::now() - Duration::days(i64::from(self.config.recycle_retention_days));
        let expired = self.recycle_repo.list_older_than(cutoff).await?;

        let mut purged = 0u64;
        for entry in expired {
            let quarantine_path =
                CanonicalPath::from_segments([QUARANTINE_DIR, entry.quarantine_name.as_str()]);
            match self.gateway.remove(&quarantine_path).await {
                Ok(()) => {}
                Err(e) if e.kind == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(entry_id = entry.id, error = %e, "Failed to purge expired item");
                    continue;
                }
            }
            if self.recycle_repo.delete(entry.id).await? {
                purged += 1;
                info!(entry_id = entry.id, name = %entry.name, "Expired item purged");
            }
        }
        Ok(purged)
    }

    /// Look up an entry and verify the caller may act on it: the deleting
    /// actor or an admin.
    async fn require_entry_access(
        &self,
        ctx: &RequestContext,
        entry_id: i64,
    ) -> AppResult<RecycleEntry> {
        let entry = self
            .recycle_repo
            .find_by_id(entry_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Recycle entry {entry_id} not found")))?;

        if !ctx.is_admin() && entry.actor_id != ctx.user.id {
            return Err(AppError::denied(format!(
                "Recycle entry {entry_id} belongs to another user"
            )));
        }
        Ok(entry)
    }
}
