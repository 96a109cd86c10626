//! Directory listings merged with metadata index rows, and downloads.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use orgdrive_auth::normalizer::PathNormalizer;
use orgdrive_auth::policy::PolicyEvaluator;
use orgdrive_core::error::AppError;
use orgdrive_core::result::AppResult;
use orgdrive_core::traits::storage::{ByteStream, ItemMeta, StorageGateway};
use orgdrive_core::types::path::CanonicalPath;
use orgdrive_database::repositories::file_record::FileRecordRepository;
use orgdrive_entity::grant::AccessLevel;
use orgdrive_entity::user::MEMBERS_BUCKET;

use crate::context::RequestContext;

/// One listed item: physical metadata plus whatever the index knows.
#[derive(Debug, Clone, Serialize)]
pub struct BrowseItem {
    /// Physical item metadata.
    #[serde(flatten)]
    pub meta: ItemMeta,
    /// Uploader, if the index has a row for this path.
    pub uploader_id: Option<i64>,
    /// Read-time access counter (0 for unindexed items).
    pub access_count: i64,
}

/// A directory listing with the caller's write capability.
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    /// The normalized directory that was listed.
    pub path: CanonicalPath,
    /// Items, directories first.
    pub items: Vec<BrowseItem>,
    /// Whether the caller may write into this directory.
    pub can_write: bool,
}

/// Read-side service: authorized listings and downloads.
#[derive(Debug, Clone)]
pub struct BrowseService {
    /// Storage gateway.
    gateway: Arc<dyn StorageGateway>,
    /// Metadata index repository.
    file_repo: Arc<FileRecordRepository>,
    /// Policy evaluator.
    evaluator: Arc<PolicyEvaluator>,
    /// Path normalizer.
    normalizer: Arc<PathNormalizer>,
}

impl BrowseService {
    /// Creates a new browse service.
    pub fn new(
        gateway: Arc<dyn StorageGateway>,
        file_repo: Arc<FileRecordRepository>,
        evaluator: Arc<PolicyEvaluator>,
        normalizer: Arc<PathNormalizer>,
    ) -> Self {
        Self {
            gateway,
            file_repo,
            evaluator,
            normalizer,
        }
    }

    /// List a directory the caller may read.
    ///
    /// Index rows are merged per item where present; a physical file with
    /// no row lists with zeroed counters (rows are lazily backfillable,
    /// their absence is tolerated).
    pub async fn list(&self, ctx: &RequestContext, raw_path: &str) -> AppResult<Listing> {
        let target = self.resolve_target(ctx, raw_path);
        self.evaluator
            .require(&ctx.user, &target, AccessLevel::Read)
            .await?;

        let entries = self.gateway.list(&target).await?;
        let mut items = Vec::with_capacity(entries.len());
        for meta in entries {
            let record = self.file_repo.find_by_path(meta.path.as_str()).await?;
            items.push(BrowseItem {
                uploader_id: record.as_ref().and_then(|r| r.uploader_id),
                access_count: record.map(|r| r.access_count).unwrap_or(0),
                meta,
            });
        }

        let can_write = self
            .evaluator
            .authorize(&ctx.user, &target, AccessLevel::Full)
            .await?;

        Ok(Listing {
            path: target,
            items,
            can_write,
        })
    }

    /// Open a file for download, bumping its access counter.
    ///
    /// The physical tree decides existence: a stale index row with no
    /// backing file reads as `NotFound`.
    pub async fn download(
        &self,
        ctx: &RequestContext,
        raw_path: &str,
    ) -> AppResult<(ItemMeta, ByteStream)> {
        let path = self.normalizer.normalize(raw_path);
        self.evaluator
            .require(&ctx.user, &path, AccessLevel::Read)
            .await?;

        let meta = self.gateway.stat(&path).await?;
        if meta.is_directory {
            return Err(AppError::validation(format!(
                "'{path}' is a directory, not a file"
            )));
        }

        self.file_repo
            .record_access(path.as_str(), Utc::now())
            .await?;

        let stream = self.gateway.read(&path).await?;
        Ok((meta, stream))
    }

    /// Listing the bare Members bucket redirects non-admins to their own
    /// personal folder.
    fn resolve_target(&self, ctx: &RequestContext, raw_path: &str) -> CanonicalPath {
        let target = self.normalizer.normalize(raw_path);
        if target.as_str() == MEMBERS_BUCKET && !ctx.is_admin() {
            return ctx.user.personal_space();
        }
        target
    }
}
