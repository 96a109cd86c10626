//! Upload ingestion: authorize, stage, move into place, index.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use orgdrive_auth::normalizer::PathNormalizer;
use orgdrive_auth::policy::PolicyEvaluator;
use orgdrive_core::config::storage::StorageConfig;
use orgdrive_core::error::{AppError, ErrorKind};
use orgdrive_core::result::AppResult;
use orgdrive_core::traits::storage::StorageGateway;
use orgdrive_core::types::path::CanonicalPath;
use orgdrive_database::repositories::file_record::FileRecordRepository;
use orgdrive_entity::file_record::FileRecord;
use orgdrive_entity::grant::AccessLevel;
use orgdrive_entity::user::MEMBERS_BUCKET;

use crate::STAGING_DIR;
use crate::context::RequestContext;

/// Validates target-path write authorization, places incoming content via
/// the storage gateway, and registers a metadata index row.
#[derive(Debug, Clone)]
pub struct UploadIngestor {
    /// Storage gateway.
    gateway: Arc<dyn StorageGateway>,
    /// Metadata index repository.
    file_repo: Arc<FileRecordRepository>,
    /// Policy evaluator.
    evaluator: Arc<PolicyEvaluator>,
    /// Path normalizer.
    normalizer: Arc<PathNormalizer>,
    /// Storage configuration (size limit).
    config: StorageConfig,
}

impl UploadIngestor {
    /// Creates a new upload ingestor.
    pub fn new(
        gateway: Arc<dyn StorageGateway>,
        file_repo: Arc<FileRecordRepository>,
        evaluator: Arc<PolicyEvaluator>,
        normalizer: Arc<PathNormalizer>,
        config: StorageConfig,
    ) -> Self {
        Self {
            gateway,
            file_repo,
            evaluator,
            normalizer,
            config,
        }
    }

    /// Accept an incoming file into the target directory.
    ///
    /// Authorization is checked before any byte reaches disk: a rejected
    /// upload leaves no orphan file anywhere. The final name carries a
    /// `YYYYMMDD_` prefix for coarse chronological ordering; this is a
    /// presentation convention, not a uniqueness guarantee. Two uploads of
    /// the same name on the same day to the same folder overwrite, which
    /// is accepted behavior.
    pub async fn accept(
        &self,
        ctx: &RequestContext,
        target_dir: &str,
        file_name: &str,
        data: Bytes,
    ) -> AppResult<FileRecord> {
        if data.len() as u64 > self.config.max_upload_size_bytes {
            return Err(AppError::validation(format!(
                "File exceeds maximum upload size of {} bytes",
                self.config.max_upload_size_bytes
            )));
        }
        let file_name = clean_file_name(file_name)?;

        let target = self.resolve_target(ctx, target_dir);
        self.evaluator
            .require(&ctx.user, &target, AccessLevel::Full)
            .await?;

        let now = Utc::now();
        let dated_name = format!("{}_{file_name}", now.format("%Y%m%d"));
        let final_path = target.join(&dated_name);
        let staging_path =
            CanonicalPath::from_segments([STAGING_DIR, Uuid::new_v4().to_string().as_str()]);

        let size_bytes = data.len() as i64;
        self.gateway.write(&staging_path, data).await?;
        self.gateway.ensure_dir(&target).await?;

        if let Err(e) = self
            .gateway
            .move_item(&staging_path, &final_path, true)
            .await
        {
            let _ = self.gateway.remove(&staging_path).await;
            return Err(e);
        }

        let record = self
            .file_repo
            .upsert_uploaded(final_path.as_str(), ctx.user.id, size_bytes, now)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::InconsistentState,
                    format!("'{final_path}' was stored but its index row could not be written"),
                    e,
                )
            })?;

        info!(
            path = %final_path,
            bytes = size_bytes,
            uploader = %ctx.user.username,
            "Upload accepted"
        );
        Ok(record)
    }

    /// Resolve the upload destination, defaulting to the caller's personal
    /// space for an empty target or (for non-admins) the bare Members
    /// bucket.
    fn resolve_target(&self, ctx: &RequestContext, target_dir: &str) -> CanonicalPath {
        let target = self.normalizer.normalize(target_dir);
        if target.is_root() {
            return ctx.user.personal_space();
        }
        if target.as_str() == MEMBERS_BUCKET && !ctx.is_admin() {
            return ctx.user.personal_space();
        }
        target
    }
}

/// Validate and NFC-fold an incoming file name: exactly one path segment,
/// no traversal.
fn clean_file_name(file_name: &str) -> AppResult<String> {
    let parsed = CanonicalPath::parse(file_name);
    let mut segments = parsed.segments();
    match (segments.next(), segments.next()) {
        (Some(name), None) if name != ".." => Ok(name.to_string()),
        _ => Err(AppError::validation(format!(
            "Invalid file name: '{file_name}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_file_name() {
        assert_eq!(clean_file_name("report.pdf").unwrap(), "report.pdf");
        // NFC folding applies to the stored name.
        assert_eq!(
            clean_file_name("re\u{301}sume\u{301}.pdf").unwrap(),
            "r\u{e9}sum\u{e9}.pdf"
        );
        assert!(clean_file_name("a/b.txt").is_err());
        assert!(clean_file_name("..").is_err());
        assert!(clean_file_name("").is_err());
    }
}
