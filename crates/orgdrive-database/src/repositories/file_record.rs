//! File record (metadata index) repository implementation.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use orgdrive_core::error::{AppError, ErrorKind};
use orgdrive_core::result::AppResult;
use orgdrive_entity::file_record::FileRecord;

/// Repository for the metadata index mirroring the physical tree.
#[derive(Debug, Clone)]
pub struct FileRecordRepository {
    pool: SqlitePool,
}

impl FileRecordRepository {
    /// Create a new file record repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a record by normalized path.
    pub async fn find_by_path(&self, path: &str) -> AppResult<Option<FileRecord>> {
        sqlx::query_as::<_, FileRecord>("SELECT * FROM file_records WHERE path = ?")
            .bind(path)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find file record", e)
            })
    }

    /// Register (or refresh) a record after an upload.
    ///
    /// A re-upload over an existing path replaces the uploader, timestamp
    /// and size while leaving the access counters untouched.
    pub async fn upsert_uploaded(
        &self,
        path: &str,
        uploader_id: i64,
        size_bytes: i64,
        uploaded_at: DateTime<Utc>,
    ) -> AppResult<FileRecord> {
        sqlx::query_as::<_, FileRecord>(
            "INSERT INTO file_records (path, uploader_id, uploaded_at, size_bytes) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT(path) DO UPDATE SET \
                 uploader_id = excluded.uploader_id, \
                 uploaded_at = excluded.uploaded_at, \
                 size_bytes = excluded.size_bytes \
             RETURNING *",
        )
        .bind(path)
        .bind(uploader_id)
        .bind(uploaded_at)
        .bind(size_bytes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to upsert file record", e))
    }

    /// Bump the access counter for a path (read-time concern only).
    ///
    /// Creates the row if the item was never registered, so downloads of
    /// lazily-discovered files still count.
    pub async fn record_access(&self, path: &str, now: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO file_records (path, access_count, last_access) VALUES (?, 1, ?) \
             ON CONFLICT(path) DO UPDATE SET \
                 access_count = file_records.access_count + 1, \
                 last_access = excluded.last_access",
        )
        .bind(path)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record access", e))?;
        Ok(())
    }

    /// Delete the record at `prefix` and every record nested under it,
    /// in one statement (directory deletes cascade atomically).
    pub async fn delete_subtree(&self, prefix: &str) -> AppResult<u64> {
        delete_subtree_stmt(&self.pool, prefix)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete file records", e)
            })
    }

    /// Delete a single record by path. Returns whether a row was removed.
    pub async fn delete_path(&self, path: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM file_records WHERE path = ?")
            .bind(path)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete file record", e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    /// All indexed paths (for the operator reconciliation pass).
    pub async fn list_paths(&self) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>("SELECT path FROM file_records ORDER BY path ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list paths", e))
    }
}

/// Shared cascade-delete statement, usable inside a caller-owned transaction.
pub(crate) async fn delete_subtree_stmt<'e, E>(
    executor: E,
    prefix: &str,
) -> Result<u64, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let pattern = format!("{}/%", escape_like(prefix));
    let result = sqlx::query("DELETE FROM file_records WHERE path = ? OR path LIKE ? ESCAPE '\\'")
        .bind(prefix)
        .bind(&pattern)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Escape LIKE metacharacters so a path prefix matches literally.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
