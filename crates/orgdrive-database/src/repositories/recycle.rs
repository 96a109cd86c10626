//! Recycle entry repository implementation.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use orgdrive_core::error::{AppError, ErrorKind};
use orgdrive_core::result::AppResult;
use orgdrive_entity::recycle::{CreateRecycleEntry, RecycleEntry};

use super::file_record;

/// Repository for soft-delete provenance entries.
#[derive(Debug, Clone)]
pub struct RecycleRepository {
    pool: SqlitePool,
}

impl RecycleRepository {
    /// Create a new recycle repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a completed quarantine move.
    ///
    /// Inserts the entry and purges every metadata index row at or under
    /// the original path in one transaction, so a crash mid-bookkeeping
    /// cannot leave a partially-cleaned subtree. Called only *after* the
    /// physical move has succeeded.
    pub async fn record_soft_delete(&self, entry: CreateRecycleEntry) -> AppResult<RecycleEntry> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let recorded = sqlx::query_as::<_, RecycleEntry>(
            "INSERT INTO recycle_entries \
             (name, original_path, quarantine_name, deleted_at, actor_id, is_directory) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(&entry.name)
        .bind(&entry.original_path)
        .bind(&entry.quarantine_name)
        .bind(entry.deleted_at)
        .bind(entry.actor_id)
        .bind(entry.is_directory)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to insert recycle entry", e)
        })?;

        file_record::delete_subtree_stmt(&mut *tx, &entry.original_path)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to purge index rows", e)
            })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit soft delete", e)
        })?;

        Ok(recorded)
    }

    /// Find an entry by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<RecycleEntry>> {
        sqlx::query_as::<_, RecycleEntry>("SELECT * FROM recycle_entries WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find recycle entry", e)
            })
    }

    /// All entries, most recently deleted first.
    pub async fn list_all(&self) -> AppResult<Vec<RecycleEntry>> {
        sqlx::query_as::<_, RecycleEntry>(
            "SELECT * FROM recycle_entries ORDER BY deleted_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list recycle entries", e)
        })
    }

    /// Entries deleted before the cutoff (retention sweep input).
    pub async fn list_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<RecycleEntry>> {
        sqlx::query_as::<_, RecycleEntry>(
            "SELECT * FROM recycle_entries WHERE deleted_at < ? ORDER BY deleted_at ASC",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list expired entries", e)
        })
    }

    /// Close an entry. Returns whether a row was removed.
    pub async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM recycle_entries WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete recycle entry", e)
            })?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::file_record::FileRecordRepository;
    use crate::testing::scratch_db;

    async fn seed_actor(pool: &SqlitePool) -> i64 {
        sqlx::query("INSERT INTO users (username, role, created_at) VALUES ('carol', 'lead', ?)")
            .bind(Utc::now())
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid()
    }

    #[tokio::test]
    async fn test_record_soft_delete_cascades_index_rows() {
        let (_dir, pool) = scratch_db().await;
        let actor_id = seed_actor(&pool).await;
        let files = FileRecordRepository::new(pool.clone());
        let repo = RecycleRepository::new(pool);
        let now = Utc::now();

        files
            .upsert_uploaded("研发部 (RD)/Old", actor_id, 0, now)
            .await
            .unwrap();
        files
            .upsert_uploaded("研发部 (RD)/Old/draft.txt", actor_id, 5, now)
            .await
            .unwrap();
        files
            .upsert_uploaded("研发部 (RD)/Older/keep.txt", actor_id, 5, now)
            .await
            .unwrap();

        let entry = repo
            .record_soft_delete(CreateRecycleEntry {
                name: "Old".into(),
                original_path: "研发部 (RD)/Old".into(),
                quarantine_name: "1700000000000001_Old".into(),
                deleted_at: now,
                actor_id,
                is_directory: true,
            })
            .await
            .unwrap();

        assert!(entry.is_directory);
        assert!(files.find_by_path("研发部 (RD)/Old").await.unwrap().is_none());
        assert!(files
            .find_by_path("研发部 (RD)/Old/draft.txt")
            .await
            .unwrap()
            .is_none());
        assert!(files
            .find_by_path("研发部 (RD)/Older/keep.txt")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_retention_cutoff() {
        let (_dir, pool) = scratch_db().await;
        let actor_id = seed_actor(&pool).await;
        let repo = RecycleRepository::new(pool);
        let now = Utc::now();

        repo.record_soft_delete(CreateRecycleEntry {
            name: "stale.txt".into(),
            original_path: "Members/carol/stale.txt".into(),
            quarantine_name: "1700000000000002_stale.txt".into(),
            deleted_at: now - chrono::Duration::days(40),
            actor_id,
            is_directory: false,
        })
        .await
        .unwrap();
        repo.record_soft_delete(CreateRecycleEntry {
            name: "fresh.txt".into(),
            original_path: "Members/carol/fresh.txt".into(),
            quarantine_name: "1700000000000003_fresh.txt".into(),
            deleted_at: now,
            actor_id,
            is_directory: false,
        })
        .await
        .unwrap();

        let expired = repo
            .list_older_than(now - chrono::Duration::days(30))
            .await
            .unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].name, "stale.txt");
    }
}
