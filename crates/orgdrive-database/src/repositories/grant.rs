//! Grant repository implementation.

use chrono::Utc;
use sqlx::SqlitePool;

use orgdrive_core::error::{AppError, ErrorKind};
use orgdrive_core::result::AppResult;
use orgdrive_entity::grant::{CreateGrant, Grant};

/// Repository for explicit permission grants.
///
/// Queries return expired grants too; expiry filtering happens in the
/// policy evaluator against a single per-call timestamp. Expired grants
/// are only removed by explicit revocation.
#[derive(Debug, Clone)]
pub struct GrantRepository {
    pool: SqlitePool,
}

impl GrantRepository {
    /// Create a new grant repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All grants for a user, newest first.
    pub async fn find_for_user(&self, user_id: i64) -> AppResult<Vec<Grant>> {
        sqlx::query_as::<_, Grant>(
            "SELECT * FROM grants WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to query grants", e))
    }

    /// Find a grant by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<Grant>> {
        sqlx::query_as::<_, Grant>("SELECT * FROM grants WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find grant", e))
    }

    /// Create a new grant. The folder path must already be normalized.
    pub async fn create(&self, grant: CreateGrant) -> AppResult<Grant> {
        sqlx::query_as::<_, Grant>(
            "INSERT INTO grants (user_id, folder_path, access, expires_at, created_at) \
             VALUES (?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(grant.user_id)
        .bind(&grant.folder_path)
        .bind(grant.access)
        .bind(grant.expires_at)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create grant", e))
    }

    /// Delete a grant. Returns whether a row was removed.
    pub async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM grants WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete grant", e))?;
        Ok(result.rows_affected() > 0)
    }
}
