//! Department repository implementation.

use sqlx::SqlitePool;

use orgdrive_core::error::{AppError, ErrorKind};
use orgdrive_core::result::AppResult;
use orgdrive_entity::department::Department;

/// Repository for the department lookup table.
#[derive(Debug, Clone)]
pub struct DepartmentRepository {
    pool: SqlitePool,
}

impl DepartmentRepository {
    /// Create a new department repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List all departments.
    pub async fn list_all(&self) -> AppResult<Vec<Department>> {
        sqlx::query_as::<_, Department>(
            "SELECT * FROM departments ORDER BY canonical_name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list departments", e))
    }

    /// Find a department by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<Department>> {
        sqlx::query_as::<_, Department>("SELECT * FROM departments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find department", e)
            })
    }

    /// Insert or refresh a department keyed by canonical name.
    ///
    /// Used at startup to seed the configured department table.
    pub async fn upsert(&self, canonical_name: &str, short_code: &str) -> AppResult<Department> {
        sqlx::query_as::<_, Department>(
            "INSERT INTO departments (canonical_name, short_code) VALUES (?, ?) \
             ON CONFLICT(canonical_name) DO UPDATE SET short_code = excluded.short_code \
             RETURNING *",
        )
        .bind(canonical_name)
        .bind(short_code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to upsert department", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::scratch_db;

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let (_dir, pool) = scratch_db().await;
        let repo = DepartmentRepository::new(pool);

        let first = repo.upsert("市场部 (MS)", "MS").await.unwrap();
        let second = repo.upsert("市场部 (MS)", "MS").await.unwrap();
        assert_eq!(first.id, second.id);

        let all = repo.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].short_code, "MS");
    }
}
