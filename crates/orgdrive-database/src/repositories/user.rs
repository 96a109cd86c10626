//! User repository implementation.

use chrono::Utc;
use sqlx::SqlitePool;

use orgdrive_core::error::{AppError, ErrorKind};
use orgdrive_core::result::AppResult;
use orgdrive_entity::user::{CreateUser, User};

/// Columns selected for every user query; the department name is joined in
/// so callers always see a complete identity.
const USER_COLUMNS: &str = "u.id, u.username, u.role, u.department_id, \
     d.canonical_name AS department_name, u.created_at";

/// Repository for identity lookups (read-mostly).
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a user by ID, with the department name resolved.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users u \
             LEFT JOIN departments d ON u.department_id = d.id \
             WHERE u.id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user", e))
    }

    /// Find a user by username.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users u \
             LEFT JOIN departments d ON u.department_id = d.id \
             WHERE u.username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user", e))
    }

    /// List all users.
    pub async fn list_all(&self) -> AppResult<Vec<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users u \
             LEFT JOIN departments d ON u.department_id = d.id \
             ORDER BY u.username ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list users", e))
    }

    /// Create a new user.
    pub async fn create(&self, user: CreateUser) -> AppResult<User> {
        let result =
            sqlx::query("INSERT INTO users (username, role, department_id, created_at) VALUES (?, ?, ?, ?)")
                .bind(&user.username)
                .bind(user.role)
                .bind(user.department_id)
                .bind(Utc::now())
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to create user", e)
                })?;

        self.find_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| AppError::internal("Created user not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::scratch_db;
    use orgdrive_entity::user::Role;

    #[tokio::test]
    async fn test_create_and_find() {
        let (_dir, pool) = scratch_db().await;
        let repo = UserRepository::new(pool.clone());

        sqlx::query("INSERT INTO departments (canonical_name, short_code) VALUES (?, ?)")
            .bind("研发部 (RD)")
            .bind("RD")
            .execute(&pool)
            .await
            .unwrap();

        let created = repo
            .create(CreateUser {
                username: "alice".into(),
                role: Role::Member,
                department_id: Some(1),
            })
            .await
            .unwrap();

        assert_eq!(created.username, "alice");
        assert_eq!(created.department_name.as_deref(), Some("研发部 (RD)"));

        let found = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(repo.find_by_username("nobody").await.unwrap().is_none());
    }
}
