//! Seeds the department table and lazily creates canonical folders.

use std::sync::Arc;

use tracing::info;

use orgdrive_auth::directory::DepartmentDirectory;
use orgdrive_core::config::DepartmentSeed;
use orgdrive_core::result::AppResult;
use orgdrive_core::traits::storage::StorageGateway;
use orgdrive_core::types::path::CanonicalPath;
use orgdrive_database::repositories::department::DepartmentRepository;
use orgdrive_entity::department::Department;
use orgdrive_entity::user::User;

/// Keeps the department table, its physical folders, and personal folders
/// in line with configuration. Every department has exactly one canonical
/// folder, created lazily if absent.
#[derive(Debug, Clone)]
pub struct ProvisionService {
    /// Storage gateway.
    gateway: Arc<dyn StorageGateway>,
    /// Department repository.
    dept_repo: Arc<DepartmentRepository>,
}

impl ProvisionService {
    /// Creates a new provisioning service.
    pub fn new(gateway: Arc<dyn StorageGateway>, dept_repo: Arc<DepartmentRepository>) -> Self {
        Self { gateway, dept_repo }
    }

    /// Upsert the configured departments and ensure their canonical
    /// folders exist. Returns the full department table.
    pub async fn seed_departments(&self, seeds: &[DepartmentSeed]) -> AppResult<Vec<Department>> {
        for seed in seeds {
            let dept = self.dept_repo.upsert(&seed.name, &seed.short_code).await?;
            self.gateway
                .ensure_dir(&CanonicalPath::parse(&dept.canonical_name))
                .await?;
            info!(department = %dept.canonical_name, code = %dept.short_code, "Department provisioned");
        }
        self.dept_repo.list_all().await
    }

    /// Build a fresh alias directory from the department table.
    ///
    /// Called once at startup and again on explicit administrative reload;
    /// the returned value is immutable and shared behind an `Arc`.
    pub async fn build_directory(&self) -> AppResult<DepartmentDirectory> {
        let departments = self.dept_repo.list_all().await?;
        Ok(DepartmentDirectory::new(departments.iter()))
    }

    /// Ensure a user's personal folder exists (admins have none).
    pub async fn ensure_personal_folder(&self, user: &User) -> AppResult<()> {
        if user.is_admin() {
            return Ok(());
        }
        self.gateway.ensure_dir(&user.personal_space()).await
    }
}
