//! Shared test environment: scratch database, scratch storage root, and a
//! fully wired service stack.

use std::path::PathBuf;
use std::sync::Arc;

use futures::StreamExt;
use sqlx::SqlitePool;
use tempfile::TempDir;

use orgdrive_auth::normalizer::PathNormalizer;
use orgdrive_auth::policy::PolicyEvaluator;
use orgdrive_core::config::DepartmentSeed;
use orgdrive_core::config::database::DatabaseConfig;
use orgdrive_core::config::storage::StorageConfig;
use orgdrive_core::traits::storage::{ByteStream, StorageGateway};
use orgdrive_database::DatabasePool;
use orgdrive_database::migration::run_migrations;
use orgdrive_database::repositories::department::DepartmentRepository;
use orgdrive_database::repositories::file_record::FileRecordRepository;
use orgdrive_database::repositories::grant::GrantRepository;
use orgdrive_database::repositories::recycle::RecycleRepository;
use orgdrive_database::repositories::user::UserRepository;
use orgdrive_entity::user::{CreateUser, Role, User};
use orgdrive_service::browse::BrowseService;
use orgdrive_service::context::RequestContext;
use orgdrive_service::grants::GrantService;
use orgdrive_service::maintenance::MaintenanceService;
use orgdrive_service::provision::ProvisionService;
use orgdrive_service::recycle::RecycleService;
use orgdrive_service::upload::UploadIngestor;
use orgdrive_storage::LocalGateway;

pub struct TestEnv {
    pub root: TempDir,
    pub pool: SqlitePool,
    pub gateway: Arc<dyn StorageGateway>,
    pub users: Arc<UserRepository>,
    pub grants: Arc<GrantRepository>,
    pub files: Arc<FileRecordRepository>,
    pub recycle_repo: Arc<RecycleRepository>,
    pub depts: Arc<DepartmentRepository>,
    pub normalizer: Arc<PathNormalizer>,
    pub evaluator: Arc<PolicyEvaluator>,
    pub provision: ProvisionService,
    pub recycle: RecycleService,
    pub upload: UploadIngestor,
    pub browse: BrowseService,
    pub grant_admin: GrantService,
    pub maintenance: MaintenanceService,
}

impl TestEnv {
    pub async fn new() -> Self {
        let root = TempDir::new().expect("tempdir");

        let db_config = DatabaseConfig {
            url: format!("sqlite://{}/orgdrive.db", root.path().display()),
            max_connections: 5,
            connect_timeout_seconds: 5,
            busy_timeout_ms: 5_000,
        };
        let pool = DatabasePool::connect(&db_config)
            .await
            .expect("open scratch db")
            .into_pool();
        run_migrations(&pool).await.expect("migrations");

        let storage_root = root.path().join("storage");
        let gateway: Arc<dyn StorageGateway> = Arc::new(
            LocalGateway::new(storage_root.to_str().unwrap())
                .await
                .expect("gateway"),
        );

        let users = Arc::new(UserRepository::new(pool.clone()));
        let grants = Arc::new(GrantRepository::new(pool.clone()));
        let files = Arc::new(FileRecordRepository::new(pool.clone()));
        let recycle_repo = Arc::new(RecycleRepository::new(pool.clone()));
        let depts = Arc::new(DepartmentRepository::new(pool.clone()));

        let provision = ProvisionService::new(gateway.clone(), depts.clone());
        let seeds = vec![
            DepartmentSeed {
                name: "市场部 (MS)".into(),
                short_code: "MS".into(),
            },
            DepartmentSeed {
                name: "研发部 (RD)".into(),
                short_code: "RD".into(),
            },
        ];
        provision.seed_departments(&seeds).await.expect("seed");

        let directory = Arc::new(provision.build_directory().await.expect("directory"));
        let normalizer = Arc::new(PathNormalizer::new(directory));
        let evaluator = Arc::new(PolicyEvaluator::new(grants.clone()));
        let storage_config = StorageConfig::default();

        let recycle = RecycleService::new(
            gateway.clone(),
            recycle_repo.clone(),
            evaluator.clone(),
            normalizer.clone(),
            storage_config.clone(),
        );
        let upload = UploadIngestor::new(
            gateway.clone(),
            files.clone(),
            evaluator.clone(),
            normalizer.clone(),
            storage_config,
        );
        let browse = BrowseService::new(
            gateway.clone(),
            files.clone(),
            evaluator.clone(),
            normalizer.clone(),
        );
        let grant_admin = GrantService::new(grants.clone(), users.clone(), normalizer.clone());
        let maintenance = MaintenanceService::new(gateway.clone(), files.clone());

        Self {
            root,
            pool,
            gateway,
            users,
            grants,
            files,
            recycle_repo,
            depts,
            normalizer,
            evaluator,
            provision,
            recycle,
            upload,
            browse,
            grant_admin,
            maintenance,
        }
    }

    /// Create a user, optionally in the department with the given short
    /// code, and ensure their personal folder.
    pub async fn create_user(&self, username: &str, role: Role, dept_code: Option<&str>) -> User {
        let department_id = match dept_code {
            Some(code) => self
                .depts
                .list_all()
                .await
                .unwrap()
                .into_iter()
                .find(|d| d.short_code == code)
                .map(|d| d.id),
            None => None,
        };
        let user = self
            .users
            .create(CreateUser {
                username: username.into(),
                role,
                department_id,
            })
            .await
            .unwrap();
        self.provision.ensure_personal_folder(&user).await.unwrap();
        user
    }

    pub fn ctx(&self, user: &User) -> RequestContext {
        RequestContext::new(user.clone())
    }

    /// Physical storage root, for direct filesystem assertions.
    pub fn storage_root(&self) -> PathBuf {
        self.root.path().join("storage")
    }
}

/// Drain a byte stream into memory.
pub async fn collect(mut stream: ByteStream) -> Vec<u8> {
    let mut out = Vec::new();
    while let Some(chunk) = stream.next().await {
        out.extend_from_slice(&chunk.unwrap());
    }
    out
}
