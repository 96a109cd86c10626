//! OrgDrive operator CLI.
//!
//! Wires configuration, the database, and the storage gateway together and
//! exposes the maintenance commands an operator needs: initial provisioning,
//! index/tree reconciliation, and the recycle retention sweep.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use orgdrive_auth::normalizer::PathNormalizer;
use orgdrive_auth::policy::PolicyEvaluator;
use orgdrive_core::config::AppConfig;
use orgdrive_core::error::AppError;
use orgdrive_core::traits::storage::StorageGateway;
use orgdrive_database::DatabasePool;
use orgdrive_database::migration::run_migrations;
use orgdrive_database::repositories::department::DepartmentRepository;
use orgdrive_database::repositories::file_record::FileRecordRepository;
use orgdrive_database::repositories::grant::GrantRepository;
use orgdrive_database::repositories::recycle::RecycleRepository;
use orgdrive_database::repositories::user::UserRepository;
use orgdrive_service::maintenance::MaintenanceService;
use orgdrive_service::provision::ProvisionService;
use orgdrive_service::recycle::RecycleService;
use orgdrive_storage::LocalGateway;

#[derive(Parser)]
#[command(name = "orgdrive", about = "OrgDrive shared file storage operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run migrations, seed configured departments, and create their folders.
    Init,
    /// Find metadata index rows with no backing physical item.
    Reconcile {
        /// Delete the stale rows instead of only reporting them.
        #[arg(long)]
        fix: bool,
    },
    /// Permanently purge quarantined items past the retention window.
    PurgeExpired,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(cli, config).await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

/// Load configuration from file and environment.
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("ORGDRIVE_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt().json().with_env_filter(filter).with_target(true).init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

async fn run(cli: Cli, config: AppConfig) -> Result<(), AppError> {
    tracing::info!("OrgDrive v{}", env!("CARGO_PKG_VERSION"));

    let pool = DatabasePool::connect(&config.database).await?.into_pool();
    run_migrations(&pool).await?;

    let gateway: Arc<dyn StorageGateway> =
        Arc::new(LocalGateway::new(&config.storage.root_path).await?);

    let dept_repo = Arc::new(DepartmentRepository::new(pool.clone()));
    let user_repo = Arc::new(UserRepository::new(pool.clone()));
    let grant_repo = Arc::new(GrantRepository::new(pool.clone()));
    let file_repo = Arc::new(FileRecordRepository::new(pool.clone()));
    let recycle_repo = Arc::new(RecycleRepository::new(pool.clone()));

    let provision = ProvisionService::new(gateway.clone(), dept_repo.clone());

    match cli.command {
        Command::Init => {
            let departments = provision.seed_departments(&config.departments).await?;
            for user in user_repo.list_all().await? {
                provision.ensure_personal_folder(&user).await?;
            }
            tracing::info!(count = departments.len(), "Initialization complete");
        }
        Command::Reconcile { fix } => {
            let maintenance = MaintenanceService::new(gateway.clone(), file_repo.clone());
            let report = maintenance.reconcile(fix).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::PurgeExpired => {
            let directory = Arc::new(provision.build_directory().await?);
            let normalizer = Arc::new(PathNormalizer::new(directory));
            let evaluator = Arc::new(PolicyEvaluator::new(grant_repo.clone()));
            let recycle = RecycleService::new(
                gateway.clone(),
                recycle_repo.clone(),
                evaluator,
                normalizer,
                config.storage.clone(),
            );
            let purged = recycle.purge_expired().await?;
            tracing::info!(purged, "Retention sweep complete");
        }
    }

    Ok(())
}
