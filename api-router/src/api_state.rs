use std::sync::Arc;
use std::time::Duration;

use common::{
    runtime_config::RuntimeConfig,
    services::ModelServices,
    storage::{
        backends::{AnalyticsBackend, JobDataBackend, ObjectStorageBackend, VectorIndexBackend},
        cleanup::CleanupCoordinator,
        db::SurrealDbClient,
        store::StorageManager,
    },
    utils::config::AppConfig,
};
use job_control::{CancellationRegistry, ProgressBus};

#[derive(Clone)]
pub struct ApiState {
    pub db: Arc<SurrealDbClient>,
    pub config: AppConfig,
    pub runtime: Arc<RuntimeConfig>,
    pub progress: Arc<ProgressBus>,
    pub cancellations: Arc<CancellationRegistry>,
    pub cleanup: Option<Arc<CleanupCoordinator>>,
    pub model_services: Arc<ModelServices>,
}

impl ApiState {
    pub async fn new(
        config: &AppConfig,
        storage: StorageManager,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Arc::new(
            SurrealDbClient::new(
                &config.surrealdb_address,
                &config.surrealdb_username,
                &config.surrealdb_password,
                &config.surrealdb_namespace,
                &config.surrealdb_database,
            )
            .await?,
        );

        db.ensure_initialized().await?;

        let runtime = Arc::new(RuntimeConfig::from_environment());

        let backends: Vec<Arc<dyn JobDataBackend>> = vec![
            Arc::new(VectorIndexBackend::new(Arc::clone(&db))),
            Arc::new(ObjectStorageBackend::new(storage)),
            Arc::new(AnalyticsBackend::new(Arc::clone(&db))),
        ];
        let cleanup = Some(Arc::new(CleanupCoordinator::new(backends)?));

        let idle_timeout = runtime.get_int("PROGRESS_IDLE_TIMEOUT_SECS", 300).max(1);
        let progress = Arc::new(ProgressBus::with_idle_timeout(Duration::from_secs(
            idle_timeout as u64,
        )));

        let app_state = Self {
            db,
            config: config.clone(),
            model_services: Arc::new(ModelServices::new(Arc::clone(&runtime))),
            runtime,
            progress,
            cancellations: Arc::new(CancellationRegistry::new()),
            cleanup,
        };

        Ok(app_state)
    }
}
