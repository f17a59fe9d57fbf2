use std::sync::Arc;

use bench_core::ModelDescriptor;
use browser_agent::{BrowserAgent, LlmFactory, LoggedAgent, RemoteAgent};
use db::{BenchmarkStore, DbError, NoopStore, RestStore, SqliteStore};
use orchestrator::{ModelRunner, SessionOrchestrator, SessionRegistry, StreamPublisher};
use tracing::{info, warn};

use crate::config::{ServiceConfig, StorageBackend, StorageSection};

/// Shared handles of the running service. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub registry: SessionRegistry,
    pub orchestrator: SessionOrchestrator,
    pub publisher: StreamPublisher,
    pub models: Arc<Vec<ModelDescriptor>>,
    pub storage_backend: &'static str,
}

impl AppState {
    /// Wire the registry, runner, orchestrator and publisher together.
    pub fn new(
        config: &ServiceConfig,
        agent: Arc<dyn BrowserAgent>,
        llm: LlmFactory,
        store: Arc<dyn BenchmarkStore>,
    ) -> Self {
        let registry = SessionRegistry::new();
        let runner = ModelRunner::new(
            registry.clone(),
            llm,
            agent,
            Arc::clone(&store),
            Arc::from(config.agent.extractor.build()),
        );
        let orchestrator = SessionOrchestrator::new(
            registry.clone(),
            Arc::new(runner),
            Arc::clone(&store),
            config.models.clone(),
        )
        .with_cooldown(config.benchmark.cooldown());
        let publisher = StreamPublisher::new(registry.clone(), config.benchmark.publisher());

        Self {
            registry,
            orchestrator,
            publisher,
            models: Arc::new(config.models.clone()),
            storage_backend: store.backend_name(),
        }
    }

    /// Build the production collaborators described by `config`.
    pub async fn from_config(config: &ServiceConfig) -> Result<Self, DbError> {
        let agent = LoggedAgent::new(RemoteAgent::new(
            config.agent.url.clone(),
            config.agent.settings.clone(),
        ));
        let store = build_store(&config.storage).await?;
        info!(
            agent_url = %config.agent.url,
            storage = store.backend_name(),
            models = config.models.len(),
            "Service collaborators ready"
        );

        Ok(Self::new(config, Arc::new(agent), LlmFactory::from_env(), store))
    }
}

/// Select the storage backend. Supabase without credentials degrades to no
/// storage rather than failing startup.
pub async fn build_store(storage: &StorageSection) -> Result<Arc<dyn BenchmarkStore>, DbError> {
    match storage.backend {
        StorageBackend::Supabase => {
            match (&storage.supabase_url, &storage.supabase_service_key) {
                (Some(url), Some(key)) => Ok(Arc::new(RestStore::new(url.clone(), key.clone()))),
                _ => {
                    warn!("Supabase credentials missing, benchmark results will not be persisted");
                    Ok(Arc::new(NoopStore))
                }
            }
        }
        StorageBackend::Sqlite => {
            let database_url = format!("sqlite:{}", storage.sqlite_path.display());
            let pool = db::create_pool(&database_url).await?;
            db::run_migrations(&pool).await?;
            info!(path = %storage.sqlite_path.display(), "SQLite storage ready");
            Ok(Arc::new(SqliteStore::new(pool)))
        }
        StorageBackend::None => Ok(Arc::new(NoopStore)),
    }
}
