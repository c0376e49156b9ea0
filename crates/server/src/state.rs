use reqwest::Client;
use sqlx::SqlitePool;
use std::sync::Arc;

use enrichment::{
    BatchScheduler, EnrichmentOrchestrator, GentextBackend, RetryPolicy, TtlStore,
};
use gentext::GentextClient;

use crate::config::Config;
use crate::repositories::{SqliteAnimeStore, SqliteTtlStore};
use crate::services::{CacheSweepJob, EnrichmentBatchJob, SchedulerJob, SchedulerService};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
    pub store: Arc<SqliteAnimeStore>,
    pub policy: RetryPolicy,
    pub orchestrator: Arc<EnrichmentOrchestrator>,
    pub batch: Arc<BatchScheduler>,
    pub scheduler: Arc<SchedulerService>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config) -> Self {
        let config = Arc::new(config);
        let policy = config.retry_policy();

        let http_client = Client::new();
        let gentext = GentextClient::with_client(
            http_client,
            &config.gentext_base_url,
            &config.gentext_api_key,
        );
        let backend = Arc::new(GentextBackend::new(gentext));

        let store = Arc::new(SqliteAnimeStore::new(db.clone()));
        let ttl_store: Arc<dyn TtlStore> = Arc::new(SqliteTtlStore::new(db.clone()));

        let orchestrator = Arc::new(EnrichmentOrchestrator::new(
            store.clone(),
            backend,
            Arc::clone(&ttl_store),
            policy.clone(),
        ));

        let batch = Arc::new(BatchScheduler::new(
            store.clone(),
            Arc::clone(&orchestrator),
            policy.clone(),
        ));

        let jobs: Vec<Arc<dyn SchedulerJob>> = vec![
            Arc::new(EnrichmentBatchJob::new(
                Arc::clone(&batch),
                Arc::clone(&config),
            )),
            Arc::new(CacheSweepJob::new(
                Arc::clone(&ttl_store),
                Arc::clone(&config),
            )),
        ];
        let scheduler = Arc::new(SchedulerService::new(jobs));

        Self {
            db,
            config,
            store,
            policy,
            orchestrator,
            batch,
            scheduler,
        }
    }
}
