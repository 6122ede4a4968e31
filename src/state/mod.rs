use std::sync::Arc;

use crate::core::config::{AppConfig, AppPaths, ConfigService, StoreBackend};
use crate::llm::{Embedder, OpenAiClient};
use crate::pipeline::Pipeline;
use crate::rag::{DocumentStore, InMemoryDocumentStore, QdrantDocumentStore, SqliteDocumentStore};

pub mod error;

use error::InitializationError;

/// Application state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    /// Initializes the application state.
    ///
    /// This process includes:
    /// 1. Loading configuration (config.yml, secrets.yaml, environment)
    /// 2. Opening the configured document store
    /// 3. Wiring the embedding client and the pipeline
    /// 4. Creating the collection and ingesting seed documents
    pub async fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let service = ConfigService::new(paths.clone());
        let config = service
            .load_config()
            .map_err(|e| InitializationError::Config(e.into()))?;

        if let Ok(effective) = serde_json::to_value(&config) {
            tracing::debug!(
                "Effective config: {}",
                service.redact_sensitive_values(&effective)
            );
        }

        let store = open_store(&config, &paths).await?;
        let embedder: Arc<dyn Embedder> = Arc::new(OpenAiClient::new(&config.llm));
        let pipeline = Pipeline::new(store, embedder, config.pipeline.to_pipeline_config());

        let state = Self::from_parts(config, pipeline);
        state.prepare().await?;
        Ok(Arc::new(state))
    }

    pub fn from_parts(config: AppConfig, pipeline: Pipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.config
            .server
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }

    async fn prepare(&self) -> Result<(), InitializationError> {
        self.pipeline
            .setup_collection()
            .await
            .map_err(|e| InitializationError::Setup(e.into()))?;

        let seeds = &self.config.pipeline.seed_documents;
        if !seeds.is_empty() {
            let report = self
                .pipeline
                .process_documents(seeds)
                .await
                .map_err(|e| InitializationError::Setup(e.into()))?;
            tracing::info!(
                "Seed ingestion: {} inserted, {} skipped",
                report.inserted.len(),
                report.skipped.len()
            );
        }
        Ok(())
    }
}

async fn open_store(
    config: &AppConfig,
    paths: &AppPaths,
) -> Result<Arc<dyn DocumentStore>, InitializationError> {
    let settings = &config.store;
    let store: Arc<dyn DocumentStore> = match settings.backend {
        StoreBackend::Sqlite => {
            let db_path = settings.path.clone().unwrap_or_else(|| paths.db_path.clone());
            tracing::info!("Using SQLite document store at {}", db_path.display());
            Arc::new(
                SqliteDocumentStore::with_path(db_path, settings.top_k)
                    .await
                    .map_err(|e| InitializationError::Store(e.into()))?,
            )
        }
        StoreBackend::Qdrant => {
            tracing::info!("Using Qdrant document store at {}", settings.url);
            Arc::new(QdrantDocumentStore::new(settings))
        }
        StoreBackend::Memory => {
            tracing::info!("Using in-memory document store");
            Arc::new(InMemoryDocumentStore::new(settings.top_k))
        }
    };
    Ok(store)
}
