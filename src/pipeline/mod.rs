//! Retrieval-augmented generation pipeline.
//!
//! Drives a `DocumentStore` and an `Embedder` through three flows:
//! 1. Collection setup (idempotent)
//! 2. Deduplicated, strictly sequential ingestion
//! 3. Query: embed, search, frame the retrieved context, answer

mod error;
mod prompt;

pub use error::PipelineError;
pub use prompt::compose_prompt;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::config::defaults::DEFAULT_SYSTEM_INSTRUCTION;
use crate::llm::{Embedder, QueryRequest};
use crate::rag::DocumentStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: u64,
    pub text: String,
}

impl Document {
    pub fn new(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

/// Fixed for the lifetime of a `Pipeline`.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub collection_name: String,
    /// Length of every embedding stored in or searched against the collection.
    pub vector_dimension: usize,
    /// Role instruction sent alongside every query.
    pub system_instruction: String,
    /// Deadline for each individual store or embedding call.
    pub request_timeout: Option<Duration>,
}

impl PipelineConfig {
    pub fn new(collection_name: impl Into<String>, vector_dimension: usize) -> Self {
        Self {
            collection_name: collection_name.into(),
            vector_dimension,
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            request_timeout: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupOutcome {
    Created,
    AlreadyExists,
}

/// Per-document outcome of one ingestion run, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub inserted: Vec<u64>,
    pub skipped: Vec<u64>,
}

pub struct Pipeline {
    store: Arc<dyn DocumentStore>,
    embedder: Arc<dyn Embedder>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        embedder: Arc<dyn Embedder>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Create the configured collection. An existing collection is not an error.
    pub async fn setup_collection(&self) -> Result<SetupOutcome, PipelineError> {
        let name = &self.config.collection_name;
        let created = self
            .guarded(
                "create collection",
                self.store.create_collection(name, self.config.vector_dimension),
            )
            .await;

        match created {
            Ok(()) => {
                tracing::info!("Collection {} created successfully", name);
                Ok(SetupOutcome::Created)
            }
            Err(PipelineError::Store(err)) if err.is_already_exists() => {
                tracing::info!("Collection {} already exists, skipping creation", name);
                Ok(SetupOutcome::AlreadyExists)
            }
            Err(err) => Err(err),
        }
    }

    /// Ingest `documents` in order, skipping ids the store already holds.
    ///
    /// The first failing document aborts the batch; documents stored before
    /// it stay stored, later ones are never touched.
    pub async fn process_documents(
        &self,
        documents: &[Document],
    ) -> Result<IngestReport, PipelineError> {
        let collection = &self.config.collection_name;
        let mut report = IngestReport::default();

        for doc in documents {
            let exists = self
                .guarded("existence check", self.store.exists(collection, doc.id))
                .await?;
            if exists {
                tracing::info!("Document {} already exists, skipping", doc.id);
                report.skipped.push(doc.id);
                continue;
            }

            let embedding = self
                .guarded(
                    "document embedding",
                    self.embedder
                        .generate_embedding(&doc.text, self.config.vector_dimension),
                )
                .await?;

            self.guarded(
                "document insert",
                self.store
                    .add_document(collection, doc.id, &doc.text, embedding),
            )
            .await?;

            tracing::info!("Inserted document {}", doc.id);
            report.inserted.push(doc.id);
        }

        Ok(report)
    }

    /// Answer `prompt` from the documents nearest to it.
    pub async fn query(&self, prompt: &str) -> Result<String, PipelineError> {
        let collection = &self.config.collection_name;

        let embedding = self
            .guarded(
                "query embedding",
                self.embedder
                    .generate_embedding(prompt, self.config.vector_dimension),
            )
            .await?;

        let context = self
            .guarded("search", self.store.search(collection, &embedding))
            .await?;
        if context.trim().is_empty() {
            tracing::warn!(
                "No related documents found in collection {}; answering without context",
                collection
            );
        }

        let request = QueryRequest::new(
            compose_prompt(&context, prompt),
            self.config.system_instruction.clone(),
        );
        let answer = self
            .guarded("answer generation", self.embedder.send_query(&request))
            .await?;

        tracing::debug!("Answered query against collection {}", collection);
        Ok(answer)
    }

    async fn guarded<T, E, F>(&self, operation: &'static str, call: F) -> Result<T, PipelineError>
    where
        F: Future<Output = Result<T, E>>,
        PipelineError: From<E>,
    {
        match self.config.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result.map_err(PipelineError::from),
                Err(_) => {
                    tracing::warn!("{} exceeded {:?}", operation, limit);
                    Err(PipelineError::Timeout { operation })
                }
            },
            None => call.await.map_err(PipelineError::from),
        }
    }
}
