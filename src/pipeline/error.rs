use thiserror::Error;

use crate::llm::LlmError;
use crate::rag::StoreError;

/// Failures surfaced by the pipeline.
///
/// Collaborator errors are carried unchanged; the only one the pipeline
/// interprets is `StoreError::CollectionExists` during setup.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Embedding(#[from] LlmError),

    #[error("{operation} timed out")]
    Timeout { operation: &'static str },
}
