//! Retrieval-augmented generation: deduplicated document ingestion into a
//! vector store and retrieve-then-generate querying.

pub mod core;
pub mod llm;
pub mod pipeline;
pub mod rag;
pub mod server;
pub mod state;

pub use pipeline::{Document, IngestReport, Pipeline, PipelineConfig, PipelineError, SetupOutcome};
