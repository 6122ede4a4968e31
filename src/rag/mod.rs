//! Vector storage for the RAG pipeline.
//!
//! This module provides:
//! - `DocumentStore`: the storage contract the pipeline drives
//! - `SqliteDocumentStore`, `QdrantDocumentStore`, `InMemoryDocumentStore`: its backends

mod memory;
mod qdrant;
pub mod similarity;
mod sqlite;
mod store;

pub use memory::InMemoryDocumentStore;
pub use qdrant::QdrantDocumentStore;
pub use sqlite::SqliteDocumentStore;
pub use store::{DocumentStore, StoreError};
