//! DocumentStore trait — the vector-storage boundary of the pipeline.
//!
//! Backends: `SqliteDocumentStore` (embedded), `QdrantDocumentStore`
//! (REST) and `InMemoryDocumentStore`.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The collection is already there with a compatible dimension.
    /// Callers treat this as success.
    #[error("collection '{0}' already exists")]
    CollectionExists(String),

    #[error("collection '{0}' not found")]
    CollectionNotFound(String),

    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        StoreError::Backend(err.to_string())
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::CollectionExists(_))
    }
}

/// Persists documents keyed by collection and numeric id.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create `name` holding vectors of `dimension` floats.
    ///
    /// Returns `StoreError::CollectionExists` when it is already present
    /// with the same dimension.
    async fn create_collection(&self, name: &str, dimension: usize) -> Result<(), StoreError>;

    async fn exists(&self, collection: &str, id: u64) -> Result<bool, StoreError>;

    /// Upsert: a second write with the same id replaces the first.
    async fn add_document(
        &self,
        collection: &str,
        id: u64,
        text: &str,
        embedding: Vec<f32>,
    ) -> Result<(), StoreError>;

    /// Texts of the nearest neighbours of `embedding`, best first, each
    /// followed by a newline.
    async fn search(&self, collection: &str, embedding: &[f32]) -> Result<String, StoreError>;
}

/// Joins ranked texts the way every backend reports search results.
pub(crate) fn join_hits<'a, I>(texts: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut result = String::new();
    for text in texts {
        result.push_str(text);
        result.push('\n');
    }
    result
}
