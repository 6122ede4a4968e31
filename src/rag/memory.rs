//! In-process document store.
//!
//! Same contract as the SQLite store, nothing persisted.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::similarity::rank_descending_by_cosine;
use super::store::{join_hits, DocumentStore, StoreError};

#[derive(Debug)]
struct Collection {
    dimension: usize,
    documents: BTreeMap<u64, StoredDocument>,
}

#[derive(Debug)]
struct StoredDocument {
    text: String,
    embedding: Vec<f32>,
}

pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
    top_k: usize,
}

impl InMemoryDocumentStore {
    pub fn new(top_k: usize) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            top_k: top_k.max(1),
        }
    }

    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|c| c.documents.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create_collection(&self, name: &str, dimension: usize) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        if let Some(existing) = collections.get(name) {
            if existing.dimension != dimension {
                return Err(StoreError::DimensionMismatch {
                    expected: existing.dimension,
                    actual: dimension,
                });
            }
            return Err(StoreError::CollectionExists(name.to_string()));
        }

        collections.insert(
            name.to_string(),
            Collection {
                dimension,
                documents: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn exists(&self, collection: &str, id: u64) -> Result<bool, StoreError> {
        let collections = self.collections.read().await;
        let target = collections
            .get(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;
        Ok(target.documents.contains_key(&id))
    }

    async fn add_document(
        &self,
        collection: &str,
        id: u64,
        text: &str,
        embedding: Vec<f32>,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;

        if embedding.len() != target.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: target.dimension,
                actual: embedding.len(),
            });
        }

        target.documents.insert(
            id,
            StoredDocument {
                text: text.to_string(),
                embedding,
            },
        );
        Ok(())
    }

    async fn search(&self, collection: &str, embedding: &[f32]) -> Result<String, StoreError> {
        let collections = self.collections.read().await;
        let target = collections
            .get(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;

        if embedding.len() != target.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: target.dimension,
                actual: embedding.len(),
            });
        }

        let documents: Vec<&StoredDocument> = target.documents.values().collect();
        let ranked = rank_descending_by_cosine(
            embedding,
            documents.iter().map(|doc| doc.embedding.as_slice()),
            self.top_k,
        );

        Ok(join_hits(
            ranked.iter().map(|(idx, _)| documents[*idx].text.as_str()),
        ))
    }
}
