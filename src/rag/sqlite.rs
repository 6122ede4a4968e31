//! SQLite-backed document store.
//!
//! In-process store using SQLite for documents and collection metadata
//! and brute-force cosine similarity for search.

use std::path::PathBuf;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::similarity::rank_descending_by_cosine;
use super::store::{join_hits, DocumentStore, StoreError};

pub struct SqliteDocumentStore {
    pool: SqlitePool,
    top_k: usize,
}

impl SqliteDocumentStore {
    pub async fn with_path(db_path: PathBuf, top_k: usize) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(StoreError::backend)?;

        let store = Self {
            pool,
            top_k: top_k.max(1),
        };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY,
                dimension INTEGER NOT NULL,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL REFERENCES collections(name) ON DELETE CASCADE,
                id INTEGER NOT NULL,
                text TEXT NOT NULL,
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (collection, id)
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(())
    }

    async fn collection_dimension(&self, name: &str) -> Result<Option<usize>, StoreError> {
        let dimension: Option<i64> =
            sqlx::query_scalar("SELECT dimension FROM collections WHERE name = ?1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await
                .map_err(StoreError::backend)?;

        Ok(dimension.map(|d| d as usize))
    }

    async fn require_dimension(&self, name: &str) -> Result<usize, StoreError> {
        self.collection_dimension(name)
            .await?
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }
}

// SQLite integers are signed; ids round-trip through i64 bit-for-bit.
fn to_row_id(id: u64) -> i64 {
    id as i64
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn create_collection(&self, name: &str, dimension: usize) -> Result<(), StoreError> {
        let inserted = sqlx::query(
            "INSERT INTO collections (name, dimension) VALUES (?1, ?2)
             ON CONFLICT(name) DO NOTHING",
        )
        .bind(name)
        .bind(dimension as i64)
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?
        .rows_affected();

        if inserted > 0 {
            return Ok(());
        }

        let existing = self.require_dimension(name).await?;
        if existing != dimension {
            return Err(StoreError::DimensionMismatch {
                expected: existing,
                actual: dimension,
            });
        }
        Err(StoreError::CollectionExists(name.to_string()))
    }

    async fn exists(&self, collection: &str, id: u64) -> Result<bool, StoreError> {
        self.require_dimension(collection).await?;

        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM documents WHERE collection = ?1 AND id = ?2")
                .bind(collection)
                .bind(to_row_id(id))
                .fetch_optional(&self.pool)
                .await
                .map_err(StoreError::backend)?;

        Ok(found.is_some())
    }

    async fn add_document(
        &self,
        collection: &str,
        id: u64,
        text: &str,
        embedding: Vec<f32>,
    ) -> Result<(), StoreError> {
        let dimension = self.require_dimension(collection).await?;
        if embedding.len() != dimension {
            return Err(StoreError::DimensionMismatch {
                expected: dimension,
                actual: embedding.len(),
            });
        }

        let blob = Self::serialize_embedding(&embedding);
        sqlx::query(
            "INSERT OR REPLACE INTO documents (collection, id, text, embedding)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(collection)
        .bind(to_row_id(id))
        .bind(text)
        .bind(&blob)
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(())
    }

    async fn search(&self, collection: &str, embedding: &[f32]) -> Result<String, StoreError> {
        let dimension = self.require_dimension(collection).await?;
        if embedding.len() != dimension {
            return Err(StoreError::DimensionMismatch {
                expected: dimension,
                actual: embedding.len(),
            });
        }

        let rows = sqlx::query(
            "SELECT text, embedding FROM documents WHERE collection = ?1 ORDER BY id",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        let candidates: Vec<(String, Vec<f32>)> = rows
            .iter()
            .map(|row| {
                let bytes: Vec<u8> = row.get("embedding");
                (row.get("text"), Self::deserialize_embedding(&bytes))
            })
            .collect();

        let ranked = rank_descending_by_cosine(
            embedding,
            candidates.iter().map(|(_, emb)| emb.as_slice()),
            self.top_k,
        );

        let hits = join_hits(ranked.iter().map(|(idx, _)| candidates[*idx].0.as_str()));
        tracing::debug!(
            "Retrieved {} documents from collection {}",
            ranked.len(),
            collection
        );
        Ok(hits)
    }
}
