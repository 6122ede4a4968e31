use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults::*;
use crate::pipeline::{Document, PipelineConfig};

/// Typed view of `config.yml` after secrets and env overrides are merged in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pipeline: PipelineSettings,
    pub store: StoreSettings,
    pub llm: LlmSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub collection_name: String,
    pub vector_dimension: usize,
    pub system_instruction: String,
    /// Deadline applied to each embedding/store call, in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Documents ingested once at startup, after collection setup.
    pub seed_documents: Vec<Document>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            collection_name: DEFAULT_COLLECTION_NAME.to_string(),
            vector_dimension: DEFAULT_VECTOR_DIMENSION,
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            request_timeout_secs: None,
            seed_documents: Vec::new(),
        }
    }
}

impl PipelineSettings {
    pub fn to_pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            collection_name: self.collection_name.clone(),
            vector_dimension: self.vector_dimension,
            system_instruction: self.system_instruction.clone(),
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Qdrant,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    /// SQLite database file; defaults to `<data dir>/kamos.db`.
    pub path: Option<PathBuf>,
    pub url: String,
    pub api_key: Option<String>,
    pub top_k: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            path: None,
            url: DEFAULT_QDRANT_URL.to_string(),
            api_key: None,
            top_k: DEFAULT_SEARCH_TOP_K,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub embedding_model: String,
    pub chat_model: String,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            api_key: None,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub api_key: Option<String>,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_SERVER_HOST.to_string(),
            port: DEFAULT_SERVER_PORT,
            api_key: None,
            cors_allowed_origins: Vec::new(),
        }
    }
}
