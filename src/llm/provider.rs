use async_trait::async_trait;

use super::error::LlmError;
use super::types::QueryRequest;

/// The language-model side of the pipeline: text embeddings and
/// single-turn answers.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed `text` into a vector of `dimension` floats.
    async fn generate_embedding(&self, text: &str, dimension: usize) -> Result<Vec<f32>, LlmError>;

    /// Answer `query.prompt` under `query.system_instruction`.
    async fn send_query(&self, query: &QueryRequest) -> Result<String, LlmError>;
}
