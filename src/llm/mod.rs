pub mod error;
pub mod openai;
pub mod provider;
pub mod types;

pub use error::LlmError;
pub use openai::OpenAiClient;
pub use provider::Embedder;
pub use types::{ChatMessage, QueryRequest};
