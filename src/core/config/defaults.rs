pub const DEFAULT_COLLECTION_NAME: &str = "my_documents";
pub const DEFAULT_VECTOR_DIMENSION: usize = 3072;
pub const DEFAULT_SEARCH_TOP_K: usize = 3;

pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";
pub const DEFAULT_SERVER_PORT: u16 = 8080;

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-large";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6333";

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "<role_definition>\n\
Role: Domain expert assistant.\n\
\n\
<rules>\n\
- Answer only from the content inside <retrieved_context>.\n\
- If the retrieved context is insufficient, say so explicitly instead of guessing.\n\
- Cite the relevant source passages when possible.\n\
- Be clear, concise and accurate.\n\
</rules>\n\
</role_definition>";
