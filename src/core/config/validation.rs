use serde_json::{Map, Value};

use crate::core::errors::ApiError;

const STORE_BACKENDS: [&str; 3] = ["sqlite", "qdrant", "memory"];

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(pipeline) = expect_optional_object(root, "pipeline")? {
        validate_optional_string_field(pipeline, "pipeline.collection_name", "collection_name")?;
        if let Some(name) = pipeline.get("collection_name").and_then(|v| v.as_str()) {
            if name.trim().is_empty() {
                return Err(ApiError::BadRequest(
                    "Invalid config at 'pipeline.collection_name': value cannot be empty"
                        .to_string(),
                ));
            }
        }
        validate_u64_field(
            pipeline,
            "pipeline.vector_dimension",
            "vector_dimension",
            1,
            65_536,
        )?;
        validate_optional_string_field(
            pipeline,
            "pipeline.system_instruction",
            "system_instruction",
        )?;
        validate_u64_field(
            pipeline,
            "pipeline.request_timeout_secs",
            "request_timeout_secs",
            1,
            3_600,
        )?;
        validate_seed_documents(pipeline)?;
    }

    if let Some(store) = expect_optional_object(root, "store")? {
        if let Some(backend) = store.get("backend") {
            let Some(name) = backend.as_str() else {
                return Err(config_type_error("store.backend", "string"));
            };
            if !STORE_BACKENDS.contains(&name) {
                return Err(ApiError::BadRequest(format!(
                    "Invalid config at 'store.backend': expected one of {}",
                    STORE_BACKENDS.join(", ")
                )));
            }
        }
        validate_optional_string_field(store, "store.path", "path")?;
        validate_optional_string_field(store, "store.url", "url")?;
        validate_u64_field(store, "store.top_k", "top_k", 1, 1_000)?;
    }

    if let Some(llm) = expect_optional_object(root, "llm")? {
        validate_optional_string_field(llm, "llm.base_url", "base_url")?;
        validate_optional_string_field(llm, "llm.embedding_model", "embedding_model")?;
        validate_optional_string_field(llm, "llm.chat_model", "chat_model")?;
        validate_u64_field(llm, "llm.max_tokens", "max_tokens", 1, 1_000_000)?;
    }

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65_535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    Ok(())
}

fn validate_seed_documents(pipeline: &Map<String, Value>) -> Result<(), ApiError> {
    let Some(value) = pipeline.get("seed_documents") else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error("pipeline.seed_documents", "array"));
    };
    for (index, item) in items.iter().enumerate() {
        let path = format!("pipeline.seed_documents[{}]", index);
        let entry = item
            .as_object()
            .ok_or_else(|| config_type_error(&path, "object"))?;
        if entry.get("id").and_then(|v| v.as_u64()).is_none() {
            return Err(config_type_error(&format!("{}.id", path), "unsigned integer"));
        }
        validate_required_string_field(entry, &format!("{}.text", path), "text")?;
    }
    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_required_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let value = section.get(key).ok_or_else(|| {
        ApiError::BadRequest(format!("Invalid config at '{}': value is required", path))
    })?;
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': value cannot be empty",
            path
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_str().is_none() {
        return Err(config_type_error(path, "string"));
    }
    Ok(())
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::BadRequest(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_empty_and_complete_configs() {
        assert!(validate_config(&json!({})).is_ok());
        assert!(validate_config(&json!({
            "pipeline": {
                "collection_name": "docs",
                "vector_dimension": 1536,
                "request_timeout_secs": 30,
                "seed_documents": [{ "id": 1, "text": "hello" }]
            },
            "store": { "backend": "qdrant", "url": "http://localhost:6333", "top_k": 5 },
            "llm": { "chat_model": "gpt-4o-mini", "max_tokens": 512 },
            "server": { "host": "0.0.0.0", "port": 8080, "cors_allowed_origins": ["http://localhost"] }
        }))
        .is_ok());
    }

    #[test]
    fn rejects_zero_dimension() {
        let err = validate_config(&json!({ "pipeline": { "vector_dimension": 0 } })).unwrap_err();
        assert!(err.to_string().contains("pipeline.vector_dimension"));
    }

    #[test]
    fn rejects_unknown_backend() {
        let err = validate_config(&json!({ "store": { "backend": "redis" } })).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn rejects_blank_collection_name() {
        assert!(validate_config(&json!({ "pipeline": { "collection_name": "  " } })).is_err());
    }

    #[test]
    fn rejects_seed_document_without_text() {
        let err = validate_config(&json!({
            "pipeline": { "seed_documents": [{ "id": 4 }] }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("seed_documents[0].text"));
    }

    #[test]
    fn rejects_non_object_root() {
        assert!(validate_config(&json!([1, 2])).is_err());
    }
}
