use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::paths::AppPaths;
use super::types::AppConfig;
use super::validation::validate_config;
use crate::core::errors::ApiError;

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 8] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "token_",
    "credential",
    "private_key",
    "bearer",
];

const SENSITIVE_WHITELIST: [&str; 2] = ["max_tokens", "tokens"];

/// Environment variables folded into the loaded config, highest precedence.
const ENV_OVERRIDES: [(&str, &[&str]); 4] = [
    ("OPENAI_API_KEY", &["llm", "api_key"]),
    ("QDRANT_API_KEY", &["store", "api_key"]),
    ("KAMOS_API_KEY", &["server", "api_key"]),
    ("KAMOS_PORT", &["server", "port"]),
];

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    /// `KAMOS_CONFIG_PATH`, else `config.yml` in the data dir, else in the project root.
    pub fn config_path(&self) -> PathBuf {
        self.config_path_with(|key| env::var(key).ok())
    }

    fn config_path_with<F>(&self, lookup: F) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("KAMOS_CONFIG_PATH").filter(|p| !p.trim().is_empty()) {
            return PathBuf::from(path);
        }

        let user_config = self.paths.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.paths.secrets_path.clone()
    }

    /// Public config deep-merged with secrets and env overrides, unvalidated.
    pub fn load_raw(&self) -> Value {
        self.load_raw_with(|key| env::var(key).ok())
    }

    pub fn load_config(&self) -> Result<AppConfig, ApiError> {
        parse_config(self.load_raw())
    }

    fn load_raw_with<F>(&self, lookup: F) -> Value
    where
        F: Fn(&str) -> Option<String>,
    {
        let public_config = load_yaml_file(&self.config_path_with(&lookup));
        let secrets_config = load_yaml_file(&self.secrets_path());
        let mut merged = deep_merge(&public_config, &secrets_config);
        apply_env_overrides(&mut merged, &lookup);
        merged
    }

    pub fn redact_sensitive_values(&self, value: &Value) -> Value {
        redact_sensitive_values(value)
    }
}

pub fn parse_config(raw: Value) -> Result<AppConfig, ApiError> {
    validate_config(&raw)?;
    serde_json::from_value(raw)
        .map_err(|err| ApiError::BadRequest(format!("Invalid config: {}", err)))
}

fn load_yaml_file(path: &Path) -> Value {
    if !path.exists() {
        return Value::Object(Map::new());
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<Value>(&contents) {
            Ok(value @ Value::Object(_)) => value,
            Ok(_) => Value::Object(Map::new()),
            Err(err) => {
                tracing::warn!("Ignoring unparsable config {}: {}", path.display(), err);
                Value::Object(Map::new())
            }
        },
        Err(err) => {
            tracing::warn!("Failed to read config {}: {}", path.display(), err);
            Value::Object(Map::new())
        }
    }
}

fn apply_env_overrides<F>(config: &mut Value, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    for (var, path) in ENV_OVERRIDES {
        let Some(raw) = lookup(var).filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        let value = match raw.parse::<u64>() {
            Ok(number) if path.last() == Some(&"port") => Value::from(number),
            _ => Value::String(raw),
        };
        set_path(config, path, value);
    }
}

fn set_path(config: &mut Value, path: &[&str], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        return;
    };

    if !config.is_object() {
        *config = Value::Object(Map::new());
    }
    if let Value::Object(map) = config {
        if rest.is_empty() {
            map.insert(first.to_string(), value);
        } else {
            let child = map
                .entry(first.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            set_path(child, rest, value);
        }
    }
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST
        .iter()
        .any(|allowed| *allowed == key_lower)
    {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::StoreBackend;
    use serde_json::json;

    #[test]
    fn deep_merge_merges_objects_and_overrides_scalars() {
        let base = json!({
            "a": 1,
            "b": { "c": 2, "d": 3 },
            "arr": [1, 2]
        });
        let override_value = json!({
            "b": { "c": 99 },
            "arr": [3],
            "e": "x"
        });

        let merged = deep_merge(&base, &override_value);

        assert_eq!(
            merged,
            json!({
                "a": 1,
                "b": { "c": 99, "d": 3 },
                "arr": [3],
                "e": "x"
            })
        );
    }

    #[test]
    fn env_overrides_create_missing_sections() {
        let mut config = json!({ "llm": { "chat_model": "gpt-4o-mini" } });

        apply_env_overrides(&mut config, |key| match key {
            "OPENAI_API_KEY" => Some("sk-test".to_string()),
            "KAMOS_PORT" => Some("9000".to_string()),
            _ => None,
        });

        assert_eq!(
            config,
            json!({
                "llm": { "chat_model": "gpt-4o-mini", "api_key": "sk-test" },
                "server": { "port": 9000 }
            })
        );
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = json!({ "llm": { "api_key": "from-file" } });

        apply_env_overrides(&mut config, |key| match key {
            "OPENAI_API_KEY" => Some("  ".to_string()),
            _ => None,
        });

        assert_eq!(config, json!({ "llm": { "api_key": "from-file" } }));
    }

    #[test]
    fn parse_config_fills_defaults() {
        let config = parse_config(json!({
            "pipeline": { "collection_name": "kb", "vector_dimension": 8 },
            "store": { "backend": "memory" }
        }))
        .unwrap();

        assert_eq!(config.pipeline.collection_name, "kb");
        assert_eq!(config.pipeline.vector_dimension, 8);
        assert!(config.pipeline.seed_documents.is_empty());
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.top_k, 3);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn parse_config_reads_seed_documents() {
        let config = parse_config(json!({
            "pipeline": {
                "seed_documents": [
                    { "id": 1, "text": "Vector databases store embeddings" }
                ]
            }
        }))
        .unwrap();

        assert_eq!(config.pipeline.seed_documents.len(), 1);
        assert_eq!(config.pipeline.seed_documents[0].id, 1);
    }

    #[test]
    fn load_config_merges_secrets_file() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AppPaths::with_data_dir(tmp.path().to_path_buf(), tmp.path().to_path_buf());
        fs::write(
            tmp.path().join("config.yml"),
            "llm:\n  chat_model: local-chat\nstore:\n  backend: memory\n",
        )
        .unwrap();
        fs::write(&paths.secrets_path, "store:\n  api_key: qdrant-secret\n").unwrap();

        let service = ConfigService::new(Arc::new(paths));
        let config = service.load_config().unwrap();

        assert_eq!(config.llm.chat_model, "local-chat");
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.api_key.as_deref(), Some("qdrant-secret"));
    }

    #[test]
    fn config_path_prefers_env_then_data_dir_then_project_root() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("root");
        let data = tmp.path().join("data");
        let service = ConfigService::new(Arc::new(AppPaths::with_data_dir(
            root.clone(),
            data.clone(),
        )));
        let no_env = |_: &str| None;

        assert_eq!(service.config_path_with(no_env), root.join("config.yml"));

        fs::write(data.join("config.yml"), "llm:\n  chat_model: from-data\n").unwrap();
        assert_eq!(service.config_path_with(no_env), data.join("config.yml"));

        let explicit = tmp.path().join("elsewhere.yml");
        let explicit_str = explicit.to_string_lossy().to_string();
        let with_env = |key: &str| (key == "KAMOS_CONFIG_PATH").then(|| explicit_str.clone());
        assert_eq!(service.config_path_with(with_env), explicit);
    }

    #[test]
    fn load_raw_applies_env_overrides_over_files() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AppPaths::with_data_dir(tmp.path().to_path_buf(), tmp.path().to_path_buf());
        fs::write(
            tmp.path().join("config.yml"),
            "server:\n  port: 8080\nstore:\n  backend: memory\n",
        )
        .unwrap();
        fs::write(&paths.secrets_path, "llm:\n  api_key: from-secrets\n").unwrap();
        let service = ConfigService::new(Arc::new(paths));

        let raw = service.load_raw_with(|key| match key {
            "OPENAI_API_KEY" => Some("from-env".to_string()),
            "KAMOS_PORT" => Some("9100".to_string()),
            _ => None,
        });
        let config = parse_config(raw).unwrap();

        assert_eq!(config.llm.api_key.as_deref(), Some("from-env"));
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn redact_sensitive_values_replaces_secrets_only() {
        let input = json!({
            "llm": {
                "api_key": "secret",
                "max_tokens": 42
            },
            "items": [
                { "password": "pw" }
            ]
        });

        let redacted = redact_sensitive_values(&input);

        assert_eq!(
            redacted,
            json!({
                "llm": {
                    "api_key": "****",
                    "max_tokens": 42
                },
                "items": [
                    { "password": "****" }
                ]
            })
        );
    }
}
