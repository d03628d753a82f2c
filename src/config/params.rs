//! YAML parameter files for the completion request and the API client.
//!
//! Both files are free-form mappings. Completion parameters are passed
//! through to the request body untouched; client parameters are read into
//! [`ClientOptions`].

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::ConfigError;

/// Request keys the pipeline always sets itself.
pub const RESERVED_COMPLETION_KEYS: &[&str] = &["messages", "response_format"];

/// Load a YAML file that must contain a mapping.
///
/// An empty file is treated as an empty mapping.
pub fn load_yaml_mapping(path: &Path) -> Result<Map<String, Value>, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    if content.trim().is_empty() {
        return Ok(Map::new());
    }

    let value: Value = serde_yaml_ng::from_str(&content).map_err(|e| ConfigError::ParseYaml {
        path: path.to_path_buf(),
        source: e,
    })?;

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(ConfigError::NotAMapping(path.to_path_buf())),
    }
}

/// Load extra completion parameters, dropping keys the pipeline owns.
pub fn load_completion_params(path: &Path) -> Result<Map<String, Value>, ConfigError> {
    let mut params = load_yaml_mapping(path)?;
    for key in RESERVED_COMPLETION_KEYS {
        if params.remove(*key).is_some() {
            tracing::warn!("Ignoring `{key}` in {}: it is set by the pipe", path.display());
        }
    }
    Ok(params)
}

/// Options for constructing the completion API client.
///
/// Values here override the corresponding environment variables.
#[derive(Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub organization: Option<String>,
    pub project: Option<String>,
    /// Request timeout in seconds.
    pub timeout: Option<f64>,
    pub default_headers: IndexMap<String, String>,
    pub default_query: IndexMap<String, String>,
    /// Keys this client does not understand. Logged and otherwise ignored.
    #[serde(flatten)]
    pub unsupported: IndexMap<String, Value>,
}

impl ClientOptions {
    /// Load client options from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let map = load_yaml_mapping(path)?;
        let options: ClientOptions =
            serde_json::from_value(Value::Object(map)).map_err(|e| {
                ConfigError::InvalidClientOptions {
                    path: path.to_path_buf(),
                    source: e,
                }
            })?;

        for key in options.unsupported.keys() {
            tracing::warn!("Ignoring unsupported client parameter `{key}` in {}", path.display());
        }
        if let Some(timeout) = options.timeout {
            if !timeout.is_finite() || timeout <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    name: "timeout".to_string(),
                    value: timeout.to_string(),
                    reason: "must be a positive number of seconds".to_string(),
                });
            }
        }

        Ok(options)
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("organization", &self.organization)
            .field("project", &self.project)
            .field("timeout", &self.timeout)
            .field("default_headers", &self.default_headers.keys().collect::<Vec<_>>())
            .field("default_query", &self.default_query)
            .field("unsupported", &self.unsupported.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn loads_mapping_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "c.yml", "temperature: 0.2\nmax_tokens: 512\nseed: 7\n");
        let map = load_yaml_mapping(&path).unwrap();
        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["temperature", "max_tokens", "seed"]);
        assert_eq!(map["max_tokens"], 512);
    }

    #[test]
    fn empty_file_is_empty_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "empty.yml", "");
        assert!(load_yaml_mapping(&path).unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = load_yaml_mapping(Path::new("/tmp/review_pipe_missing_params.yml"));
        assert!(matches!(result, Err(ConfigError::MissingFile(_))));
    }

    #[test]
    fn list_is_not_a_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "list.yml", "- a\n- b\n");
        assert!(matches!(load_yaml_mapping(&path), Err(ConfigError::NotAMapping(_))));
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "bad.yml", "key: [unclosed\n");
        let err = load_yaml_mapping(&path).unwrap_err();
        assert!(err.to_string().contains("bad.yml"), "got: {err}");
    }

    #[test]
    fn completion_params_drop_reserved_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "c.yml",
            "model: gpt-4o-mini\nmessages: []\nresponse_format:\n  type: text\ntemperature: 0\n",
        );
        let params = load_completion_params(&path).unwrap();
        assert!(params.contains_key("model"));
        assert!(params.contains_key("temperature"));
        assert!(!params.contains_key("messages"));
        assert!(!params.contains_key("response_format"));
    }

    #[test]
    fn client_options_parse_known_and_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "client.yml",
            "base_url: https://llm.internal/v1\ntimeout: 30\nmax_retries: 3\n\
             default_headers:\n  X-Team: platform\n",
        );
        let options = ClientOptions::load(&path).unwrap();
        assert_eq!(options.base_url.as_deref(), Some("https://llm.internal/v1"));
        assert_eq!(options.timeout, Some(30.0));
        assert_eq!(options.default_headers["X-Team"], "platform");
        assert!(options.unsupported.contains_key("max_retries"));
    }

    #[test]
    fn client_options_reject_non_positive_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "client.yml", "timeout: 0\n");
        assert!(ClientOptions::load(&path).is_err());
    }

    #[test]
    fn client_options_debug_redacts_api_key() {
        let options = ClientOptions {
            api_key: Some("sk-secret".to_string()),
            ..ClientOptions::default()
        };
        assert!(!format!("{options:?}").contains("sk-secret"));
    }
}
