//! OpenAI-compatible chat-completions client using reqwest.
//!
//! Works with any provider that exposes `{base_url}/chat/completions`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::AiConfig;
use crate::constants;

use super::{Completion, CompletionClient, CompletionRequest, ProviderError, Usage};

/// Chat-completions client configured from [`AiConfig`].
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    default_query: Vec<(String, String)>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    /// Build the HTTP client from the configured client options.
    pub fn new(config: &AiConfig) -> Result<Self, ProviderError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(format!("{}/{}", constants::APP_NAME, constants::VERSION))
            .default_headers(default_headers(config)?);
        if let Some(secs) = config.client.timeout {
            builder = builder.timeout(Duration::from_secs_f64(secs));
        }
        let http = builder
            .build()
            .map_err(|e| ProviderError::Client(e.to_string()))?;
        Ok(Self::with_http(http, config))
    }

    /// Client with an explicit HTTP client. Headers from `config` are not
    /// applied; the caller's client is used as is.
    pub fn with_http(http: reqwest::Client, config: &AiConfig) -> Self {
        Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            default_query: config
                .client
                .default_query
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// The URL requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Organization, project, and any extra headers from the client options.
pub fn default_headers(config: &AiConfig) -> Result<HeaderMap, ProviderError> {
    let mut headers = HeaderMap::new();
    let mut insert = |name: &str, value: &str| -> Result<(), ProviderError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ProviderError::Client(format!("invalid header name {name:?}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ProviderError::Client(format!("invalid value for header {name}: {e}")))?;
        headers.insert(name, value);
        Ok(())
    };

    if let Some(org) = &config.organization {
        insert("OpenAI-Organization", org)?;
    }
    if let Some(project) = &config.client.project {
        insert("OpenAI-Project", project)?;
    }
    for (name, value) in &config.client.default_headers {
        insert(name, value)?;
    }

    Ok(headers)
}

/// Request body: model, passthrough params, then the fields the pipe owns.
pub fn request_body(request: &CompletionRequest) -> Result<Value, ProviderError> {
    let mut body = Map::new();
    body.insert("model".to_string(), Value::String(request.model.clone()));
    for (key, value) in &request.params {
        body.insert(key.clone(), value.clone());
    }
    let messages = serde_json::to_value(&request.messages)
        .map_err(|e| ProviderError::Encode(e.to_string()))?;
    body.insert("messages".to_string(), messages);
    body.insert(
        "response_format".to_string(),
        serde_json::json!({ "type": "json_object" }),
    );
    Ok(Value::Object(body))
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ProviderError> {
        let body = request_body(request)?;

        let response = self
            .http
            .post(&self.endpoint)
            .query(&self.default_query)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(if status.is_client_error() {
                ProviderError::BadRequest {
                    status: status.as_u16(),
                    body,
                }
            } else {
                ProviderError::Api {
                    status: status.as_u16(),
                    body,
                }
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or(ProviderError::EmptyResponse)?;

        Ok(Completion {
            content,
            usage: parsed.usage,
        })
    }
}
