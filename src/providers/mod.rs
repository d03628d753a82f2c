//! CompletionClient trait and chat-completions integration.
//!
//! The review stage only needs "send these messages, get text back", so the
//! seam is a single async method. [`openai::OpenAiClient`] is the production
//! implementation; tests substitute fakes.

pub mod openai;
pub mod tokens;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::ChatMessage;

pub use openai::OpenAiClient;

/// Errors from the completion service.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("failed to build completion client: {0}")]
    Client(String),

    #[error("completion request rejected with HTTP {status}: {body}")]
    BadRequest { status: u16, body: String },

    #[error("completion API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("completion request failed: {0}")]
    Transport(String),

    #[error("failed to encode completion request: {0}")]
    Encode(String),

    #[error("failed to decode completion response: {0}")]
    Decode(String),

    #[error("completion response contained no message content")]
    EmptyResponse,

    #[error("no tokenizer available for model {model}: {message}")]
    Tokenizer { model: String, message: String },
}

/// One chat-completions call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Passthrough request body fields. Never contains `messages` or
    /// `response_format`.
    pub params: Map<String, Value>,
}

/// Token usage reported by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Usage {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

/// Text of the first choice plus usage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub usage: Option<Usage>,
}

/// Trait for chat-completion backends.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send the request and return the first choice's message content.
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ProviderError>;
}
