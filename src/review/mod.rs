//! Review requester: prompt assembly, token budget, completion, parsing.

pub mod parser;

use std::time::{Duration, Instant};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::AiConfig;
use crate::models::{ChatMessage, DiffChunk, ReviewResult};
use crate::providers::tokens::TokenCounter;
use crate::providers::{CompletionClient, CompletionRequest, ProviderError, Usage};

pub use parser::parse_review;

/// Fixed instruction sent as the first system message.
pub const SYSTEM_PROMPT: &str = r#"Review a file of source code, and the git diff of a set of changes made to that file on a Pull Request. Follow the software development principles SOLID, DRY, KISS, YAGNI. Skip compliments. Propose corrections.
You are a helpful assistant designed to output JSON.
The response must be a JSON object containing a summary and suggestions, where the key for each piece of feedback is the filename and line number in the file where the feedback must be left, and the value is the feedback itself as a string.
The JSON must follow this structure: {"summary": "<pull request detailed description>", "suggestions": {"<filename>:<line-number>": "<feedback relating to the referenced line in the file>"}}"#;

/// Errors from the review stage.
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("failed to parse review response: {message}\nResponse starts with: {excerpt}")]
    Parse { message: String, excerpt: String },
}

/// Result of asking for a review.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewOutcome {
    /// The prompt was over the token ceiling; nothing was sent.
    Skipped { tokens: usize, limit: usize },
    /// The model replied and the reply parsed.
    Completed {
        review: ReviewResult,
        usage: Option<Usage>,
        elapsed: Duration,
    },
}

/// Assemble the message sequence for a set of chunks.
///
/// The optional instruction becomes a second system message when it
/// contains anything other than whitespace.
pub fn build_messages(chunks: &[DiffChunk], extra_instruction: Option<&str>) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];
    if let Some(extra) = extra_instruction.filter(|s| !s.trim().is_empty()) {
        messages.push(ChatMessage::system(extra));
    }
    let diff: String = chunks.iter().map(DiffChunk::as_str).collect();
    messages.push(ChatMessage::user(diff));
    messages
}

/// Sends diffs to a [`CompletionClient`] and parses the reply.
pub struct ReviewRequester<'a> {
    client: &'a dyn CompletionClient,
    model: String,
    extra_instruction: Option<String>,
    max_prompt_tokens: usize,
    params: Map<String, Value>,
}

impl<'a> ReviewRequester<'a> {
    pub fn new(client: &'a dyn CompletionClient, config: &AiConfig) -> Self {
        Self {
            client,
            model: config.model.clone(),
            extra_instruction: config.extra_instruction.clone(),
            max_prompt_tokens: config.max_prompt_tokens,
            params: config.completion_params.clone(),
        }
    }

    /// Request a review of `chunks`.
    ///
    /// Returns [`ReviewOutcome::Skipped`] without contacting the service
    /// when the prompt exceeds a nonzero token ceiling.
    pub async fn request(&self, chunks: &[DiffChunk]) -> Result<ReviewOutcome, ReviewError> {
        let messages = build_messages(chunks, self.extra_instruction.as_deref());

        let tokens = TokenCounter::for_model(&self.model)?.count_messages(&messages);
        tracing::info!("Prompt size: ~{tokens} tokens");
        if self.max_prompt_tokens != 0 && tokens > self.max_prompt_tokens {
            return Ok(ReviewOutcome::Skipped {
                tokens,
                limit: self.max_prompt_tokens,
            });
        }

        tracing::info!("Completion model: {}", self.model);
        if !self.params.is_empty() {
            let params = Value::Object(self.params.clone());
            tracing::info!("Completion parameters: {params}");
        }
        tracing::debug!("Messages: {messages:?}");

        let request = CompletionRequest {
            model: self.model.clone(),
            messages,
            params: self.params.clone(),
        };

        tracing::info!("Requesting review...");
        let start = Instant::now();
        let completion = self.client.complete(&request).await?;
        let elapsed = start.elapsed();

        tracing::debug!("Raw completion: {}", completion.content);
        let review = parse_review(&completion.content)?;
        tracing::debug!("Parsed review: {review:?}");

        Ok(ReviewOutcome::Completed {
            review,
            usage: completion.usage,
            elapsed,
        })
    }
}
