//! Prompt token estimation.
//!
//! Mirrors how chat models count prompt tokens: each message is wrapped in
//! a few framing tokens and the reply is primed with a couple more. The
//! result is an approximation used only to decide whether to skip a run.

use tiktoken_rs::CoreBPE;

use crate::constants;
use crate::models::ChatMessage;

use super::ProviderError;

/// Counts tokens with the tokenizer matching a model.
pub struct TokenCounter {
    bpe: CoreBPE,
}

impl TokenCounter {
    /// Tokenizer for `model`, or `cl100k_base` when the model is unknown.
    pub fn for_model(model: &str) -> Result<Self, ProviderError> {
        let bpe = match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => bpe,
            Err(_) => {
                tracing::debug!(
                    "No tokenizer registered for {model}, using {}",
                    constants::FALLBACK_ENCODING
                );
                tiktoken_rs::cl100k_base().map_err(|e| ProviderError::Tokenizer {
                    model: model.to_string(),
                    message: e.to_string(),
                })?
            }
        };
        Ok(Self { bpe })
    }

    /// Number of tokens in `text`.
    pub fn count_text(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }

    /// Approximate prompt size of a message sequence.
    pub fn count_messages(&self, messages: &[ChatMessage]) -> usize {
        let per_message: usize = messages
            .iter()
            .map(|m| {
                constants::TOKENS_PER_MESSAGE
                    + self.count_text(m.role.as_str())
                    + self.count_text(&m.content)
            })
            .sum();
        per_message + constants::TOKENS_PER_REPLY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sequence_counts_reply_priming_only() {
        let counter = TokenCounter::for_model("gpt-4o").unwrap();
        assert_eq!(counter.count_messages(&[]), constants::TOKENS_PER_REPLY);
    }

    #[test]
    fn each_message_adds_framing_tokens() {
        let counter = TokenCounter::for_model("gpt-4").unwrap();
        let message = ChatMessage::user("hello");
        let expected = constants::TOKENS_PER_MESSAGE
            + counter.count_text("user")
            + counter.count_text("hello")
            + constants::TOKENS_PER_REPLY;
        assert_eq!(counter.count_messages(&[message]), expected);
    }

    #[test]
    fn unknown_model_falls_back() {
        let counter = TokenCounter::for_model("my-local-llama").unwrap();
        assert!(counter.count_text("fn main() {}") > 0);
    }

    #[test]
    fn longer_content_counts_more() {
        let counter = TokenCounter::for_model("gpt-4o").unwrap();
        let short = counter.count_messages(&[ChatMessage::user("a")]);
        let long = counter.count_messages(&[ChatMessage::user("a ".repeat(200))]);
        assert!(long > short);
    }
}
