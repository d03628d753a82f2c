//! Shared types used across all modules.
//!
//! Diff chunks, chat messages, the parsed review, and the comment payloads
//! live here so the pipeline stages depend on each other only through
//! these types.

pub mod chunk;
pub mod comment;
pub mod message;
pub mod review;

pub use chunk::{DiffChunk, FileAllowlist};
pub use comment::{CommentPayload, InlineComment, parse_location_key};
pub use message::{ChatMessage, Role};
pub use review::ReviewResult;
