//! Bitbucket Cloud access: reading the pull request diff and posting comments.
//!
//! The pipeline talks to Bitbucket only through [`DiffSource`] and
//! [`CommentSink`], so tests can swap in in-memory fakes.

pub mod auth;
pub mod client;

pub use auth::BitbucketAuth;
pub use client::BitbucketClient;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::models::CommentPayload;

/// Errors from Bitbucket API calls.
#[derive(Error, Debug)]
pub enum BitbucketError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{operation} failed with HTTP {status}: {body}")]
    Api {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("{operation} returned an unreadable response: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },
}

/// The comment Bitbucket created, as echoed back in the response body.
///
/// Only the fields the pipe logs are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CreatedComment {
    #[serde(default)]
    pub id: Option<u64>,
}

/// Fetches the unified diff of the pull request under review.
#[async_trait]
pub trait DiffSource: Send + Sync {
    async fn fetch_diff(&self) -> Result<String, BitbucketError>;
}

/// Posts a comment on the pull request under review.
#[async_trait]
pub trait CommentSink: Send + Sync {
    /// Returns the created comment as Bitbucket echoes it back.
    async fn post_comment(
        &self,
        payload: &CommentPayload,
    ) -> Result<CreatedComment, BitbucketError>;
}
