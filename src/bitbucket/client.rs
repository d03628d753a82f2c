//! Bitbucket Cloud REST client using reqwest.

use async_trait::async_trait;

use crate::config::BitbucketConfig;
use crate::constants;
use crate::models::CommentPayload;

use super::{BitbucketAuth, BitbucketError, CommentSink, CreatedComment, DiffSource};

/// Client scoped to a single pull request.
#[derive(Debug, Clone)]
pub struct BitbucketClient {
    http: reqwest::Client,
    auth: BitbucketAuth,
    pull_request_url: String,
}

impl BitbucketClient {
    /// Client against the public Bitbucket Cloud API.
    pub fn new(config: &BitbucketConfig) -> Result<Self, BitbucketError> {
        let http = reqwest::Client::builder()
            .user_agent(format!("{}/{}", constants::APP_NAME, constants::VERSION))
            .build()
            .map_err(|e| BitbucketError::Client(e.to_string()))?;
        Ok(Self::with_http(http, constants::BITBUCKET_API_BASE_URL, config))
    }

    /// Client with an explicit HTTP client and API root.
    pub fn with_http(http: reqwest::Client, api_base_url: &str, config: &BitbucketConfig) -> Self {
        let pull_request_url = format!(
            "{}/repositories/{}/{}/pullrequests/{}",
            api_base_url.trim_end_matches('/'),
            config.workspace,
            config.repo_slug,
            config.pull_request_id
        );
        Self {
            http,
            auth: config.auth.clone(),
            pull_request_url,
        }
    }

    fn diff_url(&self) -> String {
        format!("{}/diff", self.pull_request_url)
    }

    fn comments_url(&self) -> String {
        format!("{}/comments", self.pull_request_url)
    }
}

#[async_trait]
impl DiffSource for BitbucketClient {
    /// `GET .../pullrequests/{id}/diff`. The body is plain text, not JSON.
    async fn fetch_diff(&self) -> Result<String, BitbucketError> {
        let url = self.diff_url();
        tracing::debug!(%url, auth = self.auth.scheme(), "fetching pull request diff");

        let response = self
            .auth
            .apply(self.http.get(&url))
            .send()
            .await
            .map_err(|e| BitbucketError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(BitbucketError::Api {
                operation: "fetching the pull request diff",
                status: status.as_u16(),
                body,
            });
        }

        response.text().await.map_err(|e| BitbucketError::Transport {
            url,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl CommentSink for BitbucketClient {
    /// `POST .../pullrequests/{id}/comments`.
    async fn post_comment(
        &self,
        payload: &CommentPayload,
    ) -> Result<CreatedComment, BitbucketError> {
        let url = self.comments_url();
        let operation = if payload.is_inline() {
            "posting an inline comment"
        } else {
            "posting the summary comment"
        };

        let response = self
            .auth
            .apply(self.http.post(&url))
            .json(payload)
            .send()
            .await
            .map_err(|e| BitbucketError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(BitbucketError::Api {
                operation,
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<CreatedComment>()
            .await
            .map_err(|e| BitbucketError::Decode {
                operation,
                message: e.to_string(),
            })
    }
}
