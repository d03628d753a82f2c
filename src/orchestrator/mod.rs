//! Review pipeline: fetch diff, select chunks, request review, publish.

use thiserror::Error;

use crate::bitbucket::{BitbucketError, CommentSink, DiffSource};
use crate::config::Config;
use crate::constants;
use crate::diff::{files_with_diffs, select_chunks};
use crate::models::FileAllowlist;
use crate::output::{CommentPublisher, PublishReport};
use crate::providers::CompletionClient;
use crate::review::{ReviewError, ReviewOutcome, ReviewRequester};

/// Errors from a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Bitbucket(#[from] BitbucketError),

    #[error(transparent)]
    Review(#[from] ReviewError),
}

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The diff had no chunks left after filtering.
    NoReviewableChanges,
    /// The prompt was larger than the configured ceiling.
    TokenBudgetExceeded { tokens: usize, limit: usize },
    /// The review was posted.
    Published(PublishReport),
}

/// One pull request review, wired to its collaborators.
pub struct ReviewPipeline<'a> {
    config: &'a Config,
    diffs: &'a dyn DiffSource,
    completions: &'a dyn CompletionClient,
    comments: &'a dyn CommentSink,
}

impl<'a> ReviewPipeline<'a> {
    pub fn new(
        config: &'a Config,
        diffs: &'a dyn DiffSource,
        completions: &'a dyn CompletionClient,
        comments: &'a dyn CommentSink,
    ) -> Self {
        Self {
            config,
            diffs,
            completions,
            comments,
        }
    }

    /// Run the review. Steps execute strictly in order; the first failure
    /// aborts the run.
    pub async fn run(&self) -> Result<RunOutcome, PipelineError> {
        let diff = self.diffs.fetch_diff().await?;
        let chunks = select_chunks(
            &diff,
            constants::DIFF_DELIMITER,
            &self.config.files_to_review,
        );
        let bytes: usize = chunks.iter().map(|c| c.as_str().len()).sum();
        tracing::debug!("Selected {} chunks ({bytes} bytes): {chunks:#?}", chunks.len());

        if chunks.is_empty() {
            tracing::warn!("{}", no_changes_message(&self.config.files_to_review));
            return Ok(RunOutcome::NoReviewableChanges);
        }

        let files = files_with_diffs(&chunks);
        tracing::info!("Files with diffs count {}: {:?}", files.len(), files);

        let requester = ReviewRequester::new(self.completions, &self.config.ai);
        let review = match requester.request(&chunks).await? {
            ReviewOutcome::Skipped { tokens, limit } => {
                tracing::warn!(
                    "The prompt is ~{tokens} tokens, more than the {limit} allowed by {}",
                    constants::ENV_PROMPT_MAX_TOKENS
                );
                return Ok(RunOutcome::TokenBudgetExceeded { tokens, limit });
            }
            ReviewOutcome::Completed {
                review,
                usage,
                elapsed,
            } => {
                tracing::info!("Review took {} seconds", elapsed.as_secs_f64().round());
                if let Some(usage) = usage {
                    tracing::info!(
                        prompt = ?usage.prompt_tokens,
                        completion = ?usage.completion_tokens,
                        total = ?usage.total_tokens,
                        "Completion token usage"
                    );
                }
                review
            }
        };
        if review.is_empty() {
            tracing::warn!("The model returned neither a summary nor any suggestions");
        }

        let report = CommentPublisher::new(self.comments).publish(&review).await?;
        tracing::info!(
            "Commented files count {}: {:?}",
            report.commented_files.len(),
            report.commented_files
        );
        tracing::info!("Added {} inline comments", report.comments_published);
        tracing::info!(
            "Successfully added the review comments to the pull request: {}",
            self.config.bitbucket.pull_request_url()
        );

        Ok(RunOutcome::Published(report))
    }
}

/// Warning for a run with nothing to review, naming the allowlist when one
/// is configured since it is the usual cause.
fn no_changes_message(allowlist: &FileAllowlist) -> String {
    if allowlist.is_empty() {
        "No changes to review".to_string()
    } else {
        format!(
            "No changes to review. Check configuration in {} ({} entries): {allowlist}",
            constants::ENV_FILES_TO_REVIEW,
            allowlist.len()
        )
    }
}
