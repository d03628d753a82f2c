//! Comment publisher: turns a [`ReviewResult`] into pull request comments.

use indexmap::IndexSet;

use crate::bitbucket::{BitbucketError, CommentSink};
use crate::models::{CommentPayload, InlineComment, ReviewResult};

/// What was posted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Distinct paths that received at least one inline comment, in the
    /// order they were first commented on.
    pub commented_files: IndexSet<String>,
    /// Number of inline comments posted.
    pub comments_published: usize,
    pub summary_posted: bool,
}

/// Posts review output through a [`CommentSink`], one request at a time.
pub struct CommentPublisher<'a> {
    sink: &'a dyn CommentSink,
}

impl<'a> CommentPublisher<'a> {
    pub fn new(sink: &'a dyn CommentSink) -> Self {
        Self { sink }
    }

    /// Post the summary (if any), then every well-formed suggestion.
    ///
    /// Stops at the first failed request. Comments already posted stay.
    pub async fn publish(&self, review: &ReviewResult) -> Result<PublishReport, BitbucketError> {
        let summary_posted = match review.summary_text() {
            Some(summary) => {
                self.publish_summary(summary).await?;
                true
            }
            None => false,
        };

        let mut report = self.publish_suggestions(review).await?;
        report.summary_posted = summary_posted;
        Ok(report)
    }

    /// Post a top-level comment.
    pub async fn publish_summary(&self, summary: &str) -> Result<(), BitbucketError> {
        tracing::debug!("Posting summary comment");
        let created = self.sink.post_comment(&CommentPayload::summary(summary)).await?;
        tracing::debug!(id = ?created.id, "Posted summary comment");
        Ok(())
    }

    /// Post one inline comment per suggestion with a valid location key
    /// and a non-empty body. Other entries are skipped.
    pub async fn publish_suggestions(
        &self,
        review: &ReviewResult,
    ) -> Result<PublishReport, BitbucketError> {
        let mut report = PublishReport::default();

        for (key, body) in &review.suggestions {
            let Some(comment) = InlineComment::from_suggestion(key, body) else {
                tracing::debug!("Skipping suggestion with key {key:?}");
                continue;
            };

            let created = self.sink.post_comment(&CommentPayload::inline(&comment)).await?;
            tracing::debug!(id = ?created.id, "Commented on {}:{}", comment.path, comment.line);

            report.comments_published += 1;
            report.commented_files.insert(comment.path);
        }

        Ok(report)
    }
}
