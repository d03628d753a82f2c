//! Inline comment types and the Bitbucket comment payload.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// `<path>:<line>`, where `path` is everything before the final `:<digits>`.
static LOCATION_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+):(\d+)$").expect("location key regex is valid"));

/// Split a location key such as `src/app.py:42` into path and line.
///
/// Returns `None` when the key has no trailing `:<digits>`, when the line
/// is `0`, or when it does not fit in a `u32`.
pub fn parse_location_key(key: &str) -> Option<(&str, u32)> {
    let caps = LOCATION_KEY_RE.captures(key)?;
    let path = caps.get(1)?.as_str();
    let line: u32 = caps.get(2)?.as_str().parse().ok()?;
    (line >= 1).then_some((path, line))
}

/// A review comment anchored to one line of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineComment {
    pub path: String,
    pub line: u32,
    pub body: String,
}

impl InlineComment {
    /// Build a comment from one `suggestions` entry.
    ///
    /// Returns `None` for malformed keys and empty bodies; such entries are
    /// not comments at all. A whitespace-only body is still a comment.
    pub fn from_suggestion(key: &str, body: &str) -> Option<Self> {
        if body.is_empty() {
            return None;
        }
        let (path, line) = parse_location_key(key)?;
        Some(Self {
            path: path.to_string(),
            line,
            body: body.to_string(),
        })
    }
}

/// Body of `POST /pullrequests/{id}/comments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline: Option<InlineAnchor>,
    pub content: CommentContent,
}

/// Where an inline comment is attached: line `to` of the new file at `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineAnchor {
    pub to: u32,
    pub path: String,
}

/// Markdown comment text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentContent {
    pub raw: String,
}

impl CommentPayload {
    /// A top-level pull request comment.
    pub fn summary(text: impl Into<String>) -> Self {
        Self {
            inline: None,
            content: CommentContent { raw: text.into() },
        }
    }

    /// An inline comment on a specific line.
    pub fn inline(comment: &InlineComment) -> Self {
        Self {
            inline: Some(InlineAnchor {
                to: comment.line,
                path: comment.path.clone(),
            }),
            content: CommentContent {
                raw: comment.body.clone(),
            },
        }
    }

    /// Whether this payload targets a specific line.
    pub fn is_inline(&self) -> bool {
        self.inline.is_some()
    }
}
