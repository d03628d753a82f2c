//! The structured review returned by the model.

use indexmap::IndexMap;

/// Parsed model reply: an optional summary plus per-line feedback.
///
/// `suggestions` keeps the order the model emitted its keys in, which is
/// also the order comments are published in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewResult {
    pub summary: Option<String>,
    pub suggestions: IndexMap<String, String>,
}

impl ReviewResult {
    /// The summary, unless it is missing or empty.
    pub fn summary_text(&self) -> Option<&str> {
        self.summary.as_deref().filter(|s| !s.is_empty())
    }

    /// `true` when there is neither a summary nor any suggestion.
    pub fn is_empty(&self) -> bool {
        self.summary_text().is_none() && self.suggestions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_summary_is_treated_as_missing() {
        let review = ReviewResult {
            summary: Some(String::new()),
            suggestions: IndexMap::new(),
        };
        assert_eq!(review.summary_text(), None);
        assert!(review.is_empty());
    }

    #[test]
    fn whitespace_summary_is_kept() {
        let review = ReviewResult {
            summary: Some("  ".to_string()),
            suggestions: IndexMap::new(),
        };
        assert_eq!(review.summary_text(), Some("  "));
        assert!(!review.is_empty());
    }

    #[test]
    fn suggestions_make_review_non_empty() {
        let mut suggestions = IndexMap::new();
        suggestions.insert("a.py:1".to_string(), "fix".to_string());
        let review = ReviewResult {
            summary: None,
            suggestions,
        };
        assert!(!review.is_empty());
    }
}
