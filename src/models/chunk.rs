//! Per-file diff chunks and the file allowlist used to select them.

use std::fmt;

/// One file's slice of a unified diff.
///
/// Always starts with the delimiter it was split on and runs up to (not
/// including) the next occurrence of that delimiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffChunk {
    text: String,
}

impl DiffChunk {
    /// Wrap already-delimited chunk text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The raw chunk text, delimiter included.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The chunk text with the leading `delimiter` removed.
    ///
    /// Returns the full text when the chunk does not start with `delimiter`.
    pub fn body<'a>(&'a self, delimiter: &str) -> &'a str {
        self.text.strip_prefix(delimiter).unwrap_or(&self.text)
    }
}

impl fmt::Display for DiffChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Ordered list of file paths a review is restricted to.
///
/// An empty allowlist means every chunk is reviewed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileAllowlist {
    files: Vec<String>,
}

impl FileAllowlist {
    /// Build an allowlist from explicit entries. Blank entries are dropped.
    pub fn new<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            files: files
                .into_iter()
                .map(Into::<String>::into)
                .filter(|f| !f.trim().is_empty())
                .collect(),
        }
    }

    /// Parse a comma-separated list such as `src/a.py,src/b.py`.
    pub fn parse(csv: &str) -> Self {
        Self::new(csv.split(',').map(str::trim))
    }

    /// Returns `true` when no filtering should happen.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Iterate over the entries in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }

    /// Whether a chunk body (the header text right after the delimiter)
    /// starts with any allowlisted path.
    ///
    /// This is a raw prefix comparison against the header, so `src/a.py`
    /// also admits `src/a.py.bak`.
    pub fn admits(&self, chunk_body: &str) -> bool {
        self.is_empty() || self.files.iter().any(|f| chunk_body.starts_with(f.as_str()))
    }
}

impl fmt::Display for FileAllowlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.files.join(","))
    }
}
