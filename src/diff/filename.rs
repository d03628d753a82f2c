//! Filename recovery from `diff --git a/<path> b/<path>` headers.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::DiffChunk;

/// Lazily matches the path between the `a/` and ` b/` prefixes.
static FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"a/(.*?) b/").expect("filename regex is valid"));

/// Extract the file path from a chunk header, if the header has one.
pub fn extract_filename(chunk: &DiffChunk) -> Option<&str> {
    FILENAME_RE
        .captures(chunk.as_str())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Paths of all chunks whose header could be parsed, in chunk order.
///
/// Chunks without a recognisable header are skipped.
pub fn files_with_diffs(chunks: &[DiffChunk]) -> Vec<&str> {
    chunks.iter().filter_map(extract_filename).collect()
}
