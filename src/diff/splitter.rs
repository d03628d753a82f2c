//! Splits a raw unified diff into per-file chunks.
//!
//! Works on the text as Bitbucket returns it; no hunk parsing happens here.
//! Every chunk starts with the delimiter and ends right before the next one.

use crate::models::{DiffChunk, FileAllowlist};

/// Split `diff` on every occurrence of `delimiter`.
///
/// Text before the first delimiter is kept as its own chunk (with the
/// delimiter prepended) only when it is non-empty, so a diff without any
/// delimiter yields a single chunk holding the whole input. Empty input
/// yields no chunks.
pub fn split_chunks(diff: &str, delimiter: &str) -> Vec<DiffChunk> {
    if diff.is_empty() {
        return Vec::new();
    }
    if delimiter.is_empty() {
        return vec![DiffChunk::new(diff)];
    }

    let mut parts = diff.split(delimiter);
    let mut chunks = Vec::new();

    if let Some(preamble) = parts.next().filter(|p| !p.is_empty()) {
        chunks.push(DiffChunk::new(format!("{delimiter}{preamble}")));
    }
    chunks.extend(parts.map(|part| DiffChunk::new(format!("{delimiter}{part}"))));

    chunks
}

/// Split `diff` and keep only the chunks the allowlist admits.
///
/// The allowlist is compared against the raw header text that follows the
/// delimiter, not against a normalised path.
pub fn select_chunks(diff: &str, delimiter: &str, allowlist: &FileAllowlist) -> Vec<DiffChunk> {
    split_chunks(diff, delimiter)
        .into_iter()
        .filter(|chunk| allowlist.admits(chunk.body(delimiter)))
        .collect()
}
