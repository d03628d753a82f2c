//! Diff selection: chunk splitting, allowlist filtering, and filename extraction.

pub mod filename;
pub mod splitter;

pub use filename::{extract_filename, files_with_diffs};
pub use splitter::{select_chunks, split_chunks};
