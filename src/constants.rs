//! App-wide constants.
//!
//! Centralises the tool name, endpoints, environment variable names,
//! and token accounting figures so a rename only requires changing this file.

/// Display name of the tool (lowercase).
pub const APP_NAME: &str = "review-pipe";

/// Crate version baked in at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Bitbucket Cloud REST API root.
pub const BITBUCKET_API_BASE_URL: &str = "https://api.bitbucket.org/2.0";

/// Bitbucket web UI root, used for the pull request link in the final log line.
pub const BITBUCKET_WEB_URL: &str = "https://bitbucket.org";

/// Default chat-completions API root.
pub const DEFAULT_AI_BASE_URL: &str = "https://api.openai.com/v1";

/// Model used when `MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Token that opens every per-file section of a unified git diff.
pub const DIFF_DELIMITER: &str = "diff --git a/";

// ── Token accounting ────────────────────────────────────────────────

/// Every message follows `<im_start>{role/name}\n{content}<im_end>\n`.
pub const TOKENS_PER_MESSAGE: usize = 4;

/// Every reply is primed with `<im_start>assistant`.
pub const TOKENS_PER_REPLY: usize = 2;

/// Tokenizer used when the model name is not recognised.
pub const FALLBACK_ENCODING: &str = "cl100k_base";

// ── Environment variable names ──────────────────────────────────────

pub const ENV_BITBUCKET_USERNAME: &str = "BITBUCKET_USERNAME";
pub const ENV_BITBUCKET_APP_PASSWORD: &str = "BITBUCKET_APP_PASSWORD";
pub const ENV_BITBUCKET_ACCESS_TOKEN: &str = "BITBUCKET_ACCESS_TOKEN";
pub const ENV_BITBUCKET_WORKSPACE: &str = "BITBUCKET_WORKSPACE";
pub const ENV_BITBUCKET_REPO_SLUG: &str = "BITBUCKET_REPO_SLUG";
pub const ENV_BITBUCKET_PR_ID: &str = "BITBUCKET_PR_ID";

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_ORGANIZATION: &str = "ORGANIZATION";
pub const ENV_MODEL: &str = "MODEL";
pub const ENV_MESSAGE: &str = "MESSAGE";
pub const ENV_FILES_TO_REVIEW: &str = "FILES_TO_REVIEW";
pub const ENV_COMPLETION_FILEPATH: &str = "CHATGPT_COMPLETION_FILEPATH";
pub const ENV_CLIENT_FILEPATH: &str = "CHATGPT_CLIENT_FILEPATH";
pub const ENV_PROMPT_MAX_TOKENS: &str = "CHATGPT_PROMPT_MAX_TOKENS";
pub const ENV_DEBUG: &str = "DEBUG";
