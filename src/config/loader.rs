//! Config struct and loading logic.
//!
//! Everything is read from pipe variables (environment variables) once at
//! startup. The two optional YAML files are loaded at the same time so a
//! bad path fails the run before any network call is made.
//!
//! Priority for the completion client (highest to lowest):
//! 1. `CHATGPT_CLIENT_FILEPATH` YAML values
//! 2. Environment variables
//! 3. Built-in defaults

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::bitbucket::BitbucketAuth;
use crate::constants;
use crate::env::Env;
use crate::models::FileAllowlist;

use super::params::{self, ClientOptions};

/// Errors during config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "authentication missing: set {} and {}, or {}",
        constants::ENV_BITBUCKET_USERNAME,
        constants::ENV_BITBUCKET_APP_PASSWORD,
        constants::ENV_BITBUCKET_ACCESS_TOKEN
    )]
    MissingAuth,

    #[error("{0} variable is required")]
    MissingVar(&'static str),

    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },

    #[error("file {} doesn't exist", .0.display())]
    MissingFile(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("file {} couldn't be loaded: {source}", .path.display())]
    ParseYaml {
        path: PathBuf,
        source: serde_yaml_ng::Error,
    },

    #[error("file {} must contain a YAML mapping", .0.display())]
    NotAMapping(PathBuf),

    #[error("invalid client parameters in {}: {source}", .path.display())]
    InvalidClientOptions {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Top-level configuration for one pipe run.
#[derive(Debug, Clone)]
pub struct Config {
    pub bitbucket: BitbucketConfig,
    pub ai: AiConfig,
    /// Restricts the review to these paths; empty reviews everything.
    pub files_to_review: FileAllowlist,
}

/// Which pull request to review and how to authenticate.
#[derive(Debug, Clone)]
pub struct BitbucketConfig {
    pub auth: BitbucketAuth,
    pub workspace: String,
    pub repo_slug: String,
    pub pull_request_id: u64,
}

impl BitbucketConfig {
    /// Link to the pull request in the Bitbucket UI.
    pub fn pull_request_url(&self) -> String {
        format!(
            "{}/{}/{}/pull-requests/{}",
            constants::BITBUCKET_WEB_URL,
            self.workspace,
            self.repo_slug,
            self.pull_request_id
        )
    }
}

/// Completion service configuration.
#[derive(Clone)]
pub struct AiConfig {
    pub base_url: String,
    pub api_key: String,
    pub organization: Option<String>,
    pub model: String,
    /// Optional second system instruction.
    pub extra_instruction: Option<String>,
    /// Prompt token ceiling; `0` disables the check.
    pub max_prompt_tokens: usize,
    /// Extra request body fields from `CHATGPT_COMPLETION_FILEPATH`.
    pub completion_params: Map<String, Value>,
    /// Client construction options from `CHATGPT_CLIENT_FILEPATH`.
    pub client: ClientOptions,
}

impl fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("organization", &self.organization)
            .field("model", &self.model)
            .field("extra_instruction", &self.extra_instruction)
            .field("max_prompt_tokens", &self.max_prompt_tokens)
            .field("completion_params", &self.completion_params)
            .field("client", &self.client)
            .finish()
    }
}

impl Config {
    /// Read and validate the full configuration.
    pub fn load(env: &Env) -> Result<Self, ConfigError> {
        let bitbucket = load_bitbucket(env)?;
        let ai = load_ai(env)?;
        let files_to_review = env
            .non_empty(constants::ENV_FILES_TO_REVIEW)
            .map(|csv| FileAllowlist::parse(&csv))
            .unwrap_or_default();

        Ok(Self {
            bitbucket,
            ai,
            files_to_review,
        })
    }
}

/// Resolve Bitbucket credentials. Basic auth wins when both are configured.
pub fn resolve_auth(env: &Env) -> Result<BitbucketAuth, ConfigError> {
    let username = env.non_empty(constants::ENV_BITBUCKET_USERNAME);
    let app_password = env.non_empty(constants::ENV_BITBUCKET_APP_PASSWORD);
    let token = env.non_empty(constants::ENV_BITBUCKET_ACCESS_TOKEN);

    match (username, app_password, token) {
        (Some(username), Some(app_password), _) => Ok(BitbucketAuth::Basic {
            username,
            app_password,
        }),
        (_, _, Some(token)) => Ok(BitbucketAuth::Token(token)),
        _ => Err(ConfigError::MissingAuth),
    }
}

fn load_bitbucket(env: &Env) -> Result<BitbucketConfig, ConfigError> {
    let auth = resolve_auth(env)?;
    let workspace = require(env, constants::ENV_BITBUCKET_WORKSPACE)?;
    let repo_slug = require(env, constants::ENV_BITBUCKET_REPO_SLUG)?;
    let raw_id = require(env, constants::ENV_BITBUCKET_PR_ID)?;
    let pull_request_id = raw_id.parse().map_err(|_| ConfigError::InvalidValue {
        name: constants::ENV_BITBUCKET_PR_ID.to_string(),
        value: raw_id.clone(),
        reason: "expected a pull request number".to_string(),
    })?;

    Ok(BitbucketConfig {
        auth,
        workspace,
        repo_slug,
        pull_request_id,
    })
}

fn load_ai(env: &Env) -> Result<AiConfig, ConfigError> {
    let client = match env.non_empty(constants::ENV_CLIENT_FILEPATH) {
        Some(path) => ClientOptions::load(Path::new(&path))?,
        None => ClientOptions::default(),
    };
    let completion_params = match env.non_empty(constants::ENV_COMPLETION_FILEPATH) {
        Some(path) => params::load_completion_params(Path::new(&path))?,
        None => Map::new(),
    };

    let base_url = client
        .base_url
        .clone()
        .or_else(|| env.non_empty(constants::ENV_BASE_URL))
        .unwrap_or_else(|| constants::DEFAULT_AI_BASE_URL.to_string());
    let api_key = client
        .api_key
        .clone()
        .or_else(|| env.non_empty(constants::ENV_API_KEY))
        .ok_or(ConfigError::MissingVar(constants::ENV_API_KEY))?;
    let organization = client
        .organization
        .clone()
        .or_else(|| env.non_empty(constants::ENV_ORGANIZATION));
    let model = env
        .non_empty(constants::ENV_MODEL)
        .unwrap_or_else(|| constants::DEFAULT_MODEL.to_string());
    let extra_instruction = env.non_empty(constants::ENV_MESSAGE);
    let max_prompt_tokens = parse_token_ceiling(env)?;

    Ok(AiConfig {
        base_url,
        api_key,
        organization,
        model,
        extra_instruction,
        max_prompt_tokens,
        completion_params,
        client,
    })
}

fn parse_token_ceiling(env: &Env) -> Result<usize, ConfigError> {
    match env.non_empty(constants::ENV_PROMPT_MAX_TOKENS) {
        None => Ok(0),
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            name: constants::ENV_PROMPT_MAX_TOKENS.to_string(),
            value: raw.clone(),
            reason: "expected a non-negative integer".to_string(),
        }),
    }
}

fn require(env: &Env, name: &'static str) -> Result<String, ConfigError> {
    env.non_empty(name).ok_or(ConfigError::MissingVar(name))
}
