//! Configuration loading.
//!
//! Handles pipe variable resolution and the optional YAML parameter files
//! for the completion request and the API client.

pub mod loader;
pub mod params;

pub use loader::{AiConfig, BitbucketConfig, Config, ConfigError};
pub use params::ClientOptions;
