//! review-pipe: AI pull request review for Bitbucket Pipelines (library crate).
//!
//! Re-exports public modules for integration tests and external use.

pub mod bitbucket;
pub mod config;
pub mod constants;
pub mod diff;
pub mod env;
pub mod models;
pub mod orchestrator;
pub mod output;
pub mod providers;
pub mod review;
pub mod telemetry;
