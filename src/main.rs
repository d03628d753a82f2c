//! review-pipe: AI pull request review for Bitbucket Pipelines.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! ergonomic error propagation and user-facing messages.

mod cli;

use review_pipe::bitbucket::BitbucketClient;
use review_pipe::config::Config;
use review_pipe::constants;
use review_pipe::env::Env;
use review_pipe::orchestrator::{ReviewPipeline, RunOutcome};
use review_pipe::providers::OpenAiClient;
use review_pipe::telemetry;

use std::process;

use anyhow::{Context, Result};
use clap::Parser;

use cli::args::Cli;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let env = Env::real();

    telemetry::init(cli.debug || env.flag(constants::ENV_DEBUG));
    tracing::info!("Executing {} {}", constants::APP_NAME, constants::VERSION);

    let config = Config::load(&env).context("invalid pipe configuration")?;
    tracing::debug!("Configuration: {config:?}");

    let bitbucket = BitbucketClient::new(&config.bitbucket)?;
    let completions = OpenAiClient::new(&config.ai)?;

    let pipeline = ReviewPipeline::new(&config, &bitbucket, &completions, &bitbucket);
    match pipeline.run().await? {
        RunOutcome::NoReviewableChanges => {
            tracing::info!("Nothing to review, pipe stopped");
        }
        RunOutcome::TokenBudgetExceeded { .. } => {
            tracing::info!("Review skipped, pipe stopped");
        }
        RunOutcome::Published(_) => {
            tracing::info!("Pipe finished");
        }
    }

    Ok(())
}
