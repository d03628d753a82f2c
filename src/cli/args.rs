//! Clap argument types.

use clap::Parser;

/// Review a Bitbucket pull request with a chat-completion model.
///
/// All pipe settings are read from environment variables. Debug logging
/// can also be enabled with `DEBUG=true`.
#[derive(Parser, Debug)]
#[command(
    name = "review-pipe",
    version = review_pipe::constants::VERSION,
    about,
)]
pub struct Cli {
    /// Enable debug logging.
    #[arg(long, default_value_t = false)]
    pub debug: bool,
}
