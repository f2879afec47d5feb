//! Trove CLI - Command-line interface
//!
//! Runs content searches against the configured providers and prints the
//! results as JSON.

mod commands;

use std::path::PathBuf;

use clap::Parser;
use trove_core::CliLogLevel;

#[derive(Parser)]
#[command(name = "trove")]
#[command(about = "Search books, videos, games, music and certificates")]
struct Cli {
    /// Console log level (RUST_LOG overrides)
    #[arg(long, value_enum, default_value_t = CliLogLevel::Warn, global = true)]
    log_level: CliLogLevel,

    /// Directory for the last-run trace log
    #[arg(long, global = true)]
    logs_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    trove_core::init_tracing(cli.log_level.as_tracing_level(), cli.logs_dir.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    commands::handle_command(cli.command).await
}
