//! CLI entry point for mp-scout.

use anyhow::Result;
use clap::Parser;
use tracing::debug;

mod cli;
mod commands;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?cli, "CLI arguments parsed");

    match &cli.command {
        Command::Verify(args) => commands::run_verify_command(&cli.config, args).await,
        Command::Articles(args) => commands::run_articles_command(&cli.config, args).await,
        Command::Miniprograms(args) => {
            commands::run_miniprograms_command(&cli.config, args).await
        }
        Command::Config(args) => commands::run_config_command(&cli.config, &args.action),
    }
}
