//! Trading assistant CLI
//!
//! Usage:
//!   trader ask [QUESTION]    # interactive session or a single question
//!   trader submit            # batch submission for test questions
//!   trader metrics           # accuracy of a submission

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use trader_utils::{LogFormat, Settings};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    trader_utils::init_tracing_with(filter, format);

    info!("Starting trader");

    match cli.command {
        Commands::Ask(args) => commands::ask::run(&Settings::from_env()?, args).await,
        Commands::Submit(args) => commands::submit::run(&Settings::from_env()?, args).await,
        Commands::Metrics(args) => commands::metrics::run(&args),
    }
}
