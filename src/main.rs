//! sfsight CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use clap::Parser;
use std::process::ExitCode;

use sfsight::cli::{Cli, Commands};
use sfsight::core::logging;
use sfsight::storage::{AppPaths, ContextStore};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = cli
        .log_level
        .as_deref()
        .and_then(logging::LogLevel::from_arg)
        .or_else(logging::level_from_env)
        .unwrap_or_default();
    let log_format = if cli.json {
        logging::LogFormat::Json
    } else {
        logging::format_from_env().unwrap_or_default()
    };
    logging::init(log_level, log_format, logging::file_from_env(), cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run(cli: Cli) -> sfsight::Result<()> {
    let paths = cli
        .context_dir
        .map_or_else(AppPaths::new, AppPaths::at);
    let store = ContextStore::new(paths);

    match cli.command {
        Commands::Login(args) => sfsight::cli::login::execute(args, &store).await,
        Commands::Worksheet(cmd) => sfsight::cli::worksheet::execute(cmd, &store).await,
        Commands::Dashboard(cmd) => sfsight::cli::dashboard::execute(cmd, &store).await,
        Commands::Filter(cmd) => sfsight::cli::filter::execute(cmd, &store).await,
        Commands::Folder(cmd) => sfsight::cli::folder::execute(cmd, &store).await,
        Commands::Query(cmd) => sfsight::cli::query::execute(cmd, &store).await,
    }
}
