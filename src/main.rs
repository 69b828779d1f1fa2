//! kline - CLI entry point

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ConfigCommands};

/// Environment variable holding the tracing filter.
const LOG_ENV: &str = "KLINE_LOG";

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("kline=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Parse {
            file,
            chunk_size,
            json,
        } => commands::parse::handle(&file, chunk_size, json),
        Commands::Analyze(args) => commands::analyze::handle(args),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::handle_show(),
            ConfigCommands::Path => commands::config::handle_path(),
            ConfigCommands::Init { force } => commands::config::handle_init(force),
        },
    }
}
