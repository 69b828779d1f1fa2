//! CLI definitions for kline
//!
//! This module contains the clap CLI structure definitions, separated from main.rs
//! so the command handlers can take the parsed argument structs directly.

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use kline::session::Gender;

/// Build clap styles.
///
/// - Green: headers, usage, command names
/// - White: descriptions, placeholders (renders as light gray on dark terminals)
pub fn build_cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::White.on_default())
        .valid(AnsiColor::White.on_default())
        .invalid(AnsiColor::Red.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
}

#[derive(Parser)]
#[command(name = "kline")]
#[command(about = "[ Life K-line ] - stream a life chart report and drill from years to days")]
#[command(
    long_about = "Life K-line client - streams a life chart report from a generator endpoint,
shows records as they arrive and drills from years into months and days.

QUICK START:
    kline analyze --birth-date 1990-03-14 --birth-time 08:30 --gender male
    kline analyze ... --drill-year 2024 --drill-month 5
    kline parse report.yaml            Replay a saved report through the parser
    kline config init                  Write the default config file

LOGGING:
    Set KLINE_LOG (e.g. KLINE_LOG=debug) or pass --verbose."
)]
#[command(version, styles = build_cli_styles())]
pub struct Cli {
    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a saved report through the streaming parser
    #[command(long_about = "Replay a saved report through the streaming parser.

The file is fed to the parser in chunks of --chunk-size characters, exactly
as a network stream would deliver it. Fields, tags and records are printed
as soon as they are committed, followed by the reconciled result.

EXAMPLES:
    kline parse report.yaml                 Default 64-character chunks
    kline parse report.yaml --chunk-size 1  One character at a time
    kline parse report.yaml --json          Final result as JSON")]
    Parse {
        /// Report file (restricted YAML)
        file: PathBuf,
        /// Characters per chunk
        #[arg(long, default_value_t = 64)]
        chunk_size: usize,
        /// Print the final result as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Request a report and optionally drill into a year and month
    #[command(long_about = "Request a life chart report and optionally drill down.

The yearly report is streamed first. With --drill-year the record for that
year is activated and its monthly report is requested; with --drill-month
the matching month is activated and its daily report is requested.
Press Ctrl-C to cancel the running request.

EXAMPLES:
    kline analyze --birth-date 1990-03-14 --birth-time 08:30 --gender male
    kline analyze --birth-date 1990-03-14 --birth-time 08:30 --gender female \\
        --drill-year 2024 --drill-month 5
    kline analyze ... --replay-dir ./reports    Offline, from year/month/day.yaml")]
    Analyze(AnalyzeArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Birth date (YYYY-MM-DD)
    #[arg(long)]
    pub birth_date: String,
    /// Birth time (HH:MM)
    #[arg(long)]
    pub birth_time: String,
    /// male or female
    #[arg(long)]
    pub gender: Gender,
    /// Optional name sent with the request
    #[arg(long)]
    pub name: Option<String>,
    /// Override the configured endpoint URL
    #[arg(long, conflicts_with = "replay_dir")]
    pub endpoint: Option<String>,
    /// Read the endpoint body as chat-completions SSE
    #[arg(long)]
    pub sse: bool,
    /// Serve reports from year.yaml / month.yaml / day.yaml in this directory
    #[arg(long)]
    pub replay_dir: Option<PathBuf>,
    /// Replay chunk size in characters
    #[arg(long, default_value_t = 64)]
    pub chunk_size: usize,
    /// Drill into this year after the yearly report
    #[arg(long)]
    pub drill_year: Option<i32>,
    /// Drill into this month of --drill-year
    #[arg(long, requires = "drill_year", value_parser = clap::value_parser!(u32).range(1..=12))]
    pub drill_month: Option<u32>,
    /// Print the final view as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Print the config file path
    Path,
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
