//! CLI argument definitions.

use std::path::PathBuf;

use acuity_filter::Domain;
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "acuity",
    version,
    about = "Filter and summarise clinical-trial datasets",
    long_about = "Load a clinical-trial dataset from CSV, derive baselines, RECIST \
                  responses, dosing intervals and renal clearance, then query it with \
                  population and event filters."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow subject identifiers and row values in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,

    /// Engine configuration file (TOML).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the queryable domains.
    Domains,

    /// Filter one domain and print the matching events.
    Query(QueryArgs),

    /// Print the filters still available after a query, as JSON.
    Filters(QueryArgs),
}

#[derive(Parser)]
pub struct QueryArgs {
    /// Dataset directory, or a folder containing dataset directories.
    #[arg(value_name = "DIR")]
    pub dataset: PathBuf,

    /// Domain to query.
    #[arg(long = "domain", value_name = "DOMAIN")]
    pub domain: Domain,

    /// Event filters as JSON.
    #[arg(long = "filters", value_name = "FILE")]
    pub filters: Option<PathBuf>,

    /// Population filters as JSON.
    #[arg(long = "population", value_name = "FILE")]
    pub population: Option<PathBuf>,

    /// Maximum number of rows to print.
    #[arg(long = "limit", default_value_t = 25)]
    pub limit: usize,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
