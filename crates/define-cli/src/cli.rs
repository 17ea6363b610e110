//! CLI argument definitions for definex.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "definex",
    version,
    about = "Inspect Define-XML documents and their value-level metadata",
    long_about = "Inspect CDISC Define-XML v2.0/2.1 documents.\n\n\
                  Summarizes the document, lists datasets, resolves value-level\n\
                  metadata per parameter code and exports the cross-reference graph."
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

    /// VLM options file (TOML).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

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
}

#[derive(Subcommand)]
pub enum Command {
    /// Show study identification, define kind and entity counts.
    Summary(FileArgs),

    /// List the datasets (item groups) of the document.
    Datasets(FileArgs),

    /// Resolve value-level metadata and print the coverage grid.
    Vlm(VlmArgs),

    /// Print the cross-reference graph as JSON.
    Graph(FileArgs),
}

#[derive(Parser)]
pub struct FileArgs {
    /// Path to the define.xml file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Parser)]
pub struct VlmArgs {
    /// Path to the define.xml file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Dataset to process (default: every BASIC DATA STRUCTURE dataset).
    #[arg(long = "dataset", value_name = "NAME")]
    pub dataset: Option<String>,

    /// Print the processed VLM and validation report as JSON.
    #[arg(long = "json")]
    pub json: bool,
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
