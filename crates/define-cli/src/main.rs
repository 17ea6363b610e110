//! definex: Define-XML inspection CLI.

use std::io::{self, IsTerminal};

use anyhow::Result;
use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

use define_cli::commands::{dataset_rows, document_summary, load_define, load_options, run_vlm};
use define_cli::logging::{LogConfig, LogFormat, init_logging};
use define_cli::summary::{print_datasets, print_document_summary, print_vlm};
use define_graph::build_graph;

mod cli;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(&cli) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Summary(args) => {
            let import = load_define(&args.file)?;
            let file_name = args.file.display().to_string();
            print_document_summary(&document_summary(&file_name, &import));
        }
        Command::Datasets(args) => {
            let import = load_define(&args.file)?;
            print_datasets(&dataset_rows(&import.define));
        }
        Command::Vlm(args) => {
            let options = load_options(cli.config.as_deref())?;
            let import = load_define(&args.file)?;
            let outputs = run_vlm(&import.define, args.dataset.as_deref(), &options)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&outputs)?);
            } else if outputs.is_empty() {
                println!("No BASIC DATA STRUCTURE datasets found.");
            } else {
                for output in &outputs {
                    print_vlm(output);
                }
            }
        }
        Command::Graph(args) => {
            let import = load_define(&args.file)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&build_graph(&import.define))?
            );
        }
    }
    Ok(())
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
