//! `sfm-import` command line.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

use sfm_cli::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use sfm_cli::commands::{run_check_map, run_fields, run_import, run_map, run_scan};
use sfm_cli::config::ImportConfig;
use sfm_cli::logging::{LogConfig, LogFormat, init_logging};
use sfm_cli::summary::print_report;

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let config = match ImportConfig::load_optional(cli.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("error: {error:#}");
            std::process::exit(1);
        }
    };
    let exit_code = match &cli.command {
        Command::Scan(args) => report_error(run_scan(args, &config).map(|_| 0)),
        Command::Fields(args) => report_error(run_fields(args, &config).map(|()| 0)),
        Command::Map(args) => report_error(run_map(args, &config).map(|path| {
            println!("Saved {}", path.display());
            0
        })),
        Command::CheckMap(args) => {
            report_error(run_check_map(args).map(|valid| if valid { 0 } else { 1 }))
        }
        Command::Import(args) => report_error(run_import(args, &config).map(|result| {
            print_report(&result.report);
            if result.report_written {
                println!("Report: {}", result.report_path.display());
            }
            result.status.exit_code()
        })),
    };
    std::process::exit(exit_code);
}

fn report_error(result: anyhow::Result<i32>) -> i32 {
    result.unwrap_or_else(|error| {
        eprintln!("error: {error:#}");
        1
    })
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
