//! CLI argument definitions for `sfm-import`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "sfm-import",
    version,
    about = "Import Standard Format Marker dictionaries into a structured lexicon",
    long_about = "Import Standard Format Marker (SFM) dictionary files.\n\n\
                  Scans marker usage, maintains the marker mapping file, and runs the\n\
                  four-phase transform to load-ready lexicon XML with a diagnostic report."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Project file (TOML) supplying default paths, writing systems and custom fields.
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
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
}

#[derive(Subcommand)]
pub enum Command {
    /// Show per-marker statistics for a data file.
    Scan(ScanArgs),

    /// List the classes and fields of a field catalog.
    Fields(FieldsArgs),

    /// Merge a data file with its mapping file and write the result.
    Map(MapArgs),

    /// Check whether a file is a usable mapping file.
    CheckMap(CheckMapArgs),

    /// Run the transform pipeline and write the import report.
    Import(ImportArgs),
}

#[derive(Parser)]
pub struct ScanArgs {
    /// SFM data file (default: `data_file` from the project file).
    #[arg(value_name = "DATA_FILE")]
    pub data: Option<PathBuf>,
}

#[derive(Parser)]
pub struct FieldsArgs {
    /// Field catalog (default: project file, then SFM_FIELD_CATALOG).
    #[arg(long = "catalog", value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    /// Only list this class.
    #[arg(long = "class", value_name = "NAME")]
    pub class: Option<String>,
}

#[derive(Parser)]
pub struct MapArgs {
    /// SFM data file.
    #[arg(value_name = "DATA_FILE")]
    pub data: Option<PathBuf>,

    /// Existing mapping file to merge with.
    #[arg(long = "map", value_name = "PATH")]
    pub map: Option<PathBuf>,

    /// Field catalog.
    #[arg(long = "catalog", value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    /// Where to write the merged mapping file (default: the `--map` path).
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Seed mappings from the catalog's MDF markers instead of an existing file.
    #[arg(long = "seed-defaults")]
    pub seed_defaults: bool,
}

#[derive(Parser)]
pub struct CheckMapArgs {
    /// Mapping file to check.
    #[arg(value_name = "MAP_FILE")]
    pub map: PathBuf,
}

#[derive(Parser)]
pub struct ImportArgs {
    /// SFM data file.
    #[arg(value_name = "DATA_FILE")]
    pub data: Option<PathBuf>,

    /// Mapping file.
    #[arg(long = "map", value_name = "PATH")]
    pub map: Option<PathBuf>,

    /// Field catalog.
    #[arg(long = "catalog", value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    /// Directory for phase files and logs (default: `<DATA_FILE>.import`).
    #[arg(long = "work-dir", value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Resume after this phase using `--phase-file` as its output.
    #[arg(
        long = "after-phase",
        value_name = "N",
        value_parser = clap::value_parser!(u8).range(1..=4),
        requires = "phase_file"
    )]
    pub after_phase: Option<u8>,

    /// Existing output of the phase named by `--after-phase`.
    #[arg(long = "phase-file", value_name = "PATH", requires = "after_phase")]
    pub phase_file: Option<PathBuf>,

    /// Stop after phase 4 without loading.
    #[arg(long = "no-load")]
    pub no_load: bool,

    /// HTML report path (default: `<WORK_DIR>/ImportReport.html`).
    #[arg(long = "report", value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Hide the progress bar.
    #[arg(long = "no-progress")]
    pub no_progress: bool,
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
