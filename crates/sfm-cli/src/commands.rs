use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use tracing::{info, info_span, warn};

use sfm_ingest::MarkerCatalog;
use sfm_map::{ImportSession, is_valid_map_file, read_map_file, seed_descriptor, write_map_file};
use sfm_report::{DiagnosticReporter, ImportReport, write_report};
use sfm_schema::{FieldSchema, StaticSchemaProvider, load_field_catalog};
use sfm_transform::{
    DryRunLoader, ImportContext, Loader, Phase, PipelineOutcome, StartPoint, TransformPipeline,
};

use crate::cli::{CheckMapArgs, FieldsArgs, ImportArgs, MapArgs, ScanArgs};
use crate::config::ImportConfig;
use crate::progress::BarProgress;
use crate::summary::{print_fields, print_mappings, print_scan};

/// Default report file inside the work directory.
pub const REPORT_FILE: &str = "ImportReport.html";

/// How an import run ended, for the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Succeeded,
    Failed,
}

impl RunStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Succeeded => 0,
            RunStatus::Failed => 1,
        }
    }
}

#[derive(Debug)]
pub struct ImportResult {
    pub status: RunStatus,
    pub report: ImportReport,
    pub report_path: PathBuf,
    pub report_written: bool,
    pub work_dir: PathBuf,
}

pub fn run_scan(args: &ScanArgs, config: &ImportConfig) -> Result<MarkerCatalog> {
    let data = config.data_file(args.data.as_deref())?;
    let catalog = MarkerCatalog::scan_file(&data)
        .with_context(|| format!("scan {}", data.display()))?;
    print_scan(&catalog);
    Ok(catalog)
}

pub fn run_fields(args: &FieldsArgs, config: &ImportConfig) -> Result<()> {
    let schema = load_schema(args.catalog.as_deref(), config)?;
    if let Some(class) = args.class.as_deref()
        && schema.class(class).is_none()
    {
        bail!("class {class} is not in the field catalog");
    }
    print_fields(&schema, args.class.as_deref());
    Ok(())
}

/// Merge the data file with its mapping file (or a seeded one) and save.
pub fn run_map(args: &MapArgs, config: &ImportConfig) -> Result<PathBuf> {
    let data = config.data_file(args.data.as_deref())?;
    let map = config.map_file(args.map.as_deref());
    let output = args
        .output
        .clone()
        .or_else(|| map.clone())
        .ok_or_else(|| anyhow!("no mapping file to write: pass --map or --output"))?;
    let schema = load_schema(args.catalog.as_deref(), config)?;
    let span = info_span!("map", data_file = %data.display());
    let _guard = span.enter();

    let source = if args.seed_defaults {
        let catalog = MarkerCatalog::scan_file(&data)
            .with_context(|| format!("scan {}", data.display()))?;
        let seeded = seed_descriptor(&schema, &catalog, &config.writing_systems());
        write_map_file(&seeded, &output)
            .with_context(|| format!("write {}", output.display()))?;
        info!(markers = seeded.fields.len(), "seeded mapping file");
        Some(output.clone())
    } else {
        map
    };

    let mut session = ImportSession::open(
        &data,
        source.as_deref(),
        schema,
        StaticSchemaProvider::new(config.custom_fields.clone()),
        config.writing_systems(),
    )
    .with_context(|| format!("open import session for {}", data.display()))?;
    print_mappings(session.resolver());
    let invalid = session.resolver().validator().invalid_classes();
    if !invalid.is_empty() {
        warn!(classes = %invalid.join(", "), "classes without a begin marker");
    }
    session
        .save(&output)
        .with_context(|| format!("save {}", output.display()))?;
    info!(path = %output.display(), "mapping file saved");
    Ok(output)
}

pub fn run_check_map(args: &CheckMapArgs) -> Result<bool> {
    if !is_valid_map_file(&args.map) {
        println!("{}: not a mapping file", args.map.display());
        return Ok(false);
    }
    let descriptor =
        read_map_file(&args.map).with_context(|| format!("read {}", args.map.display()))?;
    println!(
        "{}: {} markers, {} classes, {} languages",
        args.map.display(),
        descriptor.fields.len(),
        descriptor.hierarchy.len(),
        descriptor.languages.len()
    );
    Ok(true)
}

pub fn run_import(args: &ImportArgs, config: &ImportConfig) -> Result<ImportResult> {
    let data = config.data_file(args.data.as_deref())?;
    let map = config.map_file(args.map.as_deref());
    let schema = load_schema(args.catalog.as_deref(), config)?;
    let start = start_point(args)?;
    let work_dir = args
        .work_dir
        .clone()
        .or_else(|| config.work_dir.clone())
        .unwrap_or_else(|| default_work_dir(&data));

    let session = ImportSession::open(
        &data,
        map.as_deref(),
        schema,
        StaticSchemaProvider::new(config.custom_fields.clone()),
        config.writing_systems(),
    )
    .with_context(|| format!("open import session for {}", data.display()))?;
    session.ensure_complete()?;

    let resolver = session.resolver();
    let descriptor = resolver.to_descriptor();
    let ctx = ImportContext::new(resolver.schema(), &descriptor, resolver.writing_systems());
    let mut pipeline = TransformPipeline::new(ctx, &data, &work_dir);

    let mut progress = BarProgress::new(args.no_progress);
    if let StartPoint::After(phase, _) = &start {
        progress.set_position(completed_units(*phase));
    }
    let mut loader = DryRunLoader::new();
    let loader: Option<&mut dyn Loader> = if args.no_load {
        None
    } else {
        Some(&mut loader as &mut dyn Loader)
    };
    let run = pipeline.run(start, loader, &mut progress);
    progress.finish(if run.is_success() { "done" } else { "stopped" });

    let status = run_status(&run.outcome);
    let report = DiagnosticReporter::new(config.log_tokens()).from_run(&data, &run);
    let report_path = args
        .report
        .clone()
        .unwrap_or_else(|| work_dir.join(REPORT_FILE));
    let report_written = write_report(&report, &report_path);
    if report_written {
        info!(path = %report_path.display(), "report written");
    }
    Ok(ImportResult {
        status,
        report,
        report_path,
        report_written,
        work_dir,
    })
}

/// The command line has no cancel source, so a cancelled run is a failure.
fn run_status(outcome: &PipelineOutcome) -> RunStatus {
    match outcome {
        PipelineOutcome::Loaded(_) | PipelineOutcome::Transformed { .. } => RunStatus::Succeeded,
        PipelineOutcome::Cancelled { at } => {
            warn!(?at, "import cancelled");
            RunStatus::Failed
        }
        PipelineOutcome::Failed(error) => {
            warn!(%error, "import failed");
            RunStatus::Failed
        }
    }
}

fn load_schema(cli: Option<&Path>, config: &ImportConfig) -> Result<FieldSchema> {
    let path = config.field_catalog(cli)?;
    load_field_catalog(&path).with_context(|| format!("load field catalog {}", path.display()))
}

fn start_point(args: &ImportArgs) -> Result<StartPoint> {
    match (args.after_phase, &args.phase_file) {
        (Some(number), Some(file)) => {
            let phase = Phase::from_number(number)
                .ok_or_else(|| anyhow!("no phase {number}; expected 1 to 4"))?;
            Ok(StartPoint::After(phase, file.clone()))
        }
        (None, None) => Ok(StartPoint::Beginning),
        _ => bail!("--after-phase and --phase-file go together"),
    }
}

/// `<DATA_FILE>.import`, next to the data file.
fn default_work_dir(data: &Path) -> PathBuf {
    let mut name = OsString::from(data.as_os_str());
    name.push(".import");
    PathBuf::from(name)
}

/// Progress units already covered when resuming after `phase`.
fn completed_units(phase: Phase) -> u64 {
    Phase::ALL
        .into_iter()
        .filter(|done| *done <= phase)
        .map(|done| u64::from(done.increment()))
        .sum()
}
