use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use sfm_model::Phase1Log;
use sfm_transform::{LoadOutcome, PipelineError, PipelineOutcome, PipelineRun};

use crate::error::Result;
use crate::load_log::{LoadLog, LogTokens};
use crate::stats::{StatsRow, stats_rows};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportTotals {
    pub errors: usize,
    pub warnings: usize,
    pub cautions: usize,
}

/// Everything the report shows, independent of how it is rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub data_file: PathBuf,
    pub generated: DateTime<Local>,
    /// One-line result of the run, e.g. `Loaded 42 objects`.
    pub status: String,
    pub phase1: Phase1Log,
    pub stats: Vec<StatsRow>,
    pub load: Option<LoadLog>,
}

impl ImportReport {
    /// Error and warning totals count every occurrence, including those the
    /// phase 1 log did not list individually.
    pub fn totals(&self) -> ReportTotals {
        let load_warnings = self.load.as_ref().map_or(0, |load| load.warnings.len());
        ReportTotals {
            errors: self.phase1.errors.count,
            warnings: self.phase1.warnings.count + load_warnings,
            cautions: self.phase1.out_of_order.len(),
        }
    }

    pub fn elapsed(&self) -> Option<&str> {
        self.load.as_ref().and_then(|load| load.elapsed.as_deref())
    }
}

/// Builds [`ImportReport`]s from pipeline artefacts.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticReporter {
    tokens: LogTokens,
}

impl DiagnosticReporter {
    pub fn new(tokens: LogTokens) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &LogTokens {
        &self.tokens
    }

    /// Build a report from a phase 1 log and, after a load, the loader's
    /// outcome. A missing phase 1 log yields an empty section.
    pub fn build(
        &self,
        data_file: &Path,
        status: impl Into<String>,
        phase1: Option<&Phase1Log>,
        load: Option<&LoadOutcome>,
    ) -> Result<ImportReport> {
        let phase1 = phase1.cloned().unwrap_or_default();
        let load = match load {
            Some(outcome) => match &outcome.log_path {
                Some(path) => Some(LoadLog::read(path, &self.tokens, outcome)?),
                None => None,
            },
            None => None,
        };
        let report = ImportReport {
            data_file: data_file.to_path_buf(),
            generated: Local::now(),
            status: status.into(),
            stats: stats_rows(&phase1.stats),
            phase1,
            load,
        };
        let totals = report.totals();
        tracing::info!(
            errors = totals.errors,
            warnings = totals.warnings,
            cautions = totals.cautions,
            "import report built"
        );
        Ok(report)
    }

    /// Build a report for a finished run. Logs are processed even when the
    /// run failed; an unreadable load log is reported and skipped.
    pub fn from_run(&self, data_file: &Path, run: &PipelineRun) -> ImportReport {
        let status = describe(&run.outcome);
        let failed_load;
        let load = match (&run.outcome, &run.load_log_path) {
            (PipelineOutcome::Loaded(outcome), _) => Some(outcome),
            (PipelineOutcome::Failed(PipelineError::Load(_)), Some(path)) => {
                failed_load = LoadOutcome::failed(Some(path.clone()));
                Some(&failed_load)
            }
            _ => None,
        };
        match self.build(data_file, status.clone(), run.phase1_log.as_ref(), load) {
            Ok(report) => report,
            Err(error) => {
                tracing::warn!(%error, "load log unavailable; reporting phase 1 only");
                let phase1 = run.phase1_log.clone().unwrap_or_default();
                ImportReport {
                    data_file: data_file.to_path_buf(),
                    generated: Local::now(),
                    status,
                    stats: stats_rows(&phase1.stats),
                    phase1,
                    load: None,
                }
            }
        }
    }
}

fn describe(outcome: &PipelineOutcome) -> String {
    match outcome {
        PipelineOutcome::Loaded(load) => format!("Loaded {} objects", load.objects_created),
        PipelineOutcome::Transformed { phase4 } => {
            format!("Transformed; load-ready XML at {}", phase4.display())
        }
        PipelineOutcome::Cancelled { at } => format!("Cancelled after {at:?}"),
        PipelineOutcome::Failed(error) => format!("Failed: {error}"),
    }
}

#[cfg(test)]
mod tests {
    use sfm_model::{MarkerTally, OutOfOrderCaution};

    use super::*;

    #[test]
    fn totals_include_unlisted_entries_and_load_warnings() {
        let mut phase1 = Phase1Log::default();
        phase1.errors.record(Some(3), "no owner");
        phase1.warnings.record(Some(4), "unmapped");
        phase1.warnings.count += 150;
        phase1.out_of_order.push(OutOfOrderCaution {
            entry: "kala".to_string(),
            class: "Entry".to_string(),
            marker: "dt".to_string(),
            line: 9,
        });
        phase1.stats.push(MarkerTally {
            marker: "lx".to_string(),
            count: 1,
            empty: 0,
        });

        let reporter = DiagnosticReporter::default();
        let mut report = reporter
            .build(Path::new("dict.db"), "Transformed", Some(&phase1), None)
            .unwrap();
        assert_eq!(
            report.totals(),
            ReportTotals {
                errors: 1,
                warnings: 151,
                cautions: 1
            }
        );
        assert_eq!(report.stats.len(), 1);

        report.load = Some(LoadLog {
            warnings: vec![crate::LoadLogLine {
                number: 1,
                kind: crate::LineKind::Warning,
                segments: Vec::new(),
            }],
            ..LoadLog::default()
        });
        assert_eq!(report.totals().warnings, 152);
    }
}
