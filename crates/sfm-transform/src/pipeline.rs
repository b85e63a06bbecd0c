//! Phase orchestration: ordering, resumption, cancellation, progress.
//!
//! ```text
//! NotStarted -> Phase1 -> Phase2 -> Phase3 -> Phase4 -> Loaded
//!      \___________\_________\_________\_________\---> Cancelled | Failed
//! ```
//!
//! Cancellation is polled between phases only and is refused once loading
//! has begun.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;

use tracing::{debug, info, info_span, warn};

use sfm_ingest::read_sfm_file;
use sfm_model::Phase1Log;
use sfm_schema::xml::{Layout, XmlElement, parse_document, write_document};

use crate::context::ImportContext;
use crate::error::{PipelineError, TransformError};
use crate::loader::{LoadOutcome, Loader, load_log_path};
use crate::log::{read_phase1_log, write_phase1_log};
use crate::{phase1, phase2, phase3, phase4};

pub const PHASE1_LOG: &str = "Phase1Log.xml";
/// Progress units reported for the load step.
pub const LOAD_INCREMENT: u32 = 50;

/// One transform stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    One,
    Two,
    Three,
    Four,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::One, Phase::Two, Phase::Three, Phase::Four];

    pub fn number(self) -> u8 {
        match self {
            Phase::One => 1,
            Phase::Two => 2,
            Phase::Three => 3,
            Phase::Four => 4,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|phase| phase.number() == number)
    }

    /// Output file name, `PhaseNOutput.xml`.
    pub fn file_name(self) -> String {
        format!("Phase{}Output.xml", self.number())
    }

    /// Progress units reported when the phase completes.
    pub fn increment(self) -> u32 {
        match self {
            Phase::One | Phase::Two | Phase::Three => 10,
            Phase::Four => 20,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Phase::One => "Converting SFM data to XML",
            Phase::Two => "Processing in-field markers",
            Phase::Three => "Normalizing fields",
            Phase::Four => "Building load-ready XML",
        }
    }

    fn next(self) -> Option<Self> {
        match self {
            Phase::One => Some(Phase::Two),
            Phase::Two => Some(Phase::Three),
            Phase::Three => Some(Phase::Four),
            Phase::Four => None,
        }
    }

    fn completed_state(self) -> PipelineState {
        match self {
            Phase::One => PipelineState::Phase1,
            Phase::Two => PipelineState::Phase2,
            Phase::Three => PipelineState::Phase3,
            Phase::Four => PipelineState::Phase4,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "phase {}", self.number())
    }
}

/// Last state a run reached. `PhaseN` means phase N's output was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    NotStarted,
    Phase1,
    Phase2,
    Phase3,
    Phase4,
    Loaded,
    Cancelled,
    Failed,
}

/// Where a run begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartPoint {
    /// Phase 1 from the SFM data file.
    Beginning,
    /// Resume after `phase`, using an existing output file of that phase.
    After(Phase, PathBuf),
}

const RUNNING: u8 = 0;
const CANCELLED: u8 = 1;
const LOCKED: u8 = 2;

/// Shared cancellation switch. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    state: Arc<AtomicU8>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run to stop at the next phase boundary. Returns `false` when
    /// loading has already begun and the request is refused.
    pub fn request(&self) -> bool {
        match self
            .state
            .compare_exchange(RUNNING, CANCELLED, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => true,
            Err(current) => current == CANCELLED,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::SeqCst) == CANCELLED
    }

    /// Refuse further cancellation. Returns `false` if a cancellation was
    /// already requested.
    pub fn lock(&self) -> bool {
        match self
            .state
            .compare_exchange(RUNNING, LOCKED, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => true,
            Err(current) => current == LOCKED,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.state.load(Ordering::SeqCst) == LOCKED
    }
}

/// Receives progress as the run advances.
pub trait ProgressSink {
    /// `increment` units of work finished; `message` describes what is next.
    fn step(&mut self, increment: u32, message: &str);
}

/// Discards progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn step(&mut self, _increment: u32, _message: &str) {}
}

impl<F: FnMut(u32, &str)> ProgressSink for F {
    fn step(&mut self, increment: u32, message: &str) {
        self(increment, message)
    }
}

#[derive(Debug)]
pub enum PipelineOutcome {
    /// Every phase ran and the loader accepted phase 4.
    Loaded(LoadOutcome),
    /// Every phase ran; no loader was supplied.
    Transformed { phase4: PathBuf },
    /// Stopped at a phase boundary; `at` is the last completed state.
    Cancelled { at: PipelineState },
    Failed(PipelineError),
}

/// Result of one run. The phase 1 log is attached whenever it exists, even
/// when a later phase or the load failed.
#[derive(Debug)]
pub struct PipelineRun {
    pub outcome: PipelineOutcome,
    pub phase1_log: Option<Phase1Log>,
    pub phase1_log_path: Option<PathBuf>,
    /// Load log left on disk by the loader, whether or not the load succeeded.
    pub load_log_path: Option<PathBuf>,
    pub state: PipelineState,
}

impl PipelineRun {
    pub fn is_success(&self) -> bool {
        matches!(
            self.outcome,
            PipelineOutcome::Loaded(_) | PipelineOutcome::Transformed { .. }
        )
    }
}

/// Runs the four phases for one data file inside one work directory.
#[derive(Debug)]
pub struct TransformPipeline<'a> {
    ctx: ImportContext<'a>,
    data_file: PathBuf,
    work_dir: PathBuf,
    cancel: CancelFlag,
    state: PipelineState,
    load_log: Option<PathBuf>,
}

impl<'a> TransformPipeline<'a> {
    pub fn new(
        ctx: ImportContext<'a>,
        data_file: impl Into<PathBuf>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            ctx,
            data_file: data_file.into(),
            work_dir: work_dir.into(),
            cancel: CancelFlag::new(),
            state: PipelineState::NotStarted,
            load_log: None,
        }
    }

    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn output_path(&self, phase: Phase) -> PathBuf {
        self.work_dir.join(phase.file_name())
    }

    pub fn phase1_log_path(&self) -> PathBuf {
        self.work_dir.join(PHASE1_LOG)
    }

    pub fn run(
        &mut self,
        start: StartPoint,
        loader: Option<&mut dyn Loader>,
        progress: &mut dyn ProgressSink,
    ) -> PipelineRun {
        let run_span = info_span!("pipeline", data_file = %self.data_file.display());
        let _run_guard = run_span.enter();
        let started = Instant::now();

        self.load_log = None;
        let outcome = self.execute(start, loader, progress);
        self.state = match &outcome {
            PipelineOutcome::Loaded(_) => PipelineState::Loaded,
            PipelineOutcome::Transformed { .. } => PipelineState::Phase4,
            PipelineOutcome::Cancelled { .. } => PipelineState::Cancelled,
            PipelineOutcome::Failed(_) => PipelineState::Failed,
        };
        info!(
            state = ?self.state,
            duration_ms = started.elapsed().as_millis(),
            "pipeline finished"
        );

        let log_path = self.phase1_log_path();
        let phase1_log = match read_phase1_log(&log_path) {
            Ok(log) => Some(log),
            Err(error) => {
                debug!(%error, "no phase 1 log to report");
                None
            }
        };
        let load_log_path = match &outcome {
            PipelineOutcome::Loaded(load) => load.log_path.clone(),
            _ => self.load_log.take().filter(|path| path.is_file()),
        };
        PipelineRun {
            outcome,
            phase1_log_path: phase1_log.as_ref().map(|_| log_path),
            phase1_log,
            load_log_path,
            state: self.state,
        }
    }

    fn execute(
        &mut self,
        start: StartPoint,
        loader: Option<&mut dyn Loader>,
        progress: &mut dyn ProgressSink,
    ) -> PipelineOutcome {
        if let Err(source) = fs::create_dir_all(&self.work_dir) {
            let error = TransformError::Write {
                path: self.work_dir.clone(),
                source,
            };
            return PipelineOutcome::Failed(PipelineError::in_phase(Phase::One, error));
        }

        let (mut next, mut input) = match start {
            StartPoint::Beginning => {
                // A log left by an earlier run must not be reported for this one.
                let _ = fs::remove_file(self.phase1_log_path());
                (Some(Phase::One), self.data_file.clone())
            }
            StartPoint::After(phase, file) => {
                info!(resume_after = %phase, file = %file.display(), "resuming pipeline");
                self.state = phase.completed_state();
                (phase.next(), file)
            }
        };

        while let Some(phase) = next {
            if self.cancel.is_cancelled() {
                info!(at = ?self.state, "pipeline cancelled");
                return PipelineOutcome::Cancelled { at: self.state };
            }
            progress.step(0, phase.message());
            let phase_span = info_span!("phase", number = phase.number());
            let result = phase_span.in_scope(|| {
                let start = Instant::now();
                let output = self.run_phase(phase, &input)?;
                info!(
                    output = %output.display(),
                    duration_ms = start.elapsed().as_millis(),
                    "phase complete"
                );
                Ok::<_, TransformError>(output)
            });
            match result {
                Ok(output) => {
                    input = output;
                    self.state = phase.completed_state();
                    progress.step(phase.increment(), &format!("{phase} complete"));
                }
                Err(error) => {
                    warn!(%phase, %error, "phase failed");
                    return PipelineOutcome::Failed(PipelineError::in_phase(phase, error));
                }
            }
            next = phase.next();
        }

        let Some(loader) = loader else {
            return PipelineOutcome::Transformed { phase4: input };
        };
        if !self.cancel.lock() {
            info!(at = ?self.state, "pipeline cancelled before load");
            return PipelineOutcome::Cancelled { at: self.state };
        }
        progress.step(0, "Loading into the lexicon");
        let load_span = info_span!("load", file = %input.display());
        let _load_guard = load_span.enter();
        self.load_log = Some(load_log_path(&input));
        match loader.load(&input, progress) {
            Ok(outcome) => {
                progress.step(LOAD_INCREMENT, "Import complete");
                PipelineOutcome::Loaded(outcome)
            }
            Err(error) => {
                warn!(%error, "load failed");
                PipelineOutcome::Failed(PipelineError::Load(error))
            }
        }
    }

    /// Run one phase from `input`, returning the path of its output.
    fn run_phase(&self, phase: Phase, input: &Path) -> Result<PathBuf, TransformError> {
        let output = self.output_path(phase);
        let document = match phase {
            Phase::One => {
                let fields = read_sfm_file(input)?;
                let (root, log) = phase1::build(&fields, &self.ctx);
                write_phase1_log(&log, &self.phase1_log_path())?;
                root
            }
            Phase::Two => {
                let mut root = read_phase_file(input, phase1::ROOT)?;
                phase2::apply(&mut root, &self.ctx);
                root
            }
            Phase::Three => {
                let mut root = read_phase_file(input, phase1::ROOT)?;
                phase3::apply(&mut root, &self.ctx);
                root
            }
            Phase::Four => {
                let root = read_phase_file(input, phase1::ROOT)?;
                phase4::build(&root, &self.ctx).0
            }
        };
        write_phase_file(&document, &output)?;
        Ok(output)
    }
}

fn read_phase_file(path: &Path, expected_root: &str) -> Result<XmlElement, TransformError> {
    let text = fs::read_to_string(path).map_err(|source| TransformError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let root = parse_document(&text).map_err(|e| TransformError::xml(path, e))?;
    if root.name != expected_root {
        return Err(TransformError::malformed(
            path,
            format!("expected <{expected_root}>, found <{}>", root.name),
        ));
    }
    Ok(root)
}

fn write_phase_file(root: &XmlElement, path: &Path) -> Result<(), TransformError> {
    let text = write_document(root, Layout::Compact).map_err(|e| TransformError::xml(path, e))?;
    fs::write(path, text).map_err(|source| TransformError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_refused_after_lock() {
        let flag = CancelFlag::new();
        let observer = flag.clone();
        assert!(flag.lock());
        assert!(!observer.request());
        assert!(!flag.is_cancelled());
        assert!(flag.is_locked());
    }

    #[test]
    fn lock_fails_after_cancel() {
        let flag = CancelFlag::new();
        assert!(flag.request());
        assert!(flag.request());
        assert!(!flag.lock());
        assert!(flag.is_cancelled());
    }

    #[test]
    fn phases_are_named_and_weighted() {
        let total: u32 = Phase::ALL.iter().map(|p| p.increment()).sum::<u32>() + LOAD_INCREMENT;
        assert_eq!(total, 100);
        assert_eq!(Phase::Three.file_name(), "Phase3Output.xml");
        assert_eq!(Phase::from_number(4), Some(Phase::Four));
        assert_eq!(Phase::from_number(5), None);
    }
}
