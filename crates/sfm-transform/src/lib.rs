//! Four-phase transform from SFM text to load-ready lexicon XML.
//!
//! | Phase | Input                    | Output              |
//! |-------|--------------------------|---------------------|
//! | 1     | SFM data + mapping file  | `Phase1Output.xml`, `Phase1Log.xml` |
//! | 2     | phase 1                  | `Phase2Output.xml` (in-field markers) |
//! | 3     | phase 2                  | `Phase3Output.xml` (field normalization) |
//! | 4     | phase 3                  | `Phase4Output.xml` (load-ready) |
//!
//! [`TransformPipeline`] runs the phases in order, resumes from a supplied
//! phase file, polls a [`CancelFlag`] between phases, and hands phase 4 to a
//! [`Loader`].

mod context;
mod error;
pub mod loader;
pub mod log;
pub mod phase1;
pub mod phase2;
pub mod phase3;
pub mod phase4;
pub mod pipeline;

pub use context::ImportContext;
pub use error::{LoadError, PipelineError, TransformError};
pub use loader::{DryRunLoader, LoadOutcome, Loader, load_log_path};
pub use log::{read_phase1_log, write_phase1_log};
pub use pipeline::{
    CancelFlag, NoProgress, Phase, PipelineOutcome, PipelineRun, PipelineState, ProgressSink,
    StartPoint, TransformPipeline,
};
