use std::path::PathBuf;

use thiserror::Error;

use sfm_transform::TransformError;

pub type Result<T> = std::result::Result<T, ReportError>;

/// Reading the artefacts a report is built from failed.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to read load log {path}: {source}")]
    LoadLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read phase 1 log: {0}")]
    Phase1Log(#[from] TransformError),

    #[error("invalid load-log template {template:?}: {source}")]
    Template {
        template: String,
        #[source]
        source: regex::Error,
    },
}
