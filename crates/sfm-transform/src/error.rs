use std::path::{Path, PathBuf};

use thiserror::Error;

use sfm_ingest::IngestError;

use crate::pipeline::Phase;

/// A structural transform failed.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML in {path}: {message}")]
    Xml { path: PathBuf, message: String },

    #[error("unexpected content in {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    #[error(transparent)]
    Ingest(#[from] IngestError),
}

impl TransformError {
    pub(crate) fn xml(path: &Path, source: impl std::fmt::Display) -> Self {
        Self::Xml {
            path: path.to_path_buf(),
            message: source.to_string(),
        }
    }

    pub(crate) fn malformed(path: &Path, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

/// The loader collaborator failed.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML in {path}: {message}")]
    Xml { path: PathBuf, message: String },

    #[error("load failed: {message}")]
    Failed { message: String },
}

/// A pipeline failure, classified by the stage that failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("phase 1 (SFM to XML) failed: {0}")]
    Phase1(#[source] TransformError),

    #[error("phase 2 (in-field markers) failed: {0}")]
    Phase2(#[source] TransformError),

    #[error("phase 3 (field normalization) failed: {0}")]
    Phase3(#[source] TransformError),

    #[error("phase 4 (load-ready XML) failed: {0}")]
    Phase4(#[source] TransformError),

    #[error("loading into the lexicon failed: {0}")]
    Load(#[source] LoadError),
}

impl PipelineError {
    pub fn in_phase(phase: Phase, error: TransformError) -> Self {
        match phase {
            Phase::One => Self::Phase1(error),
            Phase::Two => Self::Phase2(error),
            Phase::Three => Self::Phase3(error),
            Phase::Four => Self::Phase4(error),
        }
    }

    /// The phase that failed, or `None` for load failures.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Phase1(_) => Some(Phase::One),
            Self::Phase2(_) => Some(Phase::Two),
            Self::Phase3(_) => Some(Phase::Three),
            Self::Phase4(_) => Some(Phase::Four),
            Self::Load(_) => None,
        }
    }
}
