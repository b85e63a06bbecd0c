use thiserror::Error;

use sfm_ingest::IngestError;
use sfm_schema::SchemaError;

#[derive(Debug, Error)]
pub enum MapError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("no begin marker set for class(es): {}", classes.join(", "))]
    Incomplete { classes: Vec<String> },
}

pub type Result<T> = std::result::Result<T, MapError>;
