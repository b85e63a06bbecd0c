use std::path::PathBuf;

/// Errors raised while loading a field catalog or mapping file.
///
/// A load that fails never exposes a partially built registry.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML in {path}: {message}")]
    Xml { path: PathBuf, message: String },

    #[error("unexpected root element <{found}> in {path} (expected <{expected}>)")]
    UnexpectedRoot {
        path: PathBuf,
        expected: &'static str,
        found: String,
    },

    #[error("missing required section <{section}> in {path}")]
    MissingSection {
        path: PathBuf,
        section: &'static str,
    },

    #[error("<{element}> is missing attribute '{attribute}' in {path}")]
    MissingAttribute {
        path: PathBuf,
        element: String,
        attribute: &'static str,
    },

    #[error("invalid {attribute} value '{value}' in {path}")]
    InvalidValue {
        path: PathBuf,
        attribute: &'static str,
        value: String,
    },
}

impl SchemaError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn xml(path: impl Into<PathBuf>, source: impl std::fmt::Display) -> Self {
        Self::Xml {
            path: path.into(),
            message: source.to_string(),
        }
    }

    pub fn missing_attribute(
        path: impl Into<PathBuf>,
        element: impl Into<String>,
        attribute: &'static str,
    ) -> Self {
        Self::MissingAttribute {
            path: path.into(),
            element: element.into(),
            attribute,
        }
    }
}
