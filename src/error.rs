//! Error taxonomy shared by every pipeline stage.

use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of a [`PipelineError`], convenient for matching in callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Schema,
    Fit,
    Serialization,
    Io,
    Parse,
}

/// Errors raised while loading data, training, persisting or scoring a model.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input dataset or model artifact does not exist.
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },
    /// A required column is absent from the dataset.
    #[error("Missing required column `{column}`")]
    Schema { column: String },
    /// The cleaned data cannot be fitted or scored.
    #[error("Model fit failed: {0}")]
    Fit(String),
    /// A model artifact is corrupt or was written by an incompatible version.
    #[error("Invalid model artifact {}: {reason}", path.display())]
    Serialization { path: PathBuf, reason: String },
    /// Filesystem failure while reading or writing.
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The dataset file could not be parsed as delimited text.
    #[error("Failed to parse {}: {source}", path.display())]
    Parse { path: PathBuf, source: csv::Error },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::NotFound { .. } => ErrorKind::NotFound,
            PipelineError::Schema { .. } => ErrorKind::Schema,
            PipelineError::Fit(_) => ErrorKind::Fit,
            PipelineError::Serialization { .. } => ErrorKind::Serialization,
            PipelineError::Io { .. } => ErrorKind::Io,
            PipelineError::Parse { .. } => ErrorKind::Parse,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn serialization(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        PipelineError::Serialization {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
