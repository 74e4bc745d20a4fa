//! Error types for CSV ingestion.

use std::path::PathBuf;

use acuity_model::ModelError;
use thiserror::Error;

/// Errors that can occur while reading a dataset directory.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IngestError {
    /// Directory not found or not readable.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A row could not be parsed into a record.
    #[error("failed to parse {path} at line {}: {source}", line_label(.line))]
    CsvParse {
        path: PathBuf,
        line: Option<u64>,
        #[source]
        source: csv::Error,
    },

    /// The directory name is not a usable dataset identifier.
    #[error("invalid dataset directory {path}: {source}")]
    InvalidDataset {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    /// The study metadata file is malformed.
    #[error(transparent)]
    StudyFile(ModelError),

    /// No dataset directories were found.
    #[error("no datasets found under {path}")]
    NoDatasets { path: PathBuf },
}

fn line_label(line: &Option<u64>) -> String {
    line.map_or_else(|| "?".to_string(), |line| line.to_string())
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
