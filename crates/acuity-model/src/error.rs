use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    #[error("invalid subject id: '{0}'")]
    InvalidSubjectId(String),
    #[error("invalid dataset id: '{0}'")]
    InvalidDatasetId(String),
    #[error("a datasets key needs at least one dataset")]
    EmptyDatasetsKey,
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse TOML config {path}: {source}")]
    ConfigToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ModelError>;
