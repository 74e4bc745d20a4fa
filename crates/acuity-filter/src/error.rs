use acuity_derive::DeriveError;
use acuity_model::DatasetId;
use thiserror::Error;

use crate::query::QueryKind;

/// Error reported by a raw data source.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FilterError {
    /// A query of the wrong kind reached a service. Not retryable.
    #[error("expected {expected} query, got {actual} query")]
    QueryKindMismatch {
        expected: QueryKind,
        actual: QueryKind,
    },
    #[error("failed to load {domain} data for dataset {dataset_id}: {source}")]
    Source {
        domain: &'static str,
        dataset_id: DatasetId,
        #[source]
        source: SourceError,
    },
    #[error(transparent)]
    Derive(#[from] DeriveError),
}

pub type Result<T> = std::result::Result<T, FilterError>;
