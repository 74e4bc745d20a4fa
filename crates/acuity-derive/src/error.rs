use acuity_model::{DatasetId, SubjectId};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeriveError {
    #[error("event {event_id} has an empty grouping key")]
    MalformedGroupKey { event_id: String },
    #[error("subject {subject_id} appears more than once in the population of {dataset_id}")]
    DuplicateSubject {
        dataset_id: DatasetId,
        subject_id: SubjectId,
    },
}

pub type Result<T> = std::result::Result<T, DeriveError>;
