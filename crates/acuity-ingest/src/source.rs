//! Dataset directories as a raw data source.

use std::path::{Path, PathBuf};

use acuity_filter::{RawDataSource, SourceError, StudyInfoSource};
use acuity_model::{DatasetId, StudyInfo};
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::reader::{CsvRecord, read_records};

/// Optional study metadata file inside a dataset directory.
pub const STUDY_FILE: &str = "study.toml";

/// Serves each dataset from `<root>/<dataset id>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvSource {
    root: PathBuf,
}

impl CsvSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dataset_dir(&self, dataset_id: &DatasetId) -> PathBuf {
        self.root.join(dataset_id.as_str())
    }

    /// Rows of one domain for one dataset.
    pub fn records<R: CsvRecord>(&self, dataset_id: &DatasetId) -> Result<Vec<R>> {
        let dir = self.dataset_dir(dataset_id);
        if !dir.is_dir() {
            return Err(IngestError::DirectoryNotFound { path: dir });
        }
        read_records(&dir.join(R::FILE_NAME))
    }

    /// Study metadata for one dataset; defaults when the file is absent.
    pub fn study(&self, dataset_id: &DatasetId) -> Result<StudyInfo> {
        let path = self.dataset_dir(dataset_id).join(STUDY_FILE);
        if !path.is_file() {
            debug!(path = %path.display(), "no study file");
            return Ok(StudyInfo::default());
        }
        let contents = std::fs::read_to_string(&path).map_err(|source| IngestError::FileRead {
            path: path.clone(),
            source,
        })?;
        StudyInfo::from_toml_str(&contents, &path).map_err(IngestError::StudyFile)
    }
}

impl<R: CsvRecord> RawDataSource<R> for CsvSource {
    fn raw_data(&self, dataset_id: &DatasetId) -> std::result::Result<Vec<R>, SourceError> {
        Ok(self.records(dataset_id)?)
    }
}

impl StudyInfoSource for CsvSource {
    fn study_info(&self, dataset_id: &DatasetId) -> std::result::Result<StudyInfo, SourceError> {
        Ok(self.study(dataset_id)?)
    }
}
