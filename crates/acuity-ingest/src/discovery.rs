//! Dataset discovery.

use std::path::{Path, PathBuf};

use acuity_model::{DatasetId, DatasetsKey};

use crate::error::{IngestError, Result};
use crate::reader::DOMAIN_FILES;
use crate::source::CsvSource;

/// File every dataset directory must contain.
pub const POPULATION_FILE: &str = "population.csv";

/// Whether `dir` holds a dataset.
pub fn is_dataset_dir(dir: &Path) -> bool {
    dir.join(POPULATION_FILE).is_file()
}

/// Dataset directories directly under `root`, sorted by name.
pub fn discover_datasets(root: &Path) -> Result<Vec<DatasetId>> {
    if !root.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(root).map_err(|e| IngestError::DirectoryRead {
        path: root.to_path_buf(),
        source: e,
    })?;

    let mut datasets = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: root.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_dir() && is_dataset_dir(&path) {
            datasets.push(dataset_id_of(&path)?);
        }
    }
    datasets.sort();
    Ok(datasets)
}

/// Domain files present in a dataset directory.
pub fn list_domain_files(dir: &Path) -> Vec<PathBuf> {
    DOMAIN_FILES
        .iter()
        .map(|file| dir.join(file))
        .filter(|path| path.is_file())
        .collect()
}

/// Open `path` as either one dataset directory or a root of datasets.
pub fn open(path: &Path) -> Result<(CsvSource, DatasetsKey)> {
    if is_dataset_dir(path) {
        let dataset_id = dataset_id_of(path)?;
        let root = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        return Ok((CsvSource::new(root), DatasetsKey::single(dataset_id)));
    }
    let datasets = discover_datasets(path)?;
    let key = DatasetsKey::new(datasets).map_err(|_| IngestError::NoDatasets {
        path: path.to_path_buf(),
    })?;
    Ok((CsvSource::new(path), key))
}

fn dataset_id_of(dir: &Path) -> Result<DatasetId> {
    let name = dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    DatasetId::new(name).map_err(|source| IngestError::InvalidDataset {
        path: dir.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn dataset(root: &Path, name: &str) -> PathBuf {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(POPULATION_FILE), "subject_id\nS1\n").unwrap();
        dir
    }

    #[test]
    fn test_discover_datasets() {
        let root = TempDir::new().unwrap();
        dataset(root.path(), "STUDY_B");
        dataset(root.path(), "STUDY_A");
        std::fs::create_dir(root.path().join("notes")).unwrap();

        let datasets = discover_datasets(root.path()).unwrap();

        let names: Vec<&str> = datasets.iter().map(DatasetId::as_str).collect();
        assert_eq!(names, vec!["STUDY_A", "STUDY_B"]);
    }

    #[test]
    fn test_open_single_dataset() {
        let root = TempDir::new().unwrap();
        let dir = dataset(root.path(), "STUDY_A");
        std::fs::write(dir.join("ae.csv"), "event_id,subject_id\n").unwrap();

        let (source, key) = open(&dir).unwrap();

        assert_eq!(source.root(), root.path());
        assert_eq!(key.to_string(), "STUDY_A");
        assert_eq!(list_domain_files(&dir).len(), 2);
    }

    #[test]
    fn test_open_empty_root_fails() {
        let root = TempDir::new().unwrap();
        let error = open(root.path()).unwrap_err();
        assert!(matches!(error, IngestError::NoDatasets { .. }));
    }
}
