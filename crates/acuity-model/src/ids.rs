#![deny(unsafe_code)]

use std::collections::BTreeSet;
use std::fmt;

use crate::ModelError;

/// Internal identifier of a trial participant.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "String")]
pub struct SubjectId(String);

impl TryFrom<String> for SubjectId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl SubjectId {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ModelError::InvalidSubjectId(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one loaded dataset (one study or study part).
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct DatasetId(String);

impl DatasetId {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ModelError::InvalidDatasetId(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Composite key over the set of datasets a request looks at.
///
/// Order of insertion does not matter: `{A, B}` and `{B, A}` are the same key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DatasetsKey(BTreeSet<DatasetId>);

impl DatasetsKey {
    pub fn new(datasets: impl IntoIterator<Item = DatasetId>) -> Result<Self, ModelError> {
        let datasets: BTreeSet<DatasetId> = datasets.into_iter().collect();
        if datasets.is_empty() {
            return Err(ModelError::EmptyDatasetsKey);
        }
        Ok(Self(datasets))
    }

    pub fn single(dataset: DatasetId) -> Self {
        Self(BTreeSet::from([dataset]))
    }

    pub fn datasets(&self) -> impl Iterator<Item = &DatasetId> {
        self.0.iter()
    }

    pub fn contains(&self, dataset: &DatasetId) -> bool {
        self.0.contains(dataset)
    }
}

impl fmt::Display for DatasetsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for dataset in &self.0 {
            if !first {
                f.write_str("+")?;
            }
            f.write_str(dataset.as_str())?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_id_is_trimmed() {
        let id = SubjectId::new("  E01 ").unwrap();
        assert_eq!(id.as_str(), "E01");
    }

    #[test]
    fn blank_subject_id_is_rejected() {
        assert!(matches!(
            SubjectId::new("   "),
            Err(ModelError::InvalidSubjectId(_))
        ));
    }

    #[test]
    fn datasets_key_ignores_order() {
        let a = DatasetId::new("A").unwrap();
        let b = DatasetId::new("B").unwrap();
        let first = DatasetsKey::new([a.clone(), b.clone()]).unwrap();
        let second = DatasetsKey::new([b, a]).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_string(), "A+B");
    }

    #[test]
    fn empty_datasets_key_is_rejected() {
        assert!(DatasetsKey::new(Vec::new()).is_err());
    }
}
