//! Study-level metadata.

use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Descriptive information about the study a dataset belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyInfo {
    pub study_id: Option<String>,
    pub study_name: Option<String>,
    pub drug_programme: Option<String>,
    /// When the source data was last refreshed.
    #[serde(with = "crate::datetime::flexible")]
    pub last_updated: Option<NaiveDateTime>,
}

impl StudyInfo {
    pub fn from_toml_str(contents: &str, path: &Path) -> Result<Self> {
        toml::from_str(contents).map_err(|source| ModelError::ConfigToml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Keep `self` where set, otherwise take `other`.
    pub fn or(self, other: StudyInfo) -> StudyInfo {
        StudyInfo {
            study_id: self.study_id.or(other.study_id),
            study_name: self.study_name.or(other.study_name),
            drug_programme: self.drug_programme.or(other.drug_programme),
            last_updated: self.last_updated.or(other.last_updated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_partial_study_file() {
        let info = StudyInfo::from_toml_str(
            "study_id = \"D1234C00001\"\nlast_updated = \"2024-03-01\"\n",
            Path::new("study.toml"),
        )
        .unwrap();
        assert_eq!(info.study_id.as_deref(), Some("D1234C00001"));
        assert_eq!(
            info.last_updated.map(|at| at.date().to_string()),
            Some("2024-03-01".to_string())
        );
        assert_eq!(info.study_name, None);
    }
}
