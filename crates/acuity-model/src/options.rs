//! Configuration options for derivation and querying.

use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Options for the renal clearance calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenalOptions {
    /// Lab codes whose result already is a creatinine clearance.
    pub clearance_codes: Vec<String>,
    /// Lab codes holding serum creatinine, used by the formula paths.
    pub creatinine_codes: Vec<String>,
    /// Decimal places kept on computed clearances.
    pub precision: u32,
    /// Creatinine values below this are treated as unusable.
    pub min_creatinine: f64,
}

impl Default for RenalOptions {
    fn default() -> Self {
        Self {
            clearance_codes: vec![
                "CRCL".to_string(),
                "CREATININE CLEARANCE".to_string(),
            ],
            creatinine_codes: vec![
                "CREAT".to_string(),
                "CREATININE".to_string(),
                "SERUM CREATININE".to_string(),
            ],
            precision: 2,
            min_creatinine: 0.0001,
        }
    }
}

/// Options for drug-dose interval reconstruction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DosingOptions {
    /// Date used to close open-ended dosing intervals.
    ///
    /// When unset the latest date found in the dataset is used.
    pub last_updated: Option<NaiveDateTime>,
}

/// Options for target-lesion derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TumourOptions {
    /// Decimal places kept on percentage changes.
    pub precision: u32,
}

impl Default for TumourOptions {
    fn default() -> Self {
        Self { precision: 2 }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub renal: RenalOptions,
    pub dosing: DosingOptions,
    pub tumour: TumourOptions,
    /// Fan out per-subject derivations across threads.
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            renal: RenalOptions::default(),
            dosing: DosingOptions::default(),
            tumour: TumourOptions::default(),
            parallel: true,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(contents: &str, path: &Path) -> Result<Self> {
        toml::from_str(contents).map_err(|source| ModelError::ConfigToml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ModelError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents, path)
    }

    pub fn with_last_updated(mut self, last_updated: Option<NaiveDateTime>) -> Self {
        self.dosing.last_updated = last_updated;
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            "parallel = false\n[renal]\nprecision = 3\n",
            Path::new("engine.toml"),
        )
        .unwrap();
        assert!(!config.parallel);
        assert_eq!(config.renal.precision, 3);
        assert_eq!(config.renal.min_creatinine, 0.0001);
        assert_eq!(config.tumour.precision, 2);
    }

    #[test]
    fn invalid_toml_reports_path() {
        let err = EngineConfig::from_toml_str("parallel = ", Path::new("bad.toml")).unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }
}
