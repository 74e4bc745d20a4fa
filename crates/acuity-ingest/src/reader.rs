//! Typed CSV reading.

use std::path::Path;

use acuity_model::{
    AdverseEvent, Assessment, DeathRow, Discontinuation, DrugDose, Lab, NonTargetLesion,
    PopulationRow, TargetLesion, Vital, VisitRow,
};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{IngestError, Result};

/// A raw record stored as one CSV file per dataset.
pub trait CsvRecord: DeserializeOwned + Send + Sync + 'static {
    /// File name inside the dataset directory.
    const FILE_NAME: &'static str;
}

macro_rules! csv_records {
    ($($record:ty => $file:literal),* $(,)?) => {
        $(impl CsvRecord for $record {
            const FILE_NAME: &'static str = $file;
        })*

        /// Every domain file a dataset directory may contain.
        pub const DOMAIN_FILES: &[&str] = &[$($file),*];
    };
}

csv_records! {
    PopulationRow => "population.csv",
    AdverseEvent => "ae.csv",
    Lab => "lab.csv",
    Vital => "vitals.csv",
    TargetLesion => "target_lesion.csv",
    Assessment => "assessment.csv",
    NonTargetLesion => "non_target_lesion.csv",
    DrugDose => "drug_dose.csv",
    Discontinuation => "discontinuation.csv",
    DeathRow => "death.csv",
    VisitRow => "visit.csv",
}

/// Read every row of `path` as `R`.
///
/// A missing file is an empty domain. Headers are trimmed and stripped of
/// a byte-order mark; cells are trimmed and empty cells read as absent.
pub fn read_records<R: CsvRecord>(path: &Path) -> Result<Vec<R>> {
    if !path.is_file() {
        debug!(path = %path.display(), "domain file absent");
        return Ok(Vec::new());
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|source| parse_error(path, source))?;

    let headers: StringRecord = reader
        .headers()
        .map_err(|source| parse_error(path, source))?
        .iter()
        .map(|header| header.trim_matches('\u{feff}').trim().to_ascii_lowercase())
        .collect();
    reader.set_headers(headers);

    let mut records = Vec::new();
    for row in reader.deserialize::<R>() {
        records.push(row.map_err(|source| parse_error(path, source))?);
    }
    debug!(path = %path.display(), rows = records.len(), "domain file read");
    Ok(records)
}

fn parse_error(path: &Path, source: csv::Error) -> IngestError {
    IngestError::CsvParse {
        path: path.to_path_buf(),
        line: source.position().map(csv::Position::line),
        source,
    }
}
