use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{EventRecord, SubjectRecord};
use crate::ids::SubjectId;

/// Kind of a dosing period.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    /// Drug administered at the recorded dose.
    #[default]
    Active,
    /// Gap between doses; dose is zero.
    Inactive,
    /// Drug permanently stopped.
    Discontinued,
}

impl PeriodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodType::Active => "Active",
            PeriodType::Inactive => "Inactive",
            PeriodType::Discontinued => "Discontinued",
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dosing record. Raw rows describe one administration period; after
/// interval reconstruction each record spans one merged interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugDose {
    pub event_id: String,
    pub subject_id: SubjectId,
    pub drug: String,
    #[serde(default, with = "crate::datetime::flexible")]
    pub start_date: Option<NaiveDateTime>,
    #[serde(default, with = "crate::datetime::flexible")]
    pub end_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub dose: Option<f64>,
    #[serde(default)]
    pub dose_unit: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub period_type: PeriodType,
    /// Rank of the merged interval within (subject, drug), starting at 1.
    #[serde(default, skip_deserializing)]
    pub interval_rank: Option<u32>,
    /// Raw records merged into this interval.
    #[serde(default, skip_deserializing)]
    pub source_event_ids: Vec<String>,
}

impl DrugDose {
    pub fn new(event_id: impl Into<String>, subject_id: SubjectId, drug: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            subject_id,
            drug: drug.into(),
            start_date: None,
            end_date: None,
            dose: None,
            dose_unit: None,
            frequency: None,
            period_type: PeriodType::Active,
            interval_rank: None,
            source_event_ids: Vec::new(),
        }
    }

    /// True when both records describe the same regimen.
    pub fn same_regimen(&self, other: &DrugDose) -> bool {
        self.drug == other.drug
            && self.period_type == other.period_type
            && self.dose == other.dose
            && self.dose_unit == other.dose_unit
            && self.frequency == other.frequency
    }
}

impl SubjectRecord for DrugDose {
    fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }
}

impl EventRecord for DrugDose {
    fn event_id(&self) -> &str {
        &self.event_id
    }
}

/// A discontinuation of one drug, or of the whole study when `drug` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discontinuation {
    pub subject_id: SubjectId,
    #[serde(default)]
    pub drug: Option<String>,
    #[serde(default, with = "crate::datetime::flexible")]
    pub discontinuation_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl SubjectRecord for Discontinuation {
    fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }
}
