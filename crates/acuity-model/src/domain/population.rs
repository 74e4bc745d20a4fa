use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::SubjectRecord;
use crate::ids::SubjectId;

/// One row of the population (demography) table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationRow {
    pub subject_id: SubjectId,
    #[serde(default)]
    pub subject_code: Option<String>,
    #[serde(default)]
    pub study_id: Option<String>,
    #[serde(default)]
    pub study_part: Option<String>,
    #[serde(default, with = "crate::datetime::flexible")]
    pub randomisation_date: Option<NaiveDateTime>,
    #[serde(default, with = "crate::datetime::flexible")]
    pub first_treatment_date: Option<NaiveDateTime>,
    #[serde(default, with = "crate::datetime::flexible")]
    pub last_treatment_date: Option<NaiveDateTime>,
    #[serde(default, with = "crate::datetime::flexible")]
    pub withdrawal_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub race: Option<String>,
    #[serde(default)]
    pub ethnic_group: Option<String>,
    #[serde(default)]
    pub planned_arm: Option<String>,
    #[serde(default)]
    pub actual_arm: Option<String>,
    #[serde(default)]
    pub cohort: Option<String>,
}

impl PopulationRow {
    pub fn new(subject_id: SubjectId) -> Self {
        Self {
            subject_id,
            subject_code: None,
            study_id: None,
            study_part: None,
            randomisation_date: None,
            first_treatment_date: None,
            last_treatment_date: None,
            withdrawal_date: None,
            age: None,
            sex: None,
            race: None,
            ethnic_group: None,
            planned_arm: None,
            actual_arm: None,
            cohort: None,
        }
    }
}

impl SubjectRecord for PopulationRow {
    fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathRow {
    pub subject_id: SubjectId,
    #[serde(default, with = "crate::datetime::flexible")]
    pub death_date: Option<NaiveDateTime>,
}

impl SubjectRecord for DeathRow {
    fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }
}

/// A scheduled visit the subject attended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRow {
    pub subject_id: SubjectId,
    #[serde(default)]
    pub visit_number: Option<f64>,
    #[serde(default, with = "crate::datetime::flexible")]
    pub visit_date: Option<NaiveDateTime>,
}

impl SubjectRecord for VisitRow {
    fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }
}
