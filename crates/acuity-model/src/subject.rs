//! Trial participants.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::datetime::days_between;
use crate::ids::{DatasetId, SubjectId};

/// A trial participant, merged from population, dosing, death,
/// discontinuation and visit records.
///
/// Subjects are built once per dataset load and never change afterwards;
/// events hold them behind `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subject {
    pub subject_id: SubjectId,
    /// Code shown to users (falls back to the subject id).
    pub subject_code: String,
    pub dataset_id: DatasetId,
    pub study_id: String,
    pub study_part: Option<String>,
    pub randomisation_date: Option<NaiveDateTime>,
    pub first_treatment_date: Option<NaiveDateTime>,
    pub last_treatment_date: Option<NaiveDateTime>,
    pub withdrawal_date: Option<NaiveDateTime>,
    pub death_date: Option<NaiveDateTime>,
    pub last_visit_number: Option<f64>,
    pub last_visit_date: Option<NaiveDateTime>,
    pub age: Option<u32>,
    pub sex: Option<String>,
    pub race: Option<String>,
    pub ethnic_group: Option<String>,
    pub planned_arm: Option<String>,
    pub actual_arm: Option<String>,
    pub cohort: Option<String>,
    pub drug_first_dose_date: BTreeMap<String, NaiveDateTime>,
    pub drugs_dosed: BTreeMap<String, bool>,
    pub drugs_discontinued: BTreeMap<String, bool>,
    pub drugs_max_dose: BTreeMap<String, f64>,
    pub drugs_dosing_frequency: BTreeMap<String, String>,
}

impl Subject {
    /// Creates a subject carrying only its identity.
    pub fn new(subject_id: SubjectId, dataset_id: DatasetId) -> Self {
        Self {
            subject_code: subject_id.as_str().to_string(),
            subject_id,
            dataset_id,
            study_id: String::new(),
            study_part: None,
            randomisation_date: None,
            first_treatment_date: None,
            last_treatment_date: None,
            withdrawal_date: None,
            death_date: None,
            last_visit_number: None,
            last_visit_date: None,
            age: None,
            sex: None,
            race: None,
            ethnic_group: None,
            planned_arm: None,
            actual_arm: None,
            cohort: None,
            drug_first_dose_date: BTreeMap::new(),
            drugs_dosed: BTreeMap::new(),
            drugs_discontinued: BTreeMap::new(),
            drugs_max_dose: BTreeMap::new(),
            drugs_dosing_frequency: BTreeMap::new(),
        }
    }

    pub fn with_first_treatment_date(mut self, date: Option<NaiveDateTime>) -> Self {
        self.first_treatment_date = date;
        self
    }

    pub fn with_demographics(
        mut self,
        age: Option<u32>,
        sex: Option<&str>,
        race: Option<&str>,
    ) -> Self {
        self.age = age;
        self.sex = sex.map(str::to_string);
        self.race = race.map(str::to_string);
        self
    }

    /// Days from first treatment to `at`; `None` if either date is unknown.
    pub fn days_on_study(&self, at: Option<NaiveDateTime>) -> Option<i64> {
        Some(days_between(self.first_treatment_date?, at?))
    }

    pub fn is_dead(&self) -> bool {
        self.death_date.is_some()
    }

    pub fn is_female(&self) -> bool {
        self.sex
            .as_deref()
            .is_some_and(|sex| matches!(sex.trim().to_ascii_uppercase().as_str(), "F" | "FEMALE"))
    }

    pub fn is_black(&self) -> bool {
        self.race
            .as_deref()
            .is_some_and(|race| race.to_ascii_uppercase().contains("BLACK"))
    }

    /// Drugs this subject received at least one dose of, in name order.
    pub fn dosed_drugs(&self) -> Vec<&str> {
        self.drugs_dosed
            .iter()
            .filter(|(_, dosed)| **dosed)
            .map(|(drug, _)| drug.as_str())
            .collect()
    }

    pub fn discontinued_drugs(&self) -> Vec<&str> {
        self.drugs_discontinued
            .iter()
            .filter(|(_, discontinued)| **discontinued)
            .map(|(drug, _)| drug.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn subject() -> Subject {
        Subject::new(
            SubjectId::new("E01").unwrap(),
            DatasetId::new("STUDY1").unwrap(),
        )
    }

    #[test]
    fn days_on_study_needs_both_dates() {
        let subject = subject().with_first_treatment_date(Some(date(2020, 1, 10)));
        assert_eq!(subject.days_on_study(Some(date(2020, 1, 15))), Some(5));
        assert_eq!(subject.days_on_study(None), None);
        assert_eq!(self::subject().days_on_study(Some(date(2020, 1, 15))), None);
    }

    #[test]
    fn sex_and_race_helpers() {
        let subject = subject().with_demographics(Some(60), Some("Female"), Some("Black or African American"));
        assert!(subject.is_female());
        assert!(subject.is_black());
        let male = self::subject().with_demographics(Some(60), Some("M"), None);
        assert!(!male.is_female());
        assert!(!male.is_black());
    }

    #[test]
    fn dosed_drugs_only_lists_true_entries() {
        let mut subject = subject();
        subject.drugs_dosed.insert("DRUG-B".to_string(), true);
        subject.drugs_dosed.insert("DRUG-A".to_string(), false);
        assert_eq!(subject.dosed_drugs(), vec!["DRUG-B"]);
    }
}
