//! Subject construction.
//!
//! A subject is the population row merged with what the other raw tables
//! say about that participant: dosing summaries, death, discontinuation and
//! visit attendance. Records for subjects missing from the population
//! table are ignored.

use std::collections::{BTreeMap, HashMap};

use acuity_model::{
    DatasetId, DeathRow, Discontinuation, DrugDose, PeriodType, PopulationRow, Subject,
    SubjectId, VisitRow,
};
use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::error::{DeriveError, Result};

/// Raw tables that feed subject construction.
#[derive(Debug, Clone, Copy)]
pub struct PopulationSources<'a> {
    pub rows: &'a [PopulationRow],
    pub doses: &'a [DrugDose],
    pub deaths: &'a [DeathRow],
    pub discontinuations: &'a [Discontinuation],
    pub visits: &'a [VisitRow],
}

impl<'a> PopulationSources<'a> {
    pub fn new(rows: &'a [PopulationRow]) -> Self {
        Self {
            rows,
            doses: &[],
            deaths: &[],
            discontinuations: &[],
            visits: &[],
        }
    }

    pub fn with_doses(mut self, doses: &'a [DrugDose]) -> Self {
        self.doses = doses;
        self
    }

    pub fn with_deaths(mut self, deaths: &'a [DeathRow]) -> Self {
        self.deaths = deaths;
        self
    }

    pub fn with_discontinuations(mut self, discontinuations: &'a [Discontinuation]) -> Self {
        self.discontinuations = discontinuations;
        self
    }

    pub fn with_visits(mut self, visits: &'a [VisitRow]) -> Self {
        self.visits = visits;
        self
    }
}

/// Build the subjects of one dataset, ordered by subject id.
pub fn build_population(dataset_id: &DatasetId, sources: PopulationSources<'_>) -> Result<Vec<Subject>> {
    let mut subjects: BTreeMap<SubjectId, Subject> = BTreeMap::new();
    for row in sources.rows {
        if subjects.contains_key(&row.subject_id) {
            return Err(DeriveError::DuplicateSubject {
                dataset_id: dataset_id.clone(),
                subject_id: row.subject_id.clone(),
            });
        }
        subjects.insert(row.subject_id.clone(), subject_from_row(dataset_id, row));
    }

    let mut orphans = 0usize;
    let mut doses_by_subject: HashMap<&SubjectId, Vec<&DrugDose>> = HashMap::new();
    for dose in sources.doses {
        doses_by_subject.entry(&dose.subject_id).or_default().push(dose);
    }
    for (subject_id, doses) in doses_by_subject {
        match subjects.get_mut(subject_id) {
            Some(subject) => apply_doses(subject, &doses),
            None => orphans += doses.len(),
        }
    }

    for death in sources.deaths {
        match subjects.get_mut(&death.subject_id) {
            Some(subject) => {
                if let Some(date) = death.death_date {
                    subject.death_date = Some(subject.death_date.map_or(date, |d| d.min(date)));
                }
            }
            None => orphans += 1,
        }
    }

    for discontinuation in sources.discontinuations {
        match subjects.get_mut(&discontinuation.subject_id) {
            Some(subject) => apply_discontinuation(subject, discontinuation),
            None => orphans += 1,
        }
    }

    for visit in sources.visits {
        match subjects.get_mut(&visit.subject_id) {
            Some(subject) => apply_visit(subject, visit),
            None => orphans += 1,
        }
    }

    if orphans > 0 {
        warn!(
            dataset_id = %dataset_id,
            orphan_records = orphans,
            "records reference subjects missing from the population"
        );
    }
    debug!(
        dataset_id = %dataset_id,
        subject_count = subjects.len(),
        "population built"
    );
    Ok(subjects.into_values().collect())
}

fn subject_from_row(dataset_id: &DatasetId, row: &PopulationRow) -> Subject {
    let mut subject = Subject::new(row.subject_id.clone(), dataset_id.clone());
    if let Some(code) = row.subject_code.as_deref().filter(|code| !code.trim().is_empty()) {
        subject.subject_code = code.trim().to_string();
    }
    subject.study_id = row
        .study_id
        .clone()
        .unwrap_or_else(|| dataset_id.as_str().to_string());
    subject.study_part = row.study_part.clone();
    subject.randomisation_date = row.randomisation_date;
    subject.first_treatment_date = row.first_treatment_date;
    subject.last_treatment_date = row.last_treatment_date;
    subject.withdrawal_date = row.withdrawal_date;
    subject.age = row.age;
    subject.sex = row.sex.clone();
    subject.race = row.race.clone();
    subject.ethnic_group = row.ethnic_group.clone();
    subject.planned_arm = row.planned_arm.clone();
    subject.actual_arm = row.actual_arm.clone();
    subject.cohort = row.cohort.clone();
    subject
}

fn is_administered(dose: &DrugDose) -> bool {
    dose.period_type == PeriodType::Active && dose.dose.is_none_or(|amount| amount > 0.0)
}

fn apply_doses(subject: &mut Subject, doses: &[&DrugDose]) {
    let mut earliest: Option<NaiveDateTime> = None;
    let mut latest: Option<NaiveDateTime> = None;
    for dose in doses {
        let administered = is_administered(dose);
        let dosed = subject.drugs_dosed.entry(dose.drug.clone()).or_insert(false);
        *dosed |= administered;
        if !administered {
            continue;
        }
        if let Some(start) = dose.start_date {
            subject
                .drug_first_dose_date
                .entry(dose.drug.clone())
                .and_modify(|first| *first = (*first).min(start))
                .or_insert(start);
            earliest = Some(earliest.map_or(start, |e| e.min(start)));
        }
        if let Some(end) = dose.end_date.or(dose.start_date) {
            latest = Some(latest.map_or(end, |l| l.max(end)));
        }
        if let Some(amount) = dose.dose {
            let is_new_max = subject
                .drugs_max_dose
                .get(&dose.drug)
                .is_none_or(|max| amount > *max);
            if is_new_max {
                subject.drugs_max_dose.insert(dose.drug.clone(), amount);
                match &dose.frequency {
                    Some(frequency) => {
                        subject
                            .drugs_dosing_frequency
                            .insert(dose.drug.clone(), frequency.clone());
                    }
                    None => {
                        subject.drugs_dosing_frequency.remove(&dose.drug);
                    }
                }
            }
        }
    }
    if subject.first_treatment_date.is_none() {
        subject.first_treatment_date = earliest;
    }
    if subject.last_treatment_date.is_none() {
        subject.last_treatment_date = latest;
    }
}

fn apply_discontinuation(subject: &mut Subject, discontinuation: &Discontinuation) {
    match discontinuation.drug.as_deref().map(str::trim) {
        Some(drug) if !drug.is_empty() => {
            subject.drugs_discontinued.insert(drug.to_string(), true);
        }
        _ => {
            if subject.withdrawal_date.is_none() {
                subject.withdrawal_date = discontinuation.discontinuation_date;
            }
        }
    }
}

fn apply_visit(subject: &mut Subject, visit: &VisitRow) {
    if let Some(number) = visit.visit_number
        && subject.last_visit_number.is_none_or(|last| number > last)
    {
        subject.last_visit_number = Some(number);
    }
    if let Some(date) = visit.visit_date
        && subject.last_visit_date.is_none_or(|last| date > last)
    {
        subject.last_visit_date = Some(date);
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 2, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn sid(id: &str) -> SubjectId {
        SubjectId::new(id).unwrap()
    }

    fn dataset() -> DatasetId {
        DatasetId::new("STUDY1").unwrap()
    }

    fn dose(id: &str, drug: &str, start: u32, amount: f64) -> DrugDose {
        let mut dose = DrugDose::new(id, sid("S1"), drug);
        dose.start_date = Some(day(start));
        dose.end_date = Some(day(start + 1));
        dose.dose = Some(amount);
        dose.frequency = Some(format!("{amount} QD"));
        dose
    }

    #[test]
    fn duplicate_population_rows_are_rejected() {
        let rows = vec![PopulationRow::new(sid("S1")), PopulationRow::new(sid("S1"))];
        let err = build_population(&dataset(), PopulationSources::new(&rows)).unwrap_err();
        assert!(matches!(err, DeriveError::DuplicateSubject { .. }));
    }

    #[test]
    fn dosing_summaries_are_merged() {
        let rows = vec![PopulationRow::new(sid("S1"))];
        let doses = vec![
            dose("D1", "DRUG-A", 3, 10.0),
            dose("D2", "DRUG-A", 6, 20.0),
            dose("D3", "DRUG-B", 8, 0.0),
        ];
        let subjects =
            build_population(&dataset(), PopulationSources::new(&rows).with_doses(&doses))
                .unwrap();
        let subject = &subjects[0];
        assert_eq!(subject.first_treatment_date, Some(day(3)));
        assert_eq!(subject.last_treatment_date, Some(day(7)));
        assert_eq!(subject.drug_first_dose_date.get("DRUG-A"), Some(&day(3)));
        assert_eq!(subject.drugs_max_dose.get("DRUG-A"), Some(&20.0));
        assert_eq!(
            subject.drugs_dosing_frequency.get("DRUG-A").map(String::as_str),
            Some("20 QD")
        );
        assert_eq!(subject.dosed_drugs(), vec!["DRUG-A"]);
        assert_eq!(subject.study_id, "STUDY1");
    }

    #[test]
    fn death_discontinuation_and_visits_are_merged() {
        let mut row = PopulationRow::new(sid("S1"));
        row.first_treatment_date = Some(day(1));
        let rows = vec![row];
        let deaths = vec![DeathRow {
            subject_id: sid("S1"),
            death_date: Some(day(20)),
        }];
        let discontinuations = vec![
            Discontinuation {
                subject_id: sid("S1"),
                drug: Some("DRUG-A".to_string()),
                discontinuation_date: Some(day(10)),
                reason: None,
            },
            Discontinuation {
                subject_id: sid("S1"),
                drug: None,
                discontinuation_date: Some(day(12)),
                reason: Some("Adverse event".to_string()),
            },
        ];
        let visits = vec![
            VisitRow {
                subject_id: sid("S1"),
                visit_number: Some(2.0),
                visit_date: Some(day(8)),
            },
            VisitRow {
                subject_id: sid("S1"),
                visit_number: Some(1.0),
                visit_date: Some(day(4)),
            },
        ];
        let sources = PopulationSources::new(&rows)
            .with_deaths(&deaths)
            .with_discontinuations(&discontinuations)
            .with_visits(&visits);
        let subject = &build_population(&dataset(), sources).unwrap()[0];
        assert!(subject.is_dead());
        assert_eq!(subject.withdrawal_date, Some(day(12)));
        assert_eq!(subject.discontinued_drugs(), vec!["DRUG-A"]);
        assert_eq!(subject.last_visit_number, Some(2.0));
        assert_eq!(subject.last_visit_date, Some(day(8)));
        assert_eq!(subject.first_treatment_date, Some(day(1)));
    }

    #[test]
    fn records_of_unknown_subjects_are_ignored() {
        let rows = vec![PopulationRow::new(sid("S1"))];
        let deaths = vec![DeathRow {
            subject_id: sid("S9"),
            death_date: Some(day(1)),
        }];
        let subjects =
            build_population(&dataset(), PopulationSources::new(&rows).with_deaths(&deaths))
                .unwrap();
        assert_eq!(subjects.len(), 1);
        assert!(!subjects[0].is_dead());
    }
}
