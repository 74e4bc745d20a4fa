//! End-to-end derivation scenarios.

use std::sync::Arc;

use acuity_derive::{
    DerivationEngine, Measurement, TumourSources, round_to, select_baseline,
};
use acuity_model::{
    Assessment, ClearanceMethod, DatasetId, DrugDose, EngineConfig, Lab, PeriodType, Response,
    Subject, SubjectId, SubjectLookup, TargetLesion,
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;

fn day(offset: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2021, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::days(offset)
}

fn sid() -> SubjectId {
    SubjectId::new("S1").unwrap()
}

fn subject(first_treatment: i64) -> Subject {
    Subject::new(sid(), DatasetId::new("STUDY").unwrap())
        .with_first_treatment_date(Some(day(first_treatment)))
}

fn engine() -> DerivationEngine {
    DerivationEngine::new(EngineConfig::default().sequential())
}

#[test]
fn test_creatinine_without_weight_gives_egfr_only() {
    let subject = subject(0).with_demographics(Some(50), Some("Male"), None);
    let lookup = SubjectLookup::new(&[Arc::new(subject)]);
    let mut lab = Lab::new("LB1", sid(), "CREATININE");
    lab.value = Some(1.2);
    lab.unit = Some("mg/dL".to_string());
    lab.measured_at = Some(day(3));

    let clearances = engine().renal(&[lab], &[], &lookup).unwrap();

    let cg = clearances
        .iter()
        .find(|c| c.method == ClearanceMethod::CockcroftGault)
        .unwrap();
    let egfr = clearances
        .iter()
        .find(|c| c.method == ClearanceMethod::Egfr)
        .unwrap();
    assert_eq!(cg.value, None);
    let expected = round_to(175.0 * 1.2f64.powf(-1.154) * 50f64.powf(-0.203), 2);
    assert_eq!(egfr.value, Some(expected));
    assert!(expected > 0.0);
    assert_eq!(egfr.event_id, "LB1:egfr");
}

#[test]
fn test_single_partial_response_is_confirmed() {
    let lookup = SubjectLookup::new(&[Arc::new(subject(1))]);
    let lesion = |id: &str, offset: i64, visit: f64, diameter: f64| {
        let mut lesion = TargetLesion::new(id, sid(), "1");
        lesion.lesion_date = Some(day(offset));
        lesion.visit_number = Some(visit);
        lesion.diameter = Some(diameter);
        lesion
    };
    let assessment = |visit: f64, offset: i64, response: &str| Assessment {
        subject_id: sid(),
        visit_number: Some(visit),
        visit_date: Some(day(offset)),
        assessment_date: Some(day(offset)),
        response: Some(response.to_string()),
    };
    let sources = TumourSources {
        target_lesions: vec![lesion("T1", 0, 1.0, 40.0), lesion("T2", 42, 2.0, 20.0)],
        assessments: vec![assessment(1.0, 0, "NE"), assessment(2.0, 42, "PR")],
        non_target_lesions: Vec::new(),
    };

    let rows = engine().tumour(sources, &lookup);

    assert_eq!(rows.len(), 2);
    assert!(rows
        .iter()
        .all(|row| row.best_response == Some(Response::PartialResponse)));
    let best: Vec<_> = rows.iter().filter(|row| row.is_best_response).collect();
    assert_eq!(best.len(), 1);
    assert_eq!(best[0].lesion.event_id, "T2");
    assert_eq!(best[0].sum_percentage_change, Some(-50.0));
    assert_eq!(best[0].assessment_week, Some(6));
}

#[test]
fn test_lab_baselines_fill_change() {
    let lookup = SubjectLookup::new(&[Arc::new(subject(10))]);
    let lab = |id: &str, offset: i64, value: f64| {
        let mut lab = Lab::new(id, sid(), "HGB");
        lab.measured_at = Some(day(offset));
        lab.value = Some(value);
        lab
    };
    let labs = vec![lab("L1", 2, 120.0), lab("L2", 9, 0.0), lab("L3", 20, 130.0)];

    let derived = engine().labs(labs, &lookup).unwrap();

    assert!(derived[1].baseline.is_baseline);
    assert_eq!(derived[2].baseline.change_from_baseline, Some(130.0));
    assert_eq!(derived[2].baseline.percent_change_from_baseline, None);
}

#[test]
fn test_overlapping_doses_merge_into_one_interval() {
    let dose = |id: &str, start: i64, end: Option<i64>| {
        let mut dose = DrugDose::new(id, sid(), "DRUG-A");
        dose.start_date = Some(day(start));
        dose.end_date = end.map(day);
        dose.dose = Some(100.0);
        dose.dose_unit = Some("mg".to_string());
        dose.frequency = Some("BID".to_string());
        dose
    };
    let doses = vec![
        dose("D1", 0, Some(14)),
        dose("D2", 14, Some(28)),
        dose("D3", 20, None),
    ];

    let intervals = engine().dosing(doses, &[]);

    assert_eq!(intervals.len(), 1);
    assert_eq!(intervals[0].period_type, PeriodType::Active);
    assert_eq!(intervals[0].start_date, Some(day(0)));
    assert_eq!(intervals[0].end_date, Some(day(28)));
    assert_eq!(intervals[0].interval_rank, Some(1));
}

fn dated_lab(idx: usize, offset: i64) -> Lab {
    let mut lab = Lab::new(format!("L{idx:03}"), sid(), "ALT");
    lab.measured_at = Some(day(offset));
    lab.value = Some(idx as f64);
    lab
}

proptest! {
    #[test]
    fn baseline_is_latest_before_first_treatment_or_earliest_after(
        offsets in prop::collection::vec(-60i64..60, 1..20),
        first_treatment in -30i64..30,
    ) {
        let group: Vec<Lab> = offsets
            .iter()
            .enumerate()
            .map(|(idx, offset)| dated_lab(idx, *offset))
            .collect();
        let cutoff = day(first_treatment);
        let picked = select_baseline(&group, Some(cutoff)).unwrap();
        let picked_at = group[picked].measured_at().unwrap();
        let before: Vec<_> = group
            .iter()
            .filter_map(Measurement::measured_at)
            .filter(|at| *at <= cutoff)
            .collect();
        if let Some(latest) = before.iter().max() {
            prop_assert_eq!(picked_at, *latest);
        } else {
            let earliest = group.iter().filter_map(Measurement::measured_at).min().unwrap();
            prop_assert_eq!(picked_at, earliest);
        }
    }
}
