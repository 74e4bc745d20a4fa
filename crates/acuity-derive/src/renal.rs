//! Creatinine clearance from lab results.
//!
//! Labs whose code marks them as a clearance pass through unchanged.
//! Serum creatinine labs yield two estimates: Cockcroft-Gault, which also
//! needs the subject's weight, and the MDRD eGFR. Both need a positive age
//! and a creatinine value at or above the configured minimum; otherwise
//! the estimate is recorded without a value.

use std::collections::HashMap;

use acuity_model::datetime::days_between;
use acuity_model::{
    BaselineValues, ClearanceMethod, Lab, RenalClearance, RenalOptions, Subject, SubjectId,
    SubjectLookup, Vital,
};
use chrono::NaiveDateTime;
use tracing::debug;

use crate::numeric::round_to;

const MICROMOL_PER_MG_DL: f64 = 88.4;

/// Creatinine unit families the formulas support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatinineUnit {
    MicromolPerLitre,
    MilligramPerDecilitre,
}

impl CreatinineUnit {
    pub fn parse(unit: &str) -> Option<Self> {
        let normalized: String = unit
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        if normalized.contains("umol") || normalized.contains("µmol") || normalized.contains("μmol") {
            Some(Self::MicromolPerLitre)
        } else if normalized.contains("mg/dl") {
            Some(Self::MilligramPerDecilitre)
        } else {
            None
        }
    }
}

/// Patient factors the clearance formulas depend on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatientFactors {
    pub age: Option<f64>,
    pub weight_kg: Option<f64>,
    pub female: bool,
    pub black: bool,
}

impl PatientFactors {
    fn of(subject: &Subject, weight_kg: Option<f64>) -> Self {
        Self {
            age: subject.age.map(f64::from),
            weight_kg,
            female: subject.is_female(),
            black: subject.is_black(),
        }
    }
}

/// Cockcroft-Gault creatinine clearance in mL/min.
pub fn cockcroft_gault(creatinine: f64, unit: CreatinineUnit, factors: &PatientFactors) -> Option<f64> {
    let age = factors.age.filter(|age| *age > 0.0)?;
    let weight = factors.weight_kg.filter(|weight| *weight > 0.0)?;
    if creatinine <= 0.0 {
        return None;
    }
    let value = match unit {
        CreatinineUnit::MicromolPerLitre => {
            let factor = if factors.female { 1.04 } else { 1.23 };
            (140.0 - age) * weight * factor / creatinine
        }
        CreatinineUnit::MilligramPerDecilitre => {
            let factor = if factors.female { 0.85 } else { 1.0 };
            (140.0 - age) * weight * factor / (72.0 * creatinine)
        }
    };
    value.is_finite().then_some(value)
}

/// MDRD estimated GFR in mL/min/1.73m2.
pub fn mdrd_egfr(creatinine: f64, unit: CreatinineUnit, factors: &PatientFactors) -> Option<f64> {
    let age = factors.age.filter(|age| *age > 0.0)?;
    let creatinine_mg_dl = match unit {
        CreatinineUnit::MicromolPerLitre => creatinine / MICROMOL_PER_MG_DL,
        CreatinineUnit::MilligramPerDecilitre => creatinine,
    };
    if creatinine_mg_dl <= 0.0 {
        return None;
    }
    let mut value = 175.0 * creatinine_mg_dl.powf(-1.154) * age.powf(-0.203);
    if factors.female {
        value *= 0.742;
    }
    if factors.black {
        value *= 1.212;
    }
    value.is_finite().then_some(value)
}

fn matches_code(codes: &[String], lab_code: &str) -> bool {
    let lab_code = lab_code.trim();
    codes.iter().any(|code| code.trim().eq_ignore_ascii_case(lab_code))
}

/// Weight measurement closest in time to `at`; the latest one when the lab
/// has no date.
fn nearest_weight(weights: &[&Vital], at: Option<NaiveDateTime>) -> Option<f64> {
    let dated = weights.iter().filter(|vital| vital.value.is_some_and(|v| v > 0.0));
    let chosen = match at {
        Some(at) => dated
            .filter(|vital| vital.measured_at.is_some())
            .min_by_key(|vital| {
                vital
                    .measured_at
                    .map(|measured| days_between(measured, at).abs())
            }),
        None => dated.max_by_key(|vital| vital.measured_at),
    };
    chosen.and_then(|vital| vital.value)
}

/// Derive clearance records from `labs`. Labs of unknown subjects are
/// skipped.
pub fn derive_renal(
    labs: &[Lab],
    vitals: &[Vital],
    subjects: &SubjectLookup,
    options: &RenalOptions,
) -> Vec<RenalClearance> {
    let mut weights: HashMap<&SubjectId, Vec<&Vital>> = HashMap::new();
    for vital in vitals.iter().filter(|vital| vital.is_weight()) {
        weights.entry(&vital.subject_id).or_default().push(vital);
    }

    let mut clearances = Vec::new();
    let mut skipped = 0usize;
    for lab in labs {
        let direct = matches_code(&options.clearance_codes, &lab.lab_code);
        let creatinine = matches_code(&options.creatinine_codes, &lab.lab_code);
        if !direct && !creatinine {
            continue;
        }
        let Some(subject) = subjects.get(&lab.subject_id) else {
            skipped += 1;
            continue;
        };
        if direct {
            let unit = lab
                .unit
                .clone()
                .unwrap_or_else(|| ClearanceMethod::Direct.unit().to_string());
            let value = lab.value.map(|value| round_to(value, options.precision));
            clearances.push(clearance(lab, ClearanceMethod::Direct, value, unit));
            continue;
        }

        let usable = lab
            .value
            .filter(|value| *value >= options.min_creatinine)
            .zip(lab.unit.as_deref().and_then(CreatinineUnit::parse));
        let subject_weights = weights.get(&lab.subject_id).map_or(&[][..], Vec::as_slice);
        let factors = PatientFactors::of(subject, nearest_weight(subject_weights, lab.measured_at));
        let (cg, egfr) = match usable {
            Some((value, unit)) => (
                cockcroft_gault(value, unit, &factors),
                mdrd_egfr(value, unit, &factors),
            ),
            None => (None, None),
        };
        for (method, value) in [
            (ClearanceMethod::CockcroftGault, cg),
            (ClearanceMethod::Egfr, egfr),
        ] {
            let value = value.map(|value| round_to(value, options.precision));
            clearances.push(clearance(lab, method, value, method.unit().to_string()));
        }
    }
    debug!(
        labs = labs.len(),
        clearances = clearances.len(),
        skipped_unknown_subject = skipped,
        "renal clearance derivation complete"
    );
    clearances
}

fn clearance(lab: &Lab, method: ClearanceMethod, value: Option<f64>, unit: String) -> RenalClearance {
    let suffix = match method {
        ClearanceMethod::Direct => "direct",
        ClearanceMethod::CockcroftGault => "cg",
        ClearanceMethod::Egfr => "egfr",
    };
    RenalClearance {
        event_id: format!("{}:{suffix}", lab.event_id),
        source_event_id: lab.event_id.clone(),
        subject_id: lab.subject_id.clone(),
        lab_code: lab.lab_code.clone(),
        method,
        value,
        unit,
        measured_at: lab.measured_at,
        visit_number: lab.visit_number,
        baseline: BaselineValues::default(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use acuity_model::DatasetId;

    use super::*;

    fn subjects() -> SubjectLookup {
        let subject = Subject::new(SubjectId::new("S1").unwrap(), DatasetId::new("STUDY").unwrap())
            .with_demographics(Some(50), Some("Male"), None);
        SubjectLookup::new(&[Arc::new(subject)])
    }

    fn lab(id: &str, code: &str, value: f64, unit: &str) -> Lab {
        let mut lab = Lab::new(id, SubjectId::new("S1").unwrap(), code);
        lab.value = Some(value);
        lab.unit = Some(unit.to_string());
        lab
    }

    fn derive(labs: &[Lab]) -> Vec<RenalClearance> {
        derive_renal(labs, &[], &subjects(), &RenalOptions::default())
    }

    fn male(age: f64, weight: Option<f64>) -> PatientFactors {
        PatientFactors {
            age: Some(age),
            weight_kg: weight,
            female: false,
            black: false,
        }
    }

    #[test]
    fn parses_units() {
        assert_eq!(
            CreatinineUnit::parse("umol/L"),
            Some(CreatinineUnit::MicromolPerLitre)
        );
        assert_eq!(
            CreatinineUnit::parse("mg/dL"),
            Some(CreatinineUnit::MilligramPerDecilitre)
        );
        assert_eq!(CreatinineUnit::parse("g/L"), None);
    }

    #[test]
    fn cockcroft_gault_mg_dl() {
        let value = cockcroft_gault(1.0, CreatinineUnit::MilligramPerDecilitre, &male(68.0, Some(72.0)));
        assert_eq!(value.map(|v| round_to(v, 2)), Some(72.0));
    }

    #[test]
    fn cockcroft_gault_needs_weight_and_age() {
        let unit = CreatinineUnit::MicromolPerLitre;
        assert_eq!(cockcroft_gault(80.0, unit, &male(50.0, None)), None);
        let no_age = PatientFactors {
            age: None,
            ..male(50.0, Some(80.0))
        };
        assert_eq!(cockcroft_gault(80.0, unit, &no_age), None);
        let value = cockcroft_gault(90.0, unit, &male(50.0, Some(80.0))).unwrap();
        assert_eq!(round_to(value, 2), 98.4);
    }

    #[test]
    fn mdrd_units_agree() {
        let factors = male(60.0, None);
        let mg = mdrd_egfr(1.0, CreatinineUnit::MilligramPerDecilitre, &factors).unwrap();
        let umol = mdrd_egfr(88.4, CreatinineUnit::MicromolPerLitre, &factors).unwrap();
        assert!((mg - umol).abs() < 1e-9);
        let female = PatientFactors {
            female: true,
            ..factors
        };
        let female_value = mdrd_egfr(1.0, CreatinineUnit::MilligramPerDecilitre, &female).unwrap();
        assert!((female_value - mg * 0.742).abs() < 1e-9);
    }

    #[test]
    fn clearance_lab_passes_through_rounded() {
        let rows = derive(&[lab("L1", " crcl ", 87.456, "mL/min")]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].method, ClearanceMethod::Direct);
        assert_eq!(rows[0].value, Some(87.46));
        assert_eq!(rows[0].unit, "mL/min");
        assert_eq!(rows[0].source_event_id, "L1");
    }

    #[test]
    fn creatinine_below_minimum_has_no_estimates() {
        let rows = derive(&[lab("L1", "CREAT", 0.00005, "mg/dL")]);
        let methods: Vec<_> = rows.iter().map(|row| row.method).collect();
        assert_eq!(
            methods,
            vec![ClearanceMethod::CockcroftGault, ClearanceMethod::Egfr]
        );
        assert!(rows.iter().all(|row| row.value.is_none()));
    }

    #[test]
    fn creatinine_in_unknown_unit_has_no_estimates() {
        let rows = derive(&[lab("L1", "CREAT", 1.2, "g/L")]);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.value.is_none()));
    }

    #[test]
    fn unrelated_labs_are_ignored() {
        assert!(derive(&[lab("L1", "ALT", 30.0, "U/L")]).is_empty());
    }
}
