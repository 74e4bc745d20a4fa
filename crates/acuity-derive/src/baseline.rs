//! Baseline derivation for longitudinal measurements.
//!
//! Measurements are grouped by subject and test identity. Within a group
//! the baseline is the latest measurement taken on or before the subject's
//! first treatment, or failing that the earliest one after it. Its value is
//! copied to every member of the group, and change from baseline is filled
//! in for each.

use std::collections::HashMap;

use acuity_model::{
    BaselineValues, ClearanceMethod, Lab, RenalClearance, SubjectId, SubjectLookup, Vital,
};
use chrono::NaiveDateTime;
use tracing::debug;

use crate::error::{DeriveError, Result};
use crate::numeric::{change, percent_change};
use crate::parallel::map_groups;

/// Identity of a baseline group: subject plus test name and any secondary
/// attributes (unit, method, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub subject_id: SubjectId,
    pub parts: Vec<String>,
}

impl GroupKey {
    pub fn new(subject_id: SubjectId, parts: Vec<String>) -> Self {
        Self { subject_id, parts }
    }

    /// A key is malformed when it carries no test identity.
    fn is_well_formed(&self) -> bool {
        self.parts
            .first()
            .is_some_and(|test| !test.trim().is_empty())
    }
}

/// A timestamped measurement that can carry baseline values.
pub trait Measurement: Clone + Send + Sync {
    fn event_id(&self) -> &str;
    fn group_key(&self) -> GroupKey;
    fn measured_at(&self) -> Option<NaiveDateTime>;
    fn value(&self) -> Option<f64>;
    /// Copy of this measurement with `baseline` applied.
    fn with_baseline(&self, baseline: BaselineValues) -> Self;
}

fn unit_part(unit: Option<&String>) -> String {
    unit.map(|unit| unit.trim().to_string()).unwrap_or_default()
}

impl Measurement for Lab {
    fn event_id(&self) -> &str {
        &self.event_id
    }

    fn group_key(&self) -> GroupKey {
        GroupKey::new(
            self.subject_id.clone(),
            vec![self.lab_code.clone(), unit_part(self.unit.as_ref())],
        )
    }

    fn measured_at(&self) -> Option<NaiveDateTime> {
        self.measured_at
    }

    fn value(&self) -> Option<f64> {
        self.value
    }

    fn with_baseline(&self, baseline: BaselineValues) -> Self {
        Self {
            baseline,
            ..self.clone()
        }
    }
}

impl Measurement for Vital {
    fn event_id(&self) -> &str {
        &self.event_id
    }

    fn group_key(&self) -> GroupKey {
        GroupKey::new(
            self.subject_id.clone(),
            vec![self.test_name.clone(), unit_part(self.unit.as_ref())],
        )
    }

    fn measured_at(&self) -> Option<NaiveDateTime> {
        self.measured_at
    }

    fn value(&self) -> Option<f64> {
        self.value
    }

    fn with_baseline(&self, baseline: BaselineValues) -> Self {
        Self {
            baseline,
            ..self.clone()
        }
    }
}

impl Measurement for RenalClearance {
    fn event_id(&self) -> &str {
        &self.event_id
    }

    fn group_key(&self) -> GroupKey {
        let method = match self.method {
            ClearanceMethod::Direct => self.lab_code.clone(),
            method => method.as_str().to_string(),
        };
        GroupKey::new(self.subject_id.clone(), vec![method])
    }

    fn measured_at(&self) -> Option<NaiveDateTime> {
        self.measured_at
    }

    fn value(&self) -> Option<f64> {
        self.value
    }

    fn with_baseline(&self, baseline: BaselineValues) -> Self {
        Self {
            baseline,
            ..self.clone()
        }
    }
}

/// Index of the baseline member of one group.
///
/// Measurements without a timestamp never become baseline. On equal
/// timestamps the lowest event id wins.
pub fn select_baseline<M: Measurement>(
    group: &[M],
    first_treatment: Option<NaiveDateTime>,
) -> Option<usize> {
    let first_treatment = first_treatment?;
    let mut before: Option<(NaiveDateTime, usize)> = None;
    let mut after: Option<(NaiveDateTime, usize)> = None;
    for (idx, measurement) in group.iter().enumerate() {
        let Some(at) = measurement.measured_at() else {
            continue;
        };
        if at <= first_treatment {
            let replace = match before {
                None => true,
                Some((best, best_idx)) => {
                    at > best || (at == best && measurement.event_id() < group[best_idx].event_id())
                }
            };
            if replace {
                before = Some((at, idx));
            }
        } else {
            let replace = match after {
                None => true,
                Some((best, best_idx)) => {
                    at < best || (at == best && measurement.event_id() < group[best_idx].event_id())
                }
            };
            if replace {
                after = Some((at, idx));
            }
        }
    }
    before.or(after).map(|(_, idx)| idx)
}

/// Fill baseline values on every measurement. Output order matches input
/// order.
pub fn derive_baselines<M: Measurement>(
    measurements: Vec<M>,
    subjects: &SubjectLookup,
    precision: u32,
    parallel: bool,
) -> Result<Vec<M>> {
    let total = measurements.len();
    let mut groups: HashMap<GroupKey, Vec<(usize, M)>> = HashMap::new();
    for (position, measurement) in measurements.into_iter().enumerate() {
        let key = measurement.group_key();
        if !key.is_well_formed() {
            return Err(DeriveError::MalformedGroupKey {
                event_id: measurement.event_id().to_string(),
            });
        }
        groups.entry(key).or_default().push((position, measurement));
    }
    let group_count = groups.len();

    let jobs: Vec<(Option<NaiveDateTime>, Vec<(usize, M)>)> = groups
        .into_iter()
        .map(|(key, members)| {
            let first_treatment = subjects
                .get(&key.subject_id)
                .and_then(|subject| subject.first_treatment_date);
            (first_treatment, members)
        })
        .collect();

    let derived = map_groups(jobs, parallel, |(first_treatment, members)| {
        apply_group(members, first_treatment, precision)
    });

    let mut slots: Vec<Option<M>> = (0..total).map(|_| None).collect();
    for (position, measurement) in derived.into_iter().flatten() {
        slots[position] = Some(measurement);
    }
    debug!(
        measurements = total,
        groups = group_count,
        "baseline derivation complete"
    );
    Ok(slots.into_iter().flatten().collect())
}

fn apply_group<M: Measurement>(
    members: Vec<(usize, M)>,
    first_treatment: Option<NaiveDateTime>,
    precision: u32,
) -> Vec<(usize, M)> {
    let group: Vec<M> = members.iter().map(|(_, m)| m.clone()).collect();
    let baseline_idx = select_baseline(&group, first_treatment);
    let baseline_value = baseline_idx.and_then(|idx| group[idx].value());
    members
        .into_iter()
        .enumerate()
        .map(|(idx, (position, measurement))| {
            let values = BaselineValues {
                baseline_value,
                is_baseline: baseline_idx == Some(idx),
                change_from_baseline: change(measurement.value(), baseline_value),
                percent_change_from_baseline: percent_change(
                    measurement.value(),
                    baseline_value,
                    precision,
                ),
            };
            (position, measurement.with_baseline(values))
        })
        .collect()
}
