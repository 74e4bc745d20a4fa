//! Assessed target lesions.
//!
//! Per subject, target-lesion measurements are grouped into visits by
//! lesion date. The baseline visit is found by baseline-date selection;
//! measurements without a date or dated before baseline are left out, as
//! are later visits where no lesion was measured.
//! Every remaining lesion gets its change from baseline, its visit's sum of
//! diameters and the sum's change, the visit response and the subject's
//! best response.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use acuity_model::{
    AssessedTargetLesion, Assessment, NonTargetLesion, Response, SubjectId, SubjectLookup,
    TargetLesion, TumourOptions,
};
use chrono::NaiveDateTime;
use tracing::debug;

use crate::baseline_date::select_baseline_date;
use crate::frequency::{assessment_frequency, assessment_week};
use crate::numeric::{change, percent_change};
use crate::parallel::map_groups;
use crate::recist::{VisitOutcome, best_response, non_target_response, same_visit, visit_response};

/// Raw tumour tables of one dataset.
#[derive(Debug, Clone, Default)]
pub struct TumourSources {
    pub target_lesions: Vec<TargetLesion>,
    pub assessments: Vec<Assessment>,
    pub non_target_lesions: Vec<NonTargetLesion>,
}

struct SubjectTumours {
    first_treatment: Option<NaiveDateTime>,
    lesions: Vec<TargetLesion>,
    assessments: Vec<Assessment>,
    non_target_lesions: Vec<NonTargetLesion>,
}

struct Visit {
    date: NaiveDateTime,
    is_baseline: bool,
    lesions: Vec<TargetLesion>,
}

impl Visit {
    /// Sum of diameters; `None` when no lesion was measured.
    fn sum(&self) -> Option<f64> {
        let measured: Vec<f64> = self.lesions.iter().filter_map(|l| l.diameter).collect();
        (!measured.is_empty()).then(|| measured.iter().sum())
    }

    fn measured_lesion_ids(&self) -> BTreeSet<&str> {
        self.lesions
            .iter()
            .filter(|lesion| lesion.diameter.is_some())
            .map(|lesion| lesion.lesion_id.as_str())
            .collect()
    }

    fn visit_number(&self) -> Option<f64> {
        self.lesions.iter().find_map(|lesion| lesion.visit_number)
    }

    fn visit_date(&self) -> NaiveDateTime {
        self.lesions
            .iter()
            .find_map(|lesion| lesion.visit_date)
            .unwrap_or(self.date)
    }
}

/// Derive assessed target lesions for every subject.
pub fn assess_target_lesions(
    sources: TumourSources,
    subjects: &SubjectLookup,
    options: &TumourOptions,
    parallel: bool,
) -> Vec<AssessedTargetLesion> {
    let mut by_subject: BTreeMap<SubjectId, SubjectTumours> = BTreeMap::new();
    for lesion in sources.target_lesions {
        tumours_of(&mut by_subject, subjects, &lesion.subject_id)
            .lesions
            .push(lesion);
    }
    for assessment in sources.assessments {
        tumours_of(&mut by_subject, subjects, &assessment.subject_id)
            .assessments
            .push(assessment);
    }
    for lesion in sources.non_target_lesions {
        tumours_of(&mut by_subject, subjects, &lesion.subject_id)
            .non_target_lesions
            .push(lesion);
    }

    let jobs: Vec<SubjectTumours> = by_subject
        .into_values()
        .filter(|tumours| !tumours.lesions.is_empty())
        .collect();
    let subject_count = jobs.len();
    let precision = options.precision;
    let assessed: Vec<AssessedTargetLesion> =
        map_groups(jobs, parallel, |tumours| assess_subject(tumours, precision))
            .into_iter()
            .flatten()
            .collect();
    debug!(
        subjects = subject_count,
        assessed_lesions = assessed.len(),
        "target lesion assessment complete"
    );
    assessed
}

fn tumours_of<'m>(
    by_subject: &'m mut BTreeMap<SubjectId, SubjectTumours>,
    subjects: &SubjectLookup,
    subject_id: &SubjectId,
) -> &'m mut SubjectTumours {
    by_subject
        .entry(subject_id.clone())
        .or_insert_with(|| SubjectTumours {
            first_treatment: subjects
                .get(subject_id)
                .and_then(|subject| subject.first_treatment_date),
            lesions: Vec::new(),
            assessments: Vec::new(),
            non_target_lesions: Vec::new(),
        })
}

fn assess_subject(tumours: SubjectTumours, precision: u32) -> Vec<AssessedTargetLesion> {
    let SubjectTumours {
        first_treatment,
        lesions,
        assessments,
        non_target_lesions,
    } = tumours;

    let dates = lesions.iter().filter_map(|lesion| lesion.lesion_date);
    let Some(baseline_date) = select_baseline_date(dates, first_treatment) else {
        return lesions
            .into_iter()
            .map(AssessedTargetLesion::unassessed)
            .collect();
    };

    let mut grouped: BTreeMap<NaiveDateTime, Vec<TargetLesion>> = BTreeMap::new();
    for lesion in lesions {
        match lesion.lesion_date {
            Some(date) if date >= baseline_date => grouped.entry(date).or_default().push(lesion),
            _ => {}
        }
    }
    let visits: Vec<Visit> = grouped
        .into_iter()
        .map(|(date, mut lesions)| {
            lesions.sort_by(|a, b| a.lesion_id.cmp(&b.lesion_id));
            Visit {
                date,
                is_baseline: date == baseline_date,
                lesions,
            }
        })
        .filter(|visit| visit.is_baseline || visit.sum().is_some())
        .collect();

    let Some(baseline_visit) = visits.iter().find(|visit| visit.is_baseline) else {
        return Vec::new();
    };
    let baseline_sum = baseline_visit.sum();
    let baseline_ids: BTreeSet<String> = baseline_visit
        .measured_lesion_ids()
        .into_iter()
        .map(str::to_string)
        .collect();
    let baseline_diameters: HashMap<String, Option<f64>> = baseline_visit
        .lesions
        .iter()
        .map(|lesion| (lesion.lesion_id.clone(), lesion.diameter))
        .collect();

    let missing: Vec<bool> = visits
        .iter()
        .map(|visit| {
            !visit.is_baseline
                && visit
                    .measured_lesion_ids()
                    .into_iter()
                    .ne(baseline_ids.iter().map(String::as_str))
        })
        .collect();
    let any_missing = missing.iter().any(|flag| *flag);

    let visit_sums: Vec<Option<f64>> = visits.iter().map(Visit::sum).collect();
    let sum_changes: Vec<Option<f64>> = visit_sums
        .iter()
        .map(|sum| percent_change(*sum, baseline_sum, precision))
        .collect();
    let best_percentage_change = if any_missing {
        None
    } else {
        visits
            .iter()
            .zip(&sum_changes)
            .filter(|(visit, _)| !visit.is_baseline)
            .filter_map(|(_, pct)| *pct)
            .min_by(f64::total_cmp)
    };

    let dates: Vec<NaiveDateTime> = visits.iter().map(|visit| visit.date).collect();
    let frequency = assessment_frequency(&dates);

    let mut outcomes = Vec::with_capacity(visits.len());
    let mut per_visit = Vec::with_capacity(visits.len());
    for (idx, visit) in visits.iter().enumerate() {
        let visit_number = visit.visit_number();
        let visit_date = Some(visit.visit_date());
        let assessment = assessments
            .iter()
            .find(|assessment| same_visit(*assessment, visit_number, visit_date));
        let response = visit_response(visit.is_baseline, missing[idx], assessment);
        let non_target = non_target_response(
            non_target_lesions
                .iter()
                .filter(|lesion| same_visit(*lesion, visit_number, visit_date)),
        );
        outcomes.push(VisitOutcome {
            lesion_date: visit.date,
            assessment_date: assessment.and_then(|a| a.assessment_date.or(a.visit_date)),
            is_baseline: visit.is_baseline,
            response: response.clone(),
        });
        per_visit.push((response, non_target));
    }
    let best = best_response(&outcomes, any_missing);

    let mut assessed = Vec::new();
    for ((idx, visit), (response, non_target)) in
        visits.into_iter().enumerate().zip(per_visit)
    {
        let week = assessment_week(baseline_date, visit.date, frequency);
        for lesion in visit.lesions {
            let baseline_diameter = baseline_diameters.get(&lesion.lesion_id).copied().flatten();
            let mut row = AssessedTargetLesion::unassessed(lesion);
            row.baseline_date = Some(baseline_date);
            row.is_baseline = visit.is_baseline;
            row.baseline_diameter = baseline_diameter;
            row.lesion_change_from_baseline = change(row.lesion.diameter, baseline_diameter);
            row.lesion_percentage_change =
                percent_change(row.lesion.diameter, baseline_diameter, precision);
            row.sum_diameters = visit_sums[idx];
            row.baseline_sum_diameters = baseline_sum;
            row.sum_change_from_baseline = change(visit_sums[idx], baseline_sum);
            row.sum_percentage_change = sum_changes[idx];
            row.best_percentage_change = best_percentage_change;
            row.missing_target_lesions = missing[idx];
            row.response = response.clone();
            row.best_response = best.clone();
            row.non_target_response = non_target.clone();
            row.assessment_frequency_weeks = frequency;
            row.assessment_week = week;
            assessed.push(row);
        }
    }
    mark_best_response_event(&mut assessed, best.as_ref());
    assessed
}

/// Flag the latest lesion whose own response equals the best response.
/// Equal lesion dates resolve to the lowest event id.
fn mark_best_response_event(assessed: &mut [AssessedTargetLesion], best: Option<&Response>) {
    let Some(best) = best else {
        return;
    };
    let chosen = assessed
        .iter()
        .enumerate()
        .filter(|(_, row)| !row.is_baseline && &row.response == best)
        .max_by(|(_, a), (_, b)| {
            a.lesion
                .lesion_date
                .cmp(&b.lesion.lesion_date)
                .then_with(|| b.lesion.event_id.cmp(&a.lesion.event_id))
        })
        .map(|(idx, _)| idx);
    if let Some(idx) = chosen {
        assessed[idx].is_best_response = true;
    }
}
