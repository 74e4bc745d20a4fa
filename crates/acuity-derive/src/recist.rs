//! RECIST response per visit and best overall response per subject.

use acuity_model::{Assessment, NonTargetLesion, Response};
use chrono::NaiveDateTime;

/// A record that belongs to one visit of one subject.
pub trait VisitRecord {
    fn visit_number(&self) -> Option<f64>;
    fn visit_date(&self) -> Option<NaiveDateTime>;
}

impl VisitRecord for Assessment {
    fn visit_number(&self) -> Option<f64> {
        self.visit_number
    }

    fn visit_date(&self) -> Option<NaiveDateTime> {
        self.visit_date
    }
}

impl VisitRecord for NonTargetLesion {
    fn visit_number(&self) -> Option<f64> {
        self.visit_number
    }

    fn visit_date(&self) -> Option<NaiveDateTime> {
        self.visit_date
    }
}

/// Whether `record` belongs to the visit identified by number or date.
///
/// Visit numbers are compared first; the calendar day of the visit date is
/// used when either side has no number.
pub fn same_visit<R: VisitRecord>(
    record: &R,
    visit_number: Option<f64>,
    visit_date: Option<NaiveDateTime>,
) -> bool {
    match (record.visit_number(), visit_number) {
        (Some(left), Some(right)) => left == right,
        _ => match (record.visit_date(), visit_date) {
            (Some(left), Some(right)) => left.date() == right.date(),
            _ => false,
        },
    }
}

/// Response of one visit.
pub fn visit_response(
    is_baseline: bool,
    missing_target_lesions: bool,
    assessment: Option<&Assessment>,
) -> Response {
    if !is_baseline && missing_target_lesions {
        return Response::MissingTargetLesions;
    }
    assessment
        .and_then(|assessment| assessment.response.as_deref())
        .filter(|response| !response.trim().is_empty())
        .map_or(Response::NoAssessment, Response::parse)
}

/// Worst response among a visit's non-target lesions.
pub fn non_target_response<'a, I>(lesions: I) -> Option<String>
where
    I: IntoIterator<Item = &'a NonTargetLesion>,
{
    lesions
        .into_iter()
        .filter_map(|lesion| lesion.response.as_deref())
        .filter(|response| !response.trim().is_empty())
        .max_by_key(|response| Response::parse(response).rank())
        .map(str::to_string)
}

/// Response of one visit as used by best-response selection.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitOutcome {
    pub lesion_date: NaiveDateTime,
    pub assessment_date: Option<NaiveDateTime>,
    pub is_baseline: bool,
    pub response: Response,
}

/// Best overall response over a subject's visits.
///
/// The lowest-ranked response among post-baseline visits wins. A partial
/// response stands only if the last assessment also reads partial response
/// or at least two visits do; otherwise it becomes stable disease. A
/// subject with missing target lesions at any visit is reported as such.
pub fn best_response(visits: &[VisitOutcome], any_missing: bool) -> Option<Response> {
    let best = visits
        .iter()
        .filter(|visit| !visit.is_baseline)
        .map(|visit| &visit.response)
        .min_by_key(|response| response.rank())?
        .clone();
    if any_missing {
        return Some(Response::MissingTargetLesions);
    }
    if best != Response::PartialResponse {
        return Some(best);
    }
    if last_assessed_response(visits) == Some(&Response::PartialResponse) {
        return Some(best);
    }
    let partial_visits = visits
        .iter()
        .filter(|visit| visit.response == Response::PartialResponse)
        .count();
    if partial_visits >= 2 {
        Some(best)
    } else {
        Some(Response::StableDisease)
    }
}

/// Response at the chronologically last assessment date, falling back to
/// the last visit when no assessment carries a date. The baseline visit is
/// a candidate like any other.
fn last_assessed_response(visits: &[VisitOutcome]) -> Option<&Response> {
    visits
        .iter()
        .filter(|visit| visit.assessment_date.is_some())
        .max_by_key(|visit| (visit.assessment_date, visit.lesion_date))
        .or_else(|| visits.iter().max_by_key(|visit| visit.lesion_date))
        .map(|visit| &visit.response)
}
