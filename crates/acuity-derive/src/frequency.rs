//! Assessment frequency and assessment week.

use std::collections::BTreeMap;

use acuity_model::datetime::days_between;
use chrono::NaiveDateTime;

/// Most common whole-week gap between consecutive visit dates.
///
/// Gaps shorter than a week are ignored. Ties go to the shorter gap.
pub fn assessment_frequency(visit_dates: &[NaiveDateTime]) -> Option<u32> {
    let mut dates = visit_dates.to_vec();
    dates.sort_unstable();
    dates.dedup();
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for pair in dates.windows(2) {
        let weeks = days_between(pair[0], pair[1]) / 7;
        if let Ok(weeks) = u32::try_from(weeks)
            && weeks > 0
        {
            *counts.entry(weeks).or_default() += 1;
        }
    }
    let top = counts.values().copied().max()?;
    counts
        .into_iter()
        .find(|(_, count)| *count == top)
        .map(|(weeks, _)| weeks)
}

/// Weeks from `baseline` to `at`, rounded to the nearest multiple of
/// `frequency` (or the nearest week when no frequency is known).
pub fn assessment_week(
    baseline: NaiveDateTime,
    at: NaiveDateTime,
    frequency: Option<u32>,
) -> Option<u32> {
    let weeks = days_between(baseline, at) as f64 / 7.0;
    if weeks < 0.0 {
        return None;
    }
    let rounded = match frequency.filter(|f| *f > 0) {
        Some(frequency) => {
            let frequency = f64::from(frequency);
            (weeks / frequency).round() * frequency
        }
        None => weeks.round(),
    };
    Some(rounded as u32)
}
