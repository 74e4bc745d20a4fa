//! Drug-dose interval reconstruction.
//!
//! Each (subject, drug) timeline is rebuilt from the raw dose records, a
//! zero-dose `Inactive` marker for every gap between covered periods, and
//! a `Discontinued` period for every discontinuation. Records are sorted by
//! start date and period type; a new interval begins whenever the regimen
//! changes or a record starts after every earlier record of the interval
//! has ended. Each interval is emitted once, spanning the earliest start
//! and latest end of its records.

use std::collections::BTreeMap;

use acuity_model::{Discontinuation, DosingOptions, DrugDose, PeriodType, SubjectId};
use chrono::{Duration, NaiveDateTime};
use tracing::{debug, warn};

use crate::parallel::map_groups;

/// Close date for intervals without an end: the configured last-updated
/// date, else the latest date found in the dosing data.
pub fn resolve_last_updated(
    doses: &[DrugDose],
    discontinuations: &[Discontinuation],
    options: &DosingOptions,
) -> Option<NaiveDateTime> {
    if options.last_updated.is_some() {
        return options.last_updated;
    }
    let dose_dates = doses
        .iter()
        .flat_map(|dose| [dose.start_date, dose.end_date])
        .flatten();
    let discontinuation_dates = discontinuations
        .iter()
        .filter_map(|discontinuation| discontinuation.discontinuation_date);
    dose_dates.chain(discontinuation_dates).max()
}

/// Rebuild every subject's dosing history as merged, ranked intervals.
pub fn reconstruct_dosing(
    doses: Vec<DrugDose>,
    discontinuations: &[Discontinuation],
    options: &DosingOptions,
    parallel: bool,
) -> Vec<DrugDose> {
    let last_updated = resolve_last_updated(&doses, discontinuations, options);

    let mut undated = 0usize;
    let mut timelines: BTreeMap<(SubjectId, String), Vec<DrugDose>> = BTreeMap::new();
    for dose in doses {
        if dose.start_date.is_none() {
            undated += 1;
            continue;
        }
        timelines
            .entry((dose.subject_id.clone(), dose.drug.clone()))
            .or_default()
            .push(dose);
    }
    if undated > 0 {
        warn!(records = undated, "dose records without a start date skipped");
    }

    let jobs: Vec<(String, Vec<DrugDose>, Vec<&Discontinuation>)> = timelines
        .into_iter()
        .map(|((subject_id, drug), records)| {
            let stops = discontinuations
                .iter()
                .filter(|stop| stop.subject_id == subject_id && applies_to(stop, &drug))
                .collect();
            (drug, records, stops)
        })
        .collect();
    let timeline_count = jobs.len();

    let intervals: Vec<DrugDose> = map_groups(jobs, parallel, |(drug, records, stops)| {
        let timeline = build_timeline(&drug, records, &stops, last_updated);
        merge_intervals(timeline, last_updated)
    })
    .into_iter()
    .flatten()
    .collect();
    debug!(
        timelines = timeline_count,
        intervals = intervals.len(),
        "dose interval reconstruction complete"
    );
    intervals
}

fn applies_to(stop: &Discontinuation, drug: &str) -> bool {
    match stop.drug.as_deref().map(str::trim) {
        Some(stopped) if !stopped.is_empty() => stopped.eq_ignore_ascii_case(drug),
        _ => true,
    }
}

/// Raw records plus gap markers and discontinuation periods, sorted by
/// (start, period type).
///
/// A record without an end date runs until the next active record of a
/// different regimen starts, else until `last_updated`. A discontinuation
/// closes every active record still running on its date and lasts until
/// the drug is restarted.
fn build_timeline(
    drug: &str,
    mut records: Vec<DrugDose>,
    stops: &[&Discontinuation],
    last_updated: Option<NaiveDateTime>,
) -> Vec<DrugDose> {
    sort_timeline(&mut records);
    close_open_records(&mut records);

    let mut stop_dates: Vec<NaiveDateTime> = stops
        .iter()
        .filter_map(|stop| stop.discontinuation_date)
        .collect();
    stop_dates.sort();
    stop_dates.dedup();

    let mut periods = Vec::new();
    for date in stop_dates {
        for record in records.iter_mut() {
            let running = match record.start_date {
                Some(start) => start < date && record.end_date.is_none_or(|end| end >= date),
                None => false,
            };
            if running {
                record.end_date = Some(date - Duration::days(1));
            }
        }
        let restart = records
            .iter()
            .filter_map(|record| record.start_date)
            .filter(|start| *start >= date)
            .min();
        if restart == Some(date) {
            continue;
        }
        let Some(subject_id) = records.first().map(|record| record.subject_id.clone()) else {
            continue;
        };
        let mut period = DrugDose::new(
            format!("{subject_id}:{drug}:discontinued:{}", date.date()),
            subject_id,
            drug,
        );
        period.period_type = PeriodType::Discontinued;
        period.dose = Some(0.0);
        period.start_date = Some(date);
        period.end_date = restart.map(|start| start - Duration::days(1));
        periods.push(period);
    }
    records.extend(periods);
    sort_timeline(&mut records);

    let mut markers = Vec::new();
    let mut covered_until: Option<NaiveDateTime> = None;
    for record in &records {
        if let (Some(gap_start), Some(start)) = (covered_until, record.start_date)
            && start - gap_start > Duration::days(1)
        {
            let mut marker = DrugDose::new(
                format!("{}:inactive", record.event_id),
                record.subject_id.clone(),
                drug,
            );
            marker.period_type = PeriodType::Inactive;
            marker.dose = Some(0.0);
            marker.dose_unit = record.dose_unit.clone();
            marker.start_date = Some(gap_start + Duration::days(1));
            marker.end_date = Some(start - Duration::days(1));
            markers.push(marker);
        }
        let end = record.end_date.or(last_updated).or(record.start_date);
        if end > covered_until {
            covered_until = end;
        }
    }

    records.extend(markers);
    sort_timeline(&mut records);
    records
}

fn sort_timeline(records: &mut [DrugDose]) {
    records.sort_by(|a, b| {
        a.start_date
            .cmp(&b.start_date)
            .then(a.period_type.cmp(&b.period_type))
            .then_with(|| a.event_id.cmp(&b.event_id))
    });
}

/// End open records the day before a later record of another regimen.
fn close_open_records(records: &mut [DrugDose]) {
    for idx in 0..records.len() {
        if records[idx].end_date.is_some() {
            continue;
        }
        let Some(start) = records[idx].start_date else {
            continue;
        };
        let next_change = records[idx + 1..]
            .iter()
            .filter(|later| !later.same_regimen(&records[idx]))
            .filter_map(|later| later.start_date)
            .find(|later_start| *later_start > start);
        if let Some(next_start) = next_change {
            records[idx].end_date = Some(next_start - Duration::days(1));
        }
    }
}

/// Assign interval ranks and collapse each rank group into one record.
fn merge_intervals(timeline: Vec<DrugDose>, last_updated: Option<NaiveDateTime>) -> Vec<DrugDose> {
    let mut groups: Vec<Vec<DrugDose>> = Vec::new();
    let mut running_end: Option<NaiveDateTime> = None;
    for record in timeline {
        let effective_end = record.end_date.or(last_updated).or(record.start_date);
        let starts_new = match groups.last().and_then(|group| group.last()) {
            None => true,
            Some(previous) => {
                !previous.same_regimen(&record)
                    || match (record.start_date, running_end) {
                        (Some(start), Some(end)) => start > end + Duration::days(1),
                        _ => false,
                    }
            }
        };
        if starts_new {
            running_end = effective_end;
            groups.push(vec![record]);
        } else {
            if effective_end > running_end {
                running_end = effective_end;
            }
            if let Some(group) = groups.last_mut() {
                group.push(record);
            }
        }
    }

    groups
        .into_iter()
        .zip(1u32..)
        .filter_map(|(group, rank)| collapse(group, rank, last_updated))
        .collect()
}

fn collapse(group: Vec<DrugDose>, rank: u32, last_updated: Option<NaiveDateTime>) -> Option<DrugDose> {
    let start = group.iter().filter_map(|record| record.start_date).min();
    let end = group
        .iter()
        .filter_map(|record| record.end_date)
        .max()
        .or(last_updated);
    let source_event_ids = group.iter().map(|record| record.event_id.clone()).collect();
    let mut merged = group.into_iter().next()?;
    merged.start_date = start;
    merged.end_date = end;
    merged.interval_rank = Some(rank);
    merged.source_event_ids = source_event_ids;
    Some(merged)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 4, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn dose(id: &str, start: u32, end: Option<u32>, amount: f64) -> DrugDose {
        let mut dose = DrugDose::new(id, SubjectId::new("S1").unwrap(), "DRUG-A");
        dose.start_date = Some(day(start));
        dose.end_date = end.map(day);
        dose.dose = Some(amount);
        dose.dose_unit = Some("mg".to_string());
        dose.frequency = Some("QD".to_string());
        dose
    }

    fn options() -> DosingOptions {
        DosingOptions {
            last_updated: Some(day(30)),
        }
    }

    #[test]
    fn overlapping_identical_doses_merge() {
        let doses = vec![dose("D1", 1, Some(10), 100.0), dose("D2", 10, Some(20), 100.0)];
        let merged = reconstruct_dosing(doses, &[], &options(), false);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].start_date, Some(day(1)));
        assert_eq!(merged[0].end_date, Some(day(20)));
        assert_eq!(merged[0].interval_rank, Some(1));
        assert_eq!(merged[0].source_event_ids, vec!["D1", "D2"]);
    }

    #[test]
    fn dose_change_starts_a_new_interval() {
        let doses = vec![dose("D1", 1, Some(10), 100.0), dose("D2", 11, Some(20), 50.0)];
        let merged = reconstruct_dosing(doses, &[], &options(), false);
        let ranks: Vec<_> = merged.iter().map(|d| d.interval_rank).collect();
        assert_eq!(ranks, vec![Some(1), Some(2)]);
        assert_eq!(merged[1].dose, Some(50.0));
    }

    #[test]
    fn gap_between_doses_becomes_inactive_period() {
        let doses = vec![dose("D1", 1, Some(5), 100.0), dose("D2", 12, Some(20), 100.0)];
        let merged = reconstruct_dosing(doses, &[], &options(), false);
        let kinds: Vec<_> = merged.iter().map(|d| d.period_type).collect();
        assert_eq!(
            kinds,
            vec![PeriodType::Active, PeriodType::Inactive, PeriodType::Active]
        );
        assert_eq!(merged[1].start_date, Some(day(6)));
        assert_eq!(merged[1].end_date, Some(day(11)));
        assert_eq!(merged[1].dose, Some(0.0));
    }

    #[test]
    fn open_interval_closes_at_last_updated() {
        let doses = vec![dose("D1", 1, None, 100.0)];
        let merged = reconstruct_dosing(doses, &[], &options(), false);
        assert_eq!(merged[0].end_date, Some(day(30)));
    }

    #[test]
    fn discontinuation_adds_a_final_period() {
        let doses = vec![dose("D1", 1, Some(10), 100.0)];
        let stops = vec![Discontinuation {
            subject_id: SubjectId::new("S1").unwrap(),
            drug: Some("drug-a".to_string()),
            discontinuation_date: Some(day(12)),
            reason: None,
        }];
        let merged = reconstruct_dosing(doses, &stops, &options(), false);
        let kinds: Vec<_> = merged.iter().map(|d| d.period_type).collect();
        assert_eq!(
            kinds,
            vec![PeriodType::Active, PeriodType::Inactive, PeriodType::Discontinued]
        );
        assert_eq!(merged[1].start_date, Some(day(11)));
        assert_eq!(merged[1].end_date, Some(day(11)));
        assert_eq!(merged[2].start_date, Some(day(12)));
        assert_eq!(merged[2].end_date, Some(day(30)));
        assert_no_overlap(&merged);
    }

    fn stop(date: u32) -> Discontinuation {
        Discontinuation {
            subject_id: SubjectId::new("S1").unwrap(),
            drug: Some("DRUG-A".to_string()),
            discontinuation_date: Some(day(date)),
            reason: None,
        }
    }

    fn assert_no_overlap(intervals: &[DrugDose]) {
        for pair in intervals.windows(2) {
            assert!(
                pair[0].end_date < pair[1].start_date,
                "{:?}..{:?} overlaps {:?}..{:?}",
                pair[0].start_date,
                pair[0].end_date,
                pair[1].start_date,
                pair[1].end_date
            );
        }
    }

    #[test]
    fn open_dose_followed_by_same_regimen_has_no_inactive_gap() {
        let doses = vec![dose("D1", 1, None, 100.0), dose("D2", 10, Some(20), 100.0)];
        let merged = reconstruct_dosing(doses, &[], &options(), false);
        assert_no_overlap(&merged);
        assert!(merged.iter().all(|d| d.period_type == PeriodType::Active));
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].start_date, Some(day(1)));
        assert_eq!(merged[0].source_event_ids, vec!["D1", "D2"]);
    }

    #[test]
    fn open_dose_ends_before_dose_change() {
        let doses = vec![dose("D1", 1, None, 100.0), dose("D2", 10, Some(20), 50.0)];
        let merged = reconstruct_dosing(doses, &[], &options(), false);
        assert_no_overlap(&merged);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].end_date, Some(day(9)));
        assert_eq!(merged[1].dose, Some(50.0));
        assert_eq!(merged[1].start_date, Some(day(10)));
    }

    #[test]
    fn discontinuation_inside_active_dose_truncates_it() {
        let doses = vec![dose("D1", 1, Some(20), 100.0)];
        let merged = reconstruct_dosing(doses, &[stop(10)], &options(), false);
        assert_no_overlap(&merged);
        let kinds: Vec<_> = merged.iter().map(|d| d.period_type).collect();
        assert_eq!(kinds, vec![PeriodType::Active, PeriodType::Discontinued]);
        assert_eq!(merged[0].end_date, Some(day(9)));
        assert_eq!(merged[1].start_date, Some(day(10)));
        assert_eq!(merged[1].end_date, Some(day(30)));
    }

    #[test]
    fn discontinuation_lasts_until_restart() {
        let doses = vec![dose("D1", 1, Some(5), 100.0), dose("D2", 12, Some(15), 100.0)];
        let merged = reconstruct_dosing(doses, &[stop(8), stop(20)], &options(), false);
        assert_no_overlap(&merged);
        let kinds: Vec<_> = merged.iter().map(|d| d.period_type).collect();
        assert_eq!(
            kinds,
            vec![
                PeriodType::Active,
                PeriodType::Inactive,
                PeriodType::Discontinued,
                PeriodType::Active,
                PeriodType::Inactive,
                PeriodType::Discontinued,
            ]
        );
        assert_eq!(merged[2].start_date, Some(day(8)));
        assert_eq!(merged[2].end_date, Some(day(11)));
        assert_eq!(merged[5].end_date, Some(day(30)));
        assert_ne!(merged[2].event_id, merged[5].event_id);
    }

    #[test]
    fn last_updated_defaults_to_latest_dataset_date() {
        let doses = vec![dose("D1", 1, Some(18), 100.0)];
        assert_eq!(
            resolve_last_updated(&doses, &[], &DosingOptions::default()),
            Some(day(18))
        );
    }
}
