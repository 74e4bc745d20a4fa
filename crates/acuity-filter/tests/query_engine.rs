//! Query engine behaviour over small in-memory studies.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use acuity_filter::{
    AeEvent, AeFilterService, EventQuery, FilterError, FilterQuery, FilterService,
    IndexedCollection, PopulationQuery, Predicate, QueryKind, SubjectCollection,
};
use acuity_model::{
    AdverseEvent, AeFilters, DatasetId, PopulationFilters, RangeFilter, SetFilter, Subject,
    SubjectAware, SubjectId,
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;

const SEVERITIES: [&str; 3] = ["Mild", "Moderate", "Severe"];
const SEXES: [&str; 2] = ["Female", "Male"];

fn day(offset: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2022, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::days(offset)
}

fn subjects(count: usize) -> Vec<Arc<Subject>> {
    (0..count)
        .map(|index| {
            let mut subject = Subject::new(
                SubjectId::new(format!("S{index}")).unwrap(),
                DatasetId::new("STUDY").unwrap(),
            )
            .with_first_treatment_date(Some(day(0)));
            subject.sex = Some(SEXES[index % 2].to_string());
            Arc::new(subject)
        })
        .collect()
}

fn event(
    index: usize,
    subject: &Arc<Subject>,
    severity: Option<usize>,
    start: Option<i64>,
) -> AeEvent {
    let mut ae = AdverseEvent::new(format!("AE{index}"), subject.subject_id.clone());
    ae.severity = severity.map(|s| SEVERITIES[s].to_string());
    ae.start_date = start.map(day);
    SubjectAware::new(ae, Arc::clone(subject))
}

fn study() -> (SubjectCollection, IndexedCollection<AeEvent>) {
    let subjects = subjects(3);
    let events = vec![
        event(0, &subjects[0], Some(0), Some(2)),
        event(1, &subjects[0], Some(2), Some(10)),
        event(2, &subjects[1], None, Some(5)),
        event(3, &subjects[1], Some(1), None),
        event(4, &subjects[2], Some(2), Some(30)),
    ];
    (subjects.into(), IndexedCollection::new(events))
}

fn ids<'a>(events: impl Iterator<Item = &'a AeEvent>) -> Vec<String> {
    events.map(|e| e.event().event_id.clone()).collect()
}

#[test]
fn test_kind_mismatch_is_rejected() {
    let (subjects, _) = study();
    let query: FilterQuery<AeEvent> = PopulationQuery::new(subjects).into();
    let error = AeFilterService::new().query(&query).unwrap_err();
    assert!(matches!(
        error,
        FilterError::QueryKindMismatch {
            expected: QueryKind::Event,
            actual: QueryKind::Population,
        }
    ));
}

#[test]
fn test_empty_population_never_touches_event_index() {
    let (subjects, events) = study();
    let population = PopulationQuery::new(subjects).with_filters(PopulationFilters {
        sex: SetFilter::of(["Unknown"]).excluding_empty(),
        ..PopulationFilters::default()
    });
    let query = EventQuery::new(events.clone(), population).with_filters(AeFilters {
        severity: SetFilter::of(["Severe"]),
        ..AeFilters::default()
    });

    let result = AeFilterService::new().query(&query.into()).unwrap();

    assert!(result.is_empty());
    assert_eq!(result.population_filtered().len(), 0);
    assert_eq!(result.all().len(), 5);
    assert!(!events.is_indexed());
    assert_eq!(events.open_result_sets(), 0);
}

#[test]
fn test_population_then_event_filter() {
    let (subjects, events) = study();
    let population = PopulationQuery::new(subjects).with_filters(PopulationFilters {
        sex: SetFilter::of(["Female"]),
        ..PopulationFilters::default()
    });
    let query = EventQuery::new(events, population).with_filters(AeFilters {
        severity: SetFilter::of(["Severe"]).excluding_empty(),
        ..AeFilters::default()
    });

    let result = AeFilterService::new().query(&query.into()).unwrap();

    assert_eq!(ids(result.population_filtered()), vec!["AE0", "AE1", "AE4"]);
    assert_eq!(ids(result.filtered()), vec!["AE1", "AE4"]);
    let subjects: BTreeSet<&str> = result.subject_ids().iter().map(SubjectId::as_str).collect();
    assert_eq!(subjects, BTreeSet::from(["S0", "S2"]));
}

#[test]
fn test_result_sets_are_nested() {
    let (subjects, events) = study();
    let query = EventQuery::new(events, PopulationQuery::new(subjects)).with_filters(AeFilters {
        start_date: RangeFilter::between(Some(day(3)), Some(day(20))),
        ..AeFilters::default()
    });

    let result = AeFilterService::new().query(&query.into()).unwrap();

    let population: HashSet<usize> = result.population_filtered_positions().iter().copied().collect();
    assert!(result.filtered_positions().iter().all(|p| population.contains(p)));
    assert!(population.iter().all(|p| *p < result.all().len()));
    assert_eq!(ids(result.filtered()), vec!["AE1", "AE2", "AE3"]);
}

#[test]
fn test_available_filters_are_idempotent() {
    let (subjects, events) = study();
    let service = AeFilterService::new();
    let query: FilterQuery<AeEvent> = EventQuery::new(events, PopulationQuery::new(subjects)).into();
    let result = service.query(&query).unwrap();

    let first = service.available_filters(&result);
    let second = service.available_filters(&result);

    assert_eq!(first, second);
    assert_eq!(first.matched_item_count, 5);
    assert_eq!(first.severity.values.len(), 3);
    assert!(first.severity.include_empty_values);
    assert_eq!(first.start_date.from, Some(day(2)));
    assert_eq!(first.start_date.to, Some(day(30)));
    assert_eq!(service.available_filters_for(&query).unwrap(), first);
}

#[test]
fn test_event_query_leaves_no_open_result_sets() {
    let (subjects, events) = study();
    let query = EventQuery::new(events.clone(), PopulationQuery::new(subjects.clone()))
        .with_filters(AeFilters {
            severity: SetFilter::of(["Mild"]),
            ..AeFilters::default()
        });
    AeFilterService::new().query(&query.into()).unwrap();
    assert!(events.is_indexed());
    assert_eq!(events.open_result_sets(), 0);
    assert_eq!(subjects.open_result_sets(), 0);
}

fn arb_filters() -> impl Strategy<Value = AeFilters> {
    (
        proptest::collection::btree_set(0..SEVERITIES.len(), 0..=3),
        any::<bool>(),
        proptest::option::of(0i64..40),
        proptest::option::of(0i64..40),
        any::<bool>(),
    )
        .prop_map(|(severities, severity_empty, from, to, date_empty)| AeFilters {
            severity: SetFilter {
                values: severities.into_iter().map(|s| SEVERITIES[s].to_string()).collect(),
                include_empty_values: severity_empty,
            },
            start_date: RangeFilter {
                from: from.map(day),
                to: to.map(day),
                include_empty_values: date_empty,
            },
            ..AeFilters::default()
        })
}

fn arb_events() -> impl Strategy<Value = Vec<(usize, Option<usize>, Option<i64>)>> {
    proptest::collection::vec(
        (
            0usize..4,
            proptest::option::of(0..SEVERITIES.len()),
            proptest::option::of(0i64..40),
        ),
        0..40,
    )
}

proptest! {
    #[test]
    fn test_filtering_is_monotone_and_matches_scan(rows in arb_events(), filters in arb_filters()) {
        let subjects = subjects(4);
        let events: Vec<AeEvent> = rows
            .iter()
            .enumerate()
            .map(|(index, (subject, severity, start))| event(index, &subjects[*subject], *severity, *start))
            .collect();
        let scan_predicate = Predicate::all().with_filters(filters.clone());
        let expected: Vec<usize> = events
            .iter()
            .enumerate()
            .filter(|(_, e)| scan_predicate.matches(*e))
            .map(|(index, _)| index)
            .collect();
        let events = IndexedCollection::new(events);
        let service = AeFilterService::new();
        let population = PopulationQuery::new(subjects.into());

        let constrained = service
            .query(&EventQuery::new(events.clone(), population.clone()).with_filters(filters).into())
            .unwrap();
        let unconstrained = service
            .query(&EventQuery::new(events, population).into())
            .unwrap();

        let everything: HashSet<usize> = unconstrained.filtered_positions().iter().copied().collect();
        prop_assert!(constrained.filtered_positions().iter().all(|p| everything.contains(p)));
        prop_assert_eq!(constrained.filtered_positions(), expected.as_slice());
    }
}
