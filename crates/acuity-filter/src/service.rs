//! The two-stage filter query engine.
//!
//! A population query filters subjects. An event query first runs its
//! population query and then filters the events of the surviving subjects.
//! When no subject survives, the event index is never touched.

use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use acuity_model::{Filters, Subject, SubjectId};
use tracing::{debug, info_span};

use crate::error::{FilterError, Result};
use crate::indexed::{FiltersOf, Indexed};
use crate::predicate::Predicate;
use crate::query::{EventQuery, FilterQuery, FilterResult, PopulationQuery, QueryKind};
use crate::stats::collect_filters;

/// Query engine for one domain.
pub trait FilterService: Send + Sync {
    type Item: Indexed;

    /// The kind of query this service accepts.
    fn kind(&self) -> QueryKind;

    fn query(&self, query: &FilterQuery<Self::Item>) -> Result<FilterResult<Self::Item>>;

    /// Filters still reachable from an executed query.
    fn available_filters(&self, result: &FilterResult<Self::Item>) -> FiltersOf<Self::Item> {
        collect_filters(result.filtered())
    }

    /// Run `query` and report the filters still reachable from it.
    fn available_filters_for(
        &self,
        query: &FilterQuery<Self::Item>,
    ) -> Result<FiltersOf<Self::Item>> {
        let result = self.query(query)?;
        Ok(self.available_filters(&result))
    }
}

fn mismatch(expected: QueryKind, actual: QueryKind) -> FilterError {
    FilterError::QueryKindMismatch { expected, actual }
}

/// Filters subjects by population attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PopulationFilterService;

impl PopulationFilterService {
    pub fn new() -> Self {
        Self
    }

    /// Run the population stage directly.
    pub fn filter(&self, query: &PopulationQuery) -> FilterResult<Arc<Subject>> {
        let span = info_span!("population_query", subjects = query.subjects.len());
        let _guard = span.enter();

        let predicate = Predicate::all().with_filters(query.filters.clone());
        let positions = query.subjects.retrieve(&predicate).into_positions();
        let items = query.subjects.items();
        let subject_ids: HashSet<SubjectId> = positions
            .iter()
            .map(|position| items[*position].subject_id.clone())
            .collect();
        debug!(matched = positions.len(), "population filtered");
        FilterResult::new(
            query.subjects.clone(),
            positions.clone(),
            positions,
            subject_ids,
        )
    }
}

impl FilterService for PopulationFilterService {
    type Item = Arc<Subject>;

    fn kind(&self) -> QueryKind {
        QueryKind::Population
    }

    fn query(&self, query: &FilterQuery<Arc<Subject>>) -> Result<FilterResult<Arc<Subject>>> {
        match query {
            FilterQuery::Population(query) => Ok(self.filter(query)),
            FilterQuery::Event(_) => Err(mismatch(QueryKind::Population, QueryKind::Event)),
        }
    }
}

/// Filters events of one domain for the subjects a population filter
/// selects.
pub struct EventFilterService<E> {
    population: PopulationFilterService,
    _events: PhantomData<fn() -> E>,
}

impl<E> std::fmt::Debug for EventFilterService<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventFilterService")
            .field("events", &std::any::type_name::<E>())
            .finish()
    }
}

impl<E> Clone for EventFilterService<E> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<E> Default for EventFilterService<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventFilterService<E> {
    pub fn new() -> Self {
        Self {
            population: PopulationFilterService,
            _events: PhantomData,
        }
    }
}

impl<E: Indexed> EventFilterService<E> {
    /// Run both stages directly.
    pub fn filter(&self, query: &EventQuery<E>) -> FilterResult<E> {
        let span = info_span!(
            "event_query",
            events = query.events.len(),
            subjects = query.population.subjects.len()
        );
        let _guard = span.enter();

        let population = self.population.filter(&query.population);
        if population.subject_ids().is_empty() {
            debug!("population filter left no subjects");
            return FilterResult::empty(query.events.clone());
        }
        let subject_ids = population.subject_ids().clone();

        let population_filtered = query
            .events
            .retrieve(&Predicate::for_subjects(subject_ids.clone()))
            .into_positions();
        let filtered = if query.filters.is_empty() {
            population_filtered.clone()
        } else {
            query
                .events
                .retrieve(&Predicate::for_subjects(subject_ids.clone()).with_filters(query.filters.clone()))
                .into_positions()
        };
        debug!(
            population_filtered = population_filtered.len(),
            filtered = filtered.len(),
            "events filtered"
        );
        FilterResult::new(query.events.clone(), population_filtered, filtered, subject_ids)
    }
}

impl<E: Indexed> FilterService for EventFilterService<E> {
    type Item = E;

    fn kind(&self) -> QueryKind {
        QueryKind::Event
    }

    fn query(&self, query: &FilterQuery<E>) -> Result<FilterResult<E>> {
        match query {
            FilterQuery::Event(query) => Ok(self.filter(query)),
            FilterQuery::Population(_) => Err(mismatch(QueryKind::Event, QueryKind::Population)),
        }
    }
}

#[cfg(test)]
mod tests {
    use acuity_model::{AdverseEvent, DatasetId, SubjectAware};

    use super::*;
    use crate::index::IndexedCollection;

    #[test]
    fn event_service_rejects_population_query() {
        let service = EventFilterService::<SubjectAware<AdverseEvent>>::new();
        let query = FilterQuery::Population(PopulationQuery::default());
        let error = service.query(&query).unwrap_err();
        assert!(matches!(
            error,
            FilterError::QueryKindMismatch {
                expected: QueryKind::Event,
                actual: QueryKind::Population
            }
        ));
    }

    #[test]
    fn population_service_rejects_event_query() {
        let query: FilterQuery<Arc<Subject>> = FilterQuery::Event(EventQuery::new(
            IndexedCollection::default(),
            PopulationQuery::default(),
        ));
        let error = PopulationFilterService.query(&query).unwrap_err();
        assert_eq!(
            error.to_string(),
            "expected population query, got event query"
        );
    }

    #[test]
    fn unconstrained_population_keeps_every_subject() {
        let subjects: Vec<Arc<Subject>> = ["S1", "S2"]
            .into_iter()
            .map(|id| {
                Arc::new(Subject::new(
                    SubjectId::new(id).unwrap(),
                    DatasetId::new("STUDY").unwrap(),
                ))
            })
            .collect();
        let result = PopulationFilterService.filter(&PopulationQuery::new(subjects.into()));
        assert_eq!(result.filtered().len(), 2);
        assert_eq!(result.subject_ids().len(), 2);
    }
}
