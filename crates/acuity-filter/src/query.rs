//! Query and result contracts of the filter engine.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use acuity_model::{PopulationFilters, Subject, SubjectId};

use crate::index::IndexedCollection;
use crate::indexed::{FiltersOf, Indexed};

/// Subjects of a dataset, indexed by population attributes.
pub type SubjectCollection = IndexedCollection<Arc<Subject>>;

/// Which stage a query is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Population,
    Event,
}

impl QueryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryKind::Population => "population",
            QueryKind::Event => "event",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Population filters applied to a subject collection.
#[derive(Debug, Clone, Default)]
pub struct PopulationQuery {
    pub subjects: SubjectCollection,
    pub filters: PopulationFilters,
}

impl PopulationQuery {
    pub fn new(subjects: SubjectCollection) -> Self {
        Self {
            subjects,
            filters: PopulationFilters::default(),
        }
    }

    pub fn with_filters(mut self, filters: PopulationFilters) -> Self {
        self.filters = filters;
        self
    }
}

/// Event filters applied to the events of the subjects a population query
/// selects.
pub struct EventQuery<E: Indexed> {
    pub events: IndexedCollection<E>,
    pub filters: FiltersOf<E>,
    pub population: PopulationQuery,
}

impl<E: Indexed> Clone for EventQuery<E> {
    fn clone(&self) -> Self {
        Self {
            events: self.events.clone(),
            filters: self.filters.clone(),
            population: self.population.clone(),
        }
    }
}

impl<E: Indexed> fmt::Debug for EventQuery<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventQuery")
            .field("events", &self.events)
            .field("filters", &self.filters)
            .field("population", &self.population)
            .finish()
    }
}

impl<E: Indexed> EventQuery<E> {
    pub fn new(events: IndexedCollection<E>, population: PopulationQuery) -> Self {
        Self {
            events,
            filters: Default::default(),
            population,
        }
    }

    pub fn with_filters(mut self, filters: FiltersOf<E>) -> Self {
        self.filters = filters;
        self
    }
}

/// A query tagged by the stage it targets.
pub enum FilterQuery<E: Indexed> {
    Population(PopulationQuery),
    Event(EventQuery<E>),
}

impl<E: Indexed> FilterQuery<E> {
    pub fn kind(&self) -> QueryKind {
        match self {
            FilterQuery::Population(_) => QueryKind::Population,
            FilterQuery::Event(_) => QueryKind::Event,
        }
    }
}

impl<E: Indexed> Clone for FilterQuery<E> {
    fn clone(&self) -> Self {
        match self {
            FilterQuery::Population(query) => FilterQuery::Population(query.clone()),
            FilterQuery::Event(query) => FilterQuery::Event(query.clone()),
        }
    }
}

impl<E: Indexed> fmt::Debug for FilterQuery<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterQuery::Population(query) => f.debug_tuple("Population").field(query).finish(),
            FilterQuery::Event(query) => f.debug_tuple("Event").field(query).finish(),
        }
    }
}

impl<E: Indexed> From<PopulationQuery> for FilterQuery<E> {
    fn from(query: PopulationQuery) -> Self {
        FilterQuery::Population(query)
    }
}

impl<E: Indexed> From<EventQuery<E>> for FilterQuery<E> {
    fn from(query: EventQuery<E>) -> Self {
        FilterQuery::Event(query)
    }
}

/// Outcome of a query.
///
/// Positions index into the shared collection and are ascending, so
/// `filtered ⊆ population_filtered ⊆ all` holds as a subset of positions.
pub struct FilterResult<E: Indexed> {
    all: IndexedCollection<E>,
    population_filtered: Vec<usize>,
    filtered: Vec<usize>,
    subject_ids: HashSet<SubjectId>,
}

impl<E: Indexed> Clone for FilterResult<E> {
    fn clone(&self) -> Self {
        Self {
            all: self.all.clone(),
            population_filtered: self.population_filtered.clone(),
            filtered: self.filtered.clone(),
            subject_ids: self.subject_ids.clone(),
        }
    }
}

impl<E: Indexed> fmt::Debug for FilterResult<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterResult")
            .field("all", &self.all.len())
            .field("population_filtered", &self.population_filtered.len())
            .field("filtered", &self.filtered.len())
            .field("subjects", &self.subject_ids.len())
            .finish()
    }
}

impl<E: Indexed> FilterResult<E> {
    pub(crate) fn new(
        all: IndexedCollection<E>,
        population_filtered: Vec<usize>,
        filtered: Vec<usize>,
        subject_ids: HashSet<SubjectId>,
    ) -> Self {
        Self {
            all,
            population_filtered,
            filtered,
            subject_ids,
        }
    }

    /// A result with nothing selected.
    pub(crate) fn empty(all: IndexedCollection<E>) -> Self {
        Self::new(all, Vec::new(), Vec::new(), HashSet::new())
    }

    pub fn all(&self) -> &IndexedCollection<E> {
        &self.all
    }

    pub fn population_filtered(&self) -> impl ExactSizeIterator<Item = &E> + '_ {
        self.population_filtered
            .iter()
            .map(|position| &self.all.items()[*position])
    }

    pub fn filtered(&self) -> impl ExactSizeIterator<Item = &E> + '_ {
        self.filtered
            .iter()
            .map(|position| &self.all.items()[*position])
    }

    pub fn population_filtered_positions(&self) -> &[usize] {
        &self.population_filtered
    }

    pub fn filtered_positions(&self) -> &[usize] {
        &self.filtered
    }

    /// Subjects that passed the population stage.
    pub fn subject_ids(&self) -> &HashSet<SubjectId> {
        &self.subject_ids
    }

    pub fn is_empty(&self) -> bool {
        self.filtered.is_empty()
    }
}
