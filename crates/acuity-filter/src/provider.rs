//! Domain providers: fetch raw rows, enrich them, attach subjects.
//!
//! A provider is assembled from a raw data source and an enrichment
//! function rather than specialised per domain; the population provider
//! is the one exception, since every other provider depends on it.

use std::fmt;
use std::sync::Arc;

use acuity_derive::{DerivationEngine, PopulationSources};
use acuity_model::{
    DatasetId, DatasetsKey, DeathRow, Discontinuation, DrugDose, PopulationRow, StudyInfo,
    SubjectAware, SubjectRecord, VisitRow, wrap_events,
};
use tracing::{debug, info_span, warn};

use crate::cache::{Population, SubjectCache};
use crate::error::{FilterError, Result, SourceError};
use crate::index::IndexedCollection;
use crate::indexed::Indexed;

/// Supplies the unfiltered rows of one domain for one dataset.
pub trait RawDataSource<R>: Send + Sync {
    fn raw_data(&self, dataset_id: &DatasetId) -> std::result::Result<Vec<R>, SourceError>;
}

/// Supplies study metadata for one dataset.
pub trait StudyInfoSource: Send + Sync {
    fn study_info(&self, dataset_id: &DatasetId) -> std::result::Result<StudyInfo, SourceError>;
}

/// Rows of every dataset in `datasets`, in dataset order.
pub fn fetch_all<R>(
    source: &dyn RawDataSource<R>,
    domain: &'static str,
    datasets: &DatasetsKey,
) -> Result<Vec<R>> {
    let mut rows = Vec::new();
    for dataset_id in datasets.datasets() {
        let batch = fetch_one(source, domain, dataset_id)?;
        rows.extend(batch);
    }
    Ok(rows)
}

fn fetch_one<R>(
    source: &dyn RawDataSource<R>,
    domain: &'static str,
    dataset_id: &DatasetId,
) -> Result<Vec<R>> {
    let rows = source
        .raw_data(dataset_id)
        .map_err(|source| FilterError::Source {
            domain,
            dataset_id: dataset_id.clone(),
            source,
        })?;
    debug!(domain, dataset_id = %dataset_id, rows = rows.len(), "raw data fetched");
    Ok(rows)
}

/// What an enrichment step may read besides the rows themselves.
#[derive(Debug, Clone, Copy)]
pub struct EnrichContext<'a> {
    pub datasets: &'a DatasetsKey,
    pub population: &'a Population,
}

type Enrich<R, D> = Box<dyn Fn(Vec<R>, &EnrichContext<'_>) -> Result<Vec<D>> + Send + Sync>;

/// Fetch, enrich and wrap for one event domain.
pub struct DomainProvider<R, D> {
    domain: &'static str,
    source: Arc<dyn RawDataSource<R>>,
    enrich: Enrich<R, D>,
}

impl<R, D> fmt::Debug for DomainProvider<R, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainProvider")
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

impl<R: 'static> DomainProvider<R, R> {
    /// A provider that wraps rows as fetched.
    pub fn passthrough(domain: &'static str, source: Arc<dyn RawDataSource<R>>) -> Self {
        Self::new(domain, source, |rows, _| Ok(rows))
    }
}

impl<R, D> DomainProvider<R, D> {
    pub fn new<F>(domain: &'static str, source: Arc<dyn RawDataSource<R>>, enrich: F) -> Self
    where
        F: Fn(Vec<R>, &EnrichContext<'_>) -> Result<Vec<D>> + Send + Sync + 'static,
    {
        Self {
            domain,
            source,
            enrich: Box::new(enrich),
        }
    }

    pub fn domain(&self) -> &'static str {
        self.domain
    }

    /// Enriched rows, not yet attached to subjects.
    pub fn enriched(&self, datasets: &DatasetsKey, population: &Population) -> Result<Vec<D>> {
        let rows = fetch_all(self.source.as_ref(), self.domain, datasets)?;
        (self.enrich)(
            rows,
            &EnrichContext {
                datasets,
                population,
            },
        )
    }

    /// Events of the population's subjects, ready for querying.
    pub fn load(
        &self,
        datasets: &DatasetsKey,
        population: &Population,
    ) -> Result<IndexedCollection<SubjectAware<D>>>
    where
        D: SubjectRecord,
        SubjectAware<D>: Indexed,
    {
        let span = info_span!("load_domain", domain = self.domain, datasets = %datasets);
        let _guard = span.enter();

        let enriched = self.enriched(datasets, population)?;
        let (events, dropped) = wrap_events(enriched, population.lookup());
        if dropped > 0 {
            warn!(domain = self.domain, dropped, "dropped events of unknown subjects");
        }
        debug!(domain = self.domain, events = events.len(), "domain loaded");
        Ok(IndexedCollection::new(events))
    }
}

/// Row sources the population is merged from.
#[derive(Clone)]
pub struct PopulationSourceSet {
    pub rows: Arc<dyn RawDataSource<PopulationRow>>,
    pub doses: Arc<dyn RawDataSource<DrugDose>>,
    pub deaths: Arc<dyn RawDataSource<DeathRow>>,
    pub discontinuations: Arc<dyn RawDataSource<Discontinuation>>,
    pub visits: Arc<dyn RawDataSource<VisitRow>>,
    pub study: Arc<dyn StudyInfoSource>,
}

impl PopulationSourceSet {
    /// Every population source served by one backend.
    pub fn from_source<S>(source: Arc<S>) -> Self
    where
        S: RawDataSource<PopulationRow>
            + RawDataSource<DrugDose>
            + RawDataSource<DeathRow>
            + RawDataSource<Discontinuation>
            + RawDataSource<VisitRow>
            + StudyInfoSource
            + 'static,
    {
        Self {
            rows: source.clone(),
            doses: source.clone(),
            deaths: source.clone(),
            discontinuations: source.clone(),
            visits: source.clone(),
            study: source,
        }
    }
}

/// Builds and caches the population of a dataset set.
pub struct PopulationProvider {
    engine: DerivationEngine,
    sources: PopulationSourceSet,
    cache: Arc<SubjectCache>,
}

impl fmt::Debug for PopulationProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopulationProvider")
            .field("engine", &self.engine)
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl PopulationProvider {
    pub fn new(engine: DerivationEngine, sources: PopulationSourceSet) -> Self {
        Self {
            engine,
            sources,
            cache: Arc::new(SubjectCache::new()),
        }
    }

    /// Share a cache with other providers.
    pub fn with_cache(mut self, cache: Arc<SubjectCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &Arc<SubjectCache> {
        &self.cache
    }

    /// Cached population of `datasets`, built on a miss.
    pub fn population(&self, datasets: &DatasetsKey) -> Result<Arc<Population>> {
        self.cache.get_or_compute(datasets, || self.build(datasets))
    }

    fn build(&self, datasets: &DatasetsKey) -> Result<Population> {
        let span = info_span!("build_population", datasets = %datasets);
        let _guard = span.enter();

        let mut subjects = Vec::new();
        let mut info = StudyInfo::default();
        for dataset_id in datasets.datasets() {
            let rows = fetch_one(self.sources.rows.as_ref(), "population", dataset_id)?;
            let doses = fetch_one(self.sources.doses.as_ref(), "drug_dose", dataset_id)?;
            let deaths = fetch_one(self.sources.deaths.as_ref(), "death", dataset_id)?;
            let discontinuations = fetch_one(
                self.sources.discontinuations.as_ref(),
                "discontinuation",
                dataset_id,
            )?;
            let visits = fetch_one(self.sources.visits.as_ref(), "visit", dataset_id)?;
            let sources = PopulationSources::new(&rows)
                .with_doses(&doses)
                .with_deaths(&deaths)
                .with_discontinuations(&discontinuations)
                .with_visits(&visits);
            subjects.extend(self.engine.population(dataset_id, sources)?);

            let dataset_info = self.sources.study.study_info(dataset_id).map_err(|source| {
                FilterError::Source {
                    domain: "study",
                    dataset_id: dataset_id.clone(),
                    source,
                }
            })?;
            info = info.or(dataset_info);
        }
        debug!(subjects = subjects.len(), "population built");
        Ok(Population::new(subjects, info))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use acuity_model::{AdverseEvent, SubjectId};

    use super::*;

    struct MemorySource {
        population: HashMap<String, Vec<PopulationRow>>,
        events: Vec<AdverseEvent>,
    }

    impl MemorySource {
        fn new() -> Self {
            let row = |id: &str| PopulationRow::new(SubjectId::new(id).unwrap());
            Self {
                population: HashMap::from([
                    ("A".to_string(), vec![row("S1")]),
                    ("B".to_string(), vec![row("S2")]),
                ]),
                events: vec![
                    AdverseEvent::new("AE1", SubjectId::new("S1").unwrap()),
                    AdverseEvent::new("AE2", SubjectId::new("S9").unwrap()),
                ],
            }
        }
    }

    impl RawDataSource<PopulationRow> for MemorySource {
        fn raw_data(&self, dataset_id: &DatasetId) -> std::result::Result<Vec<PopulationRow>, SourceError> {
            Ok(self
                .population
                .get(dataset_id.as_str())
                .cloned()
                .unwrap_or_default())
        }
    }

    macro_rules! empty_source {
        ($($row:ty),*) => {
            $(impl RawDataSource<$row> for MemorySource {
                fn raw_data(&self, _: &DatasetId) -> std::result::Result<Vec<$row>, SourceError> {
                    Ok(Vec::new())
                }
            })*
        };
    }

    empty_source!(DrugDose, DeathRow, Discontinuation, VisitRow);

    impl RawDataSource<AdverseEvent> for MemorySource {
        fn raw_data(&self, dataset_id: &DatasetId) -> std::result::Result<Vec<AdverseEvent>, SourceError> {
            if dataset_id.as_str() == "broken" {
                return Err("connection reset".into());
            }
            Ok(self.events.clone())
        }
    }

    impl StudyInfoSource for MemorySource {
        fn study_info(&self, dataset_id: &DatasetId) -> std::result::Result<StudyInfo, SourceError> {
            Ok(StudyInfo {
                study_id: Some(format!("STUDY-{dataset_id}")),
                ..StudyInfo::default()
            })
        }
    }

    fn key(names: &[&str]) -> DatasetsKey {
        DatasetsKey::new(names.iter().map(|name| DatasetId::new(*name).unwrap())).unwrap()
    }

    #[test]
    fn population_merges_datasets_and_is_cached() {
        let source = Arc::new(MemorySource::new());
        let provider = PopulationProvider::new(
            DerivationEngine::default(),
            PopulationSourceSet::from_source(source),
        );
        let first = provider.population(&key(&["A", "B"])).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first.info().study_id.as_deref(), Some("STUDY-A"));
        let second = provider.population(&key(&["A", "B"])).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn load_drops_events_of_unknown_subjects() {
        let source = Arc::new(MemorySource::new());
        let provider = PopulationProvider::new(
            DerivationEngine::default(),
            PopulationSourceSet::from_source(source.clone()),
        );
        let population = provider.population(&key(&["A"])).unwrap();
        let ae = DomainProvider::<AdverseEvent, _>::passthrough("ae", source);
        let events = ae.load(&key(&["A"]), &population).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events.items()[0].event().event_id, "AE1");
    }

    #[test]
    fn source_failure_names_domain_and_dataset() {
        let source = Arc::new(MemorySource::new());
        let ae = DomainProvider::<AdverseEvent, _>::passthrough("ae", source);
        let error = ae
            .enriched(&key(&["broken"]), &Population::default())
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "failed to load ae data for dataset broken: connection reset"
        );
    }
}
