use std::path::Path;
use std::sync::Arc;

use acuity_derive::DerivationEngine;
use acuity_filter::{
    Domain, EventFilterService, EventQuery, FilterQuery, FilterResult, FilterService, FiltersOf,
    Indexed, IndexedCollection, PopulationFilterService, PopulationQuery, StudyProviders,
};
use acuity_model::{Attribute, EngineConfig, Filters, PopulationFilters};
use anyhow::{Context, Result};
use comfy_table::Table;
use serde::de::DeserializeOwned;
use tracing::{info_span, trace, warn};

use crate::cli::QueryArgs;
use crate::logging::redact_value;
use crate::summary::{apply_table_style, format_value};
use crate::types::QueryOutcome;

/// Engine configuration from `path`, or defaults.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("load config: {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

pub fn run_domains() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Domain", "Description"]);
    apply_table_style(&mut table);
    for domain in Domain::ALL {
        table.add_row(vec![domain.as_str(), domain.description()]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_query(args: &QueryArgs, config: &EngineConfig) -> Result<QueryOutcome> {
    let span = info_span!("query", domain = %args.domain);
    let _guard = span.enter();

    let (source, datasets) = acuity_ingest::open(&args.dataset)
        .with_context(|| format!("open dataset: {}", args.dataset.display()))?;
    let providers = StudyProviders::new(Arc::new(source), DerivationEngine::new(config.clone()));
    let population = providers
        .population()
        .population(&datasets)
        .context("build population")?;

    let population_filters: PopulationFilters =
        read_json(args.population.as_deref())?.unwrap_or_default();
    let population_query =
        PopulationQuery::new(population.subjects().clone()).with_filters(population_filters);
    let context = QueryContext {
        domain: args.domain,
        datasets: datasets.to_string(),
        limit: args.limit,
    };

    let load = |domain: &str| format!("load {domain} events");
    match args.domain {
        Domain::Population => {
            if args.filters.is_some() {
                warn!("--filters is ignored for the population domain; use --population");
            }
            let result = PopulationFilterService::new()
                .query(&FilterQuery::Population(population_query))?;
            let available = PopulationFilterService::new().available_filters(&result);
            context.outcome(&result, &available)
        }
        Domain::Ae => {
            let events = providers.ae().load(&datasets, &population).with_context(|| load("ae"))?;
            run_events(events, population_query, args, &context)
        }
        Domain::Lab => {
            let events = providers.lab().load(&datasets, &population).with_context(|| load("lab"))?;
            run_events(events, population_query, args, &context)
        }
        Domain::Vitals => {
            let events = providers
                .vitals()
                .load(&datasets, &population)
                .with_context(|| load("vitals"))?;
            run_events(events, population_query, args, &context)
        }
        Domain::Renal => {
            let events = providers
                .renal()
                .load(&datasets, &population)
                .with_context(|| load("renal"))?;
            run_events(events, population_query, args, &context)
        }
        Domain::Tumour => {
            let events = providers
                .tumour()
                .load(&datasets, &population)
                .with_context(|| load("tumour"))?;
            run_events(events, population_query, args, &context)
        }
        Domain::Dose => {
            let events = providers.dose().load(&datasets, &population).with_context(|| load("dose"))?;
            run_events(events, population_query, args, &context)
        }
    }
}

fn run_events<E: Indexed>(
    events: IndexedCollection<E>,
    population: PopulationQuery,
    args: &QueryArgs,
    context: &QueryContext,
) -> Result<QueryOutcome> {
    let filters: FiltersOf<E> = read_json(args.filters.as_deref())?.unwrap_or_default();
    let service = EventFilterService::<E>::new();
    let query: FilterQuery<E> = EventQuery::new(events, population)
        .with_filters(filters)
        .into();
    let result = service.query(&query)?;
    for subject_id in result.subject_ids() {
        trace!(subject_id = redact_value(subject_id.as_str()), "subject passed population filter");
    }
    let available = service.available_filters(&result);
    context.outcome(&result, &available)
}

struct QueryContext {
    domain: Domain,
    datasets: String,
    limit: usize,
}

impl QueryContext {
    fn outcome<E: Indexed>(
        &self,
        result: &FilterResult<E>,
        available: &FiltersOf<E>,
    ) -> Result<QueryOutcome> {
        let attributes = <FiltersOf<E> as Filters>::attributes();
        let columns = std::iter::once("subject_id")
            .chain(attributes.iter().map(Attribute::name))
            .collect();
        let rows = result
            .filtered()
            .take(self.limit)
            .map(|item| {
                std::iter::once(item.subject_id().to_string())
                    .chain(attributes.iter().map(|attr| format_value(&item.attribute(*attr))))
                    .collect()
            })
            .collect();
        Ok(QueryOutcome {
            domain: self.domain,
            datasets: self.datasets.clone(),
            total: result.all().len(),
            population_filtered: result.population_filtered().len(),
            filtered: result.filtered().len(),
            subjects: result.subject_ids().len(),
            columns,
            rows,
            available: serde_json::to_value(available).context("serialize available filters")?,
        })
    }
}

fn read_json<T: DeserializeOwned>(path: Option<&Path>) -> Result<Option<T>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("read filters: {}", path.display()))?;
    let value = serde_json::from_str(&contents)
        .with_context(|| format!("parse filters: {}", path.display()))?;
    Ok(Some(value))
}
