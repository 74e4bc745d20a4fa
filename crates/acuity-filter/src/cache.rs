//! Process-wide cache of built populations, keyed by dataset set.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use acuity_model::{DatasetsKey, StudyInfo, Subject, SubjectLookup};
use tracing::debug;

use crate::query::SubjectCollection;

/// Subjects of a dataset set plus study metadata. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct Population {
    subjects: SubjectCollection,
    lookup: SubjectLookup,
    info: StudyInfo,
}

impl Population {
    pub fn new(subjects: Vec<Subject>, info: StudyInfo) -> Self {
        let subjects: Vec<Arc<Subject>> = subjects.into_iter().map(Arc::new).collect();
        let lookup = SubjectLookup::new(&subjects);
        Self {
            subjects: SubjectCollection::new(subjects),
            lookup,
            info,
        }
    }

    pub fn subjects(&self) -> &SubjectCollection {
        &self.subjects
    }

    pub fn lookup(&self) -> &SubjectLookup {
        &self.lookup
    }

    pub fn info(&self) -> &StudyInfo {
        &self.info
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

/// Read-mostly population cache.
///
/// A miss computes outside the lock; when two callers race on the same key
/// the first stored population wins and both receive it.
#[derive(Debug, Default)]
pub struct SubjectCache {
    entries: RwLock<HashMap<DatasetsKey, Arc<Population>>>,
}

impl SubjectCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &DatasetsKey) -> Option<Arc<Population>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn get_or_compute<F, E>(&self, key: &DatasetsKey, compute: F) -> Result<Arc<Population>, E>
    where
        F: FnOnce() -> Result<Population, E>,
    {
        if let Some(population) = self.get(key) {
            debug!(datasets = %key, "population cache hit");
            return Ok(population);
        }
        debug!(datasets = %key, "population cache miss");
        let population = Arc::new(compute()?);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(entries.entry(key.clone()).or_insert(population)))
    }

    /// Drop the entry for `key`; returns whether one was cached.
    pub fn invalidate(&self, key: &DatasetsKey) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use acuity_model::{DatasetId, SubjectId};

    use super::*;

    fn key(name: &str) -> DatasetsKey {
        DatasetsKey::single(DatasetId::new(name).unwrap())
    }

    fn population() -> Population {
        let subject = Subject::new(SubjectId::new("S1").unwrap(), DatasetId::new("A").unwrap());
        Population::new(vec![subject], StudyInfo::default())
    }

    #[test]
    fn computes_once_per_key() {
        let cache = SubjectCache::new();
        let mut calls = 0;
        for _ in 0..3 {
            let population = cache
                .get_or_compute(&key("A"), || {
                    calls += 1;
                    Ok::<_, Infallible>(population())
                })
                .unwrap();
            assert_eq!(population.len(), 1);
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn failed_compute_caches_nothing() {
        let cache = SubjectCache::new();
        let result = cache.get_or_compute(&key("A"), || Err("source down"));
        assert_eq!(result.unwrap_err(), "source down");
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_forces_recompute() {
        let cache = SubjectCache::new();
        let first = cache
            .get_or_compute(&key("A"), || Ok::<_, Infallible>(population()))
            .unwrap();
        assert!(cache.invalidate(&key("A")));
        assert!(!cache.invalidate(&key("A")));
        let second = cache
            .get_or_compute(&key("A"), || Ok::<_, Infallible>(population()))
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        cache.clear();
        assert!(cache.is_empty());
    }
}
