//! Attribute-indexed view over a collection of items.
//!
//! The index is built on first retrieval and then shared by every clone of
//! the collection. Each attribute gets postings lists keyed by value (hash
//! map for text, ordered map for numbers and dates) plus a list of items
//! with no value; items are also posted by subject. A retrieval looks up
//! one candidate list per constraint and intersects them, smallest first.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, OnceLock};

use acuity_model::{AttrValue, Facet, Filters, SetFilter, SubjectId};
use chrono::NaiveDateTime;
use tracing::debug;

use crate::indexed::{AttrOf, Indexed};
use crate::predicate::Predicate;

/// `f64` ordered by `total_cmp`, with `-0.0` folded into `0.0`.
#[derive(Debug, Clone, Copy)]
struct TotalF64(f64);

impl TotalF64 {
    fn new(value: f64) -> Self {
        Self(value + 0.0)
    }
}

impl PartialEq for TotalF64 {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TotalF64 {}

impl PartialOrd for TotalF64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TotalF64 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug)]
enum AttrIndex {
    Text {
        postings: HashMap<String, Vec<usize>>,
        empty: Vec<usize>,
    },
    Number {
        postings: BTreeMap<TotalF64, Vec<usize>>,
        empty: Vec<usize>,
    },
    Date {
        postings: BTreeMap<NaiveDateTime, Vec<usize>>,
        empty: Vec<usize>,
    },
}

impl AttrIndex {
    fn for_facet(facet: Facet<'_>) -> Self {
        match facet {
            Facet::Set(_) => AttrIndex::Text {
                postings: HashMap::new(),
                empty: Vec::new(),
            },
            Facet::Number(_) => AttrIndex::Number {
                postings: BTreeMap::new(),
                empty: Vec::new(),
            },
            Facet::Date(_) => AttrIndex::Date {
                postings: BTreeMap::new(),
                empty: Vec::new(),
            },
        }
    }

    fn insert(&mut self, position: usize, value: &AttrValue<'_>) {
        match (self, value) {
            (AttrIndex::Text { postings, empty }, AttrValue::Text(value)) => match value {
                Some(value) => postings.entry((*value).to_string()).or_default().push(position),
                None => empty.push(position),
            },
            (AttrIndex::Text { postings, empty }, AttrValue::Texts(values)) => {
                if values.is_empty() {
                    empty.push(position);
                }
                for value in values {
                    postings.entry((*value).to_string()).or_default().push(position);
                }
            }
            (AttrIndex::Number { postings, empty }, AttrValue::Number(value)) => {
                match value.filter(|value| !value.is_nan()) {
                    Some(value) => postings.entry(TotalF64::new(value)).or_default().push(position),
                    None => empty.push(position),
                }
            }
            (AttrIndex::Date { postings, empty }, AttrValue::Date(value)) => match value {
                Some(value) => postings.entry(*value).or_default().push(position),
                None => empty.push(position),
            },
            _ => {}
        }
    }

    /// Sorted, de-duplicated positions passing `facet`.
    fn candidates(&self, facet: Facet<'_>) -> Vec<usize> {
        let mut positions = match (self, facet) {
            (AttrIndex::Text { postings, empty }, Facet::Set(filter)) => {
                text_candidates(postings, empty, filter)
            }
            (AttrIndex::Number { postings, empty }, Facet::Number(filter)) => {
                if filter.from.is_some_and(f64::is_nan) || filter.to.is_some_and(f64::is_nan) {
                    return if filter.include_empty_values {
                        empty.clone()
                    } else {
                        Vec::new()
                    };
                }
                let bounds = (
                    filter.from.map(TotalF64::new),
                    filter.to.map(TotalF64::new),
                );
                range_candidates(postings, empty, bounds, filter.include_empty_values)
            }
            (AttrIndex::Date { postings, empty }, Facet::Date(filter)) => {
                range_candidates(postings, empty, (filter.from, filter.to), filter.include_empty_values)
            }
            _ => Vec::new(),
        };
        positions.sort_unstable();
        positions.dedup();
        positions
    }
}

fn text_candidates(
    postings: &HashMap<String, Vec<usize>>,
    empty: &[usize],
    filter: &SetFilter,
) -> Vec<usize> {
    let mut positions: Vec<usize> = filter
        .values
        .iter()
        .filter_map(|value| postings.get(value))
        .flatten()
        .copied()
        .collect();
    if filter.include_empty_values {
        positions.extend_from_slice(empty);
    }
    positions
}

fn range_candidates<K: Ord + Copy>(
    postings: &BTreeMap<K, Vec<usize>>,
    empty: &[usize],
    (from, to): (Option<K>, Option<K>),
    include_empty: bool,
) -> Vec<usize> {
    let mut positions = Vec::new();
    let inverted = matches!((from, to), (Some(from), Some(to)) if from > to);
    if !inverted {
        let lower = from.map_or(Bound::Unbounded, Bound::Included);
        let upper = to.map_or(Bound::Unbounded, Bound::Included);
        positions.extend(postings.range((lower, upper)).flat_map(|(_, p)| p).copied());
    }
    if include_empty {
        positions.extend_from_slice(empty);
    }
    positions
}

struct AttributeIndex<A> {
    attributes: HashMap<A, AttrIndex>,
    by_subject: HashMap<SubjectId, Vec<usize>>,
}

impl<A> AttributeIndex<A>
where
    A: acuity_model::Attribute,
{
    fn build<E>(items: &[E]) -> Self
    where
        E: Indexed,
        E::Filters: Filters<Attr = A>,
    {
        let shape = E::Filters::default();
        let mut attributes: HashMap<A, AttrIndex> = E::Filters::attributes()
            .iter()
            .map(|attr| (*attr, AttrIndex::for_facet(shape.facet(*attr))))
            .collect();
        let mut by_subject: HashMap<SubjectId, Vec<usize>> = HashMap::new();
        for (position, item) in items.iter().enumerate() {
            by_subject
                .entry(item.subject_id().clone())
                .or_default()
                .push(position);
            for (attr, index) in &mut attributes {
                index.insert(position, &item.attribute(*attr));
            }
        }
        debug!(
            items = items.len(),
            attributes = attributes.len(),
            subjects = by_subject.len(),
            "attribute index built"
        );
        Self {
            attributes,
            by_subject,
        }
    }

    fn subject_candidates(&self, subjects: &HashSet<SubjectId>) -> Vec<usize> {
        let mut positions: Vec<usize> = subjects
            .iter()
            .filter_map(|subject| self.by_subject.get(subject))
            .flatten()
            .copied()
            .collect();
        positions.sort_unstable();
        positions
    }
}

/// Items of one domain with a lazily built attribute index.
///
/// Clones share the items, the index and the open-result counter.
pub struct IndexedCollection<E: Indexed> {
    items: Arc<Vec<E>>,
    index: Arc<OnceLock<AttributeIndex<AttrOf<E>>>>,
    open_results: Arc<AtomicUsize>,
}

impl<E: Indexed> Clone for IndexedCollection<E> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            index: Arc::clone(&self.index),
            open_results: Arc::clone(&self.open_results),
        }
    }
}

impl<E: Indexed> std::fmt::Debug for IndexedCollection<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexedCollection")
            .field("len", &self.items.len())
            .field("indexed", &self.is_indexed())
            .finish()
    }
}

impl<E: Indexed> Default for IndexedCollection<E> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<E: Indexed> From<Vec<E>> for IndexedCollection<E> {
    fn from(items: Vec<E>) -> Self {
        Self::new(items)
    }
}

impl<E: Indexed> IndexedCollection<E> {
    pub fn new(items: Vec<E>) -> Self {
        Self {
            items: Arc::new(items),
            index: Arc::new(OnceLock::new()),
            open_results: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn items(&self) -> &[E] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the attribute index has been built.
    pub fn is_indexed(&self) -> bool {
        self.index.get().is_some()
    }

    /// Result sets handed out and not yet closed.
    pub fn open_result_sets(&self) -> usize {
        self.open_results.load(AtomicOrdering::Acquire)
    }

    fn index(&self) -> &AttributeIndex<AttrOf<E>> {
        self.index.get_or_init(|| AttributeIndex::build(self.items.as_slice()))
    }

    /// Items matching `predicate`, in collection order.
    pub fn retrieve(&self, predicate: &Predicate<E::Filters>) -> ResultSet<'_, E> {
        let positions = if predicate.is_unconstrained() {
            (0..self.items.len()).collect()
        } else {
            self.lookup(predicate)
        };
        self.open_results.fetch_add(1, AtomicOrdering::AcqRel);
        ResultSet {
            items: &self.items,
            total: positions.len(),
            positions: positions.into_iter(),
            _guard: OpenGuard(Arc::clone(&self.open_results)),
        }
    }

    fn lookup(&self, predicate: &Predicate<E::Filters>) -> Vec<usize> {
        let index = self.index();
        let mut lists: Vec<Vec<usize>> = Vec::new();
        if let Some(subjects) = predicate.subjects() {
            lists.push(index.subject_candidates(subjects));
        }
        for (attr, facet) in predicate.constraints() {
            match index.attributes.get(&attr) {
                Some(attr_index) => lists.push(attr_index.candidates(facet)),
                None => return Vec::new(),
            }
        }
        intersect_smallest_first(lists)
    }
}

fn intersect_smallest_first(mut lists: Vec<Vec<usize>>) -> Vec<usize> {
    lists.sort_by_key(Vec::len);
    let mut lists = lists.into_iter();
    let Some(mut result) = lists.next() else {
        return Vec::new();
    };
    for list in lists {
        if result.is_empty() {
            break;
        }
        result.retain(|position| list.binary_search(position).is_ok());
    }
    result
}

struct OpenGuard(Arc<AtomicUsize>);

impl Drop for OpenGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, AtomicOrdering::AcqRel);
    }
}

/// Lazily walked matches of one retrieval.
///
/// Holds its slot in the collection's open-result count until closed or
/// dropped.
pub struct ResultSet<'a, E> {
    items: &'a [E],
    positions: std::vec::IntoIter<usize>,
    total: usize,
    _guard: OpenGuard,
}

impl<E> ResultSet<'_, E> {
    /// Number of matches, consumed or not.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Remaining match positions; closes the result set.
    pub fn into_positions(self) -> Vec<usize> {
        self.positions.as_slice().to_vec()
    }

    pub fn close(self) {}
}

impl<'a, E> Iterator for ResultSet<'a, E> {
    type Item = &'a E;

    fn next(&mut self) -> Option<&'a E> {
        self.positions.next().map(|position| &self.items[position])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.positions.size_hint()
    }
}

impl<E> ExactSizeIterator for ResultSet<'_, E> {}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use acuity_model::{AdverseEvent, AeFilters, DatasetId, Subject, SubjectAware};

    use super::*;

    fn events() -> IndexedCollection<SubjectAware<AdverseEvent>> {
        let subject = |id: &str| {
            Arc::new(Subject::new(
                SubjectId::new(id).unwrap(),
                DatasetId::new("STUDY").unwrap(),
            ))
        };
        let (s1, s2) = (subject("S1"), subject("S2"));
        let ae = |id: &str, owner: &Arc<Subject>, severity: Option<&str>| {
            let mut event = AdverseEvent::new(id, owner.subject_id.clone());
            event.severity = severity.map(str::to_string);
            SubjectAware::new(event, Arc::clone(owner))
        };
        IndexedCollection::new(vec![
            ae("AE1", &s1, Some("Mild")),
            ae("AE2", &s1, Some("Severe")),
            ae("AE3", &s2, None),
            ae("AE4", &s2, Some("Mild")),
        ])
    }

    fn ids(set: ResultSet<'_, SubjectAware<AdverseEvent>>) -> Vec<String> {
        set.map(|e| e.event().event_id.clone()).collect()
    }

    #[test]
    fn unconstrained_retrieval_skips_the_index() {
        let events = events();
        let all = events.retrieve(&Predicate::all());
        assert_eq!(all.total(), 4);
        assert!(!events.is_indexed());
    }

    #[test]
    fn set_constraint_honours_empty_values() {
        let events = events();
        let filters = AeFilters {
            severity: SetFilter::of(["Mild"]),
            ..AeFilters::default()
        };
        let with_empty = events.retrieve(&Predicate::all().with_filters(filters.clone()));
        assert_eq!(ids(with_empty), vec!["AE1", "AE3", "AE4"]);
        let strict = AeFilters {
            severity: filters.severity.excluding_empty(),
            ..AeFilters::default()
        };
        assert_eq!(
            ids(events.retrieve(&Predicate::all().with_filters(strict))),
            vec!["AE1", "AE4"]
        );
        assert!(events.is_indexed());
    }

    #[test]
    fn subject_and_facet_constraints_intersect() {
        let events = events();
        let subjects = HashSet::from([SubjectId::new("S2").unwrap()]);
        let filters = AeFilters {
            severity: SetFilter::of(["Mild"]).excluding_empty(),
            ..AeFilters::default()
        };
        let matched = events.retrieve(&Predicate::for_subjects(subjects).with_filters(filters));
        assert_eq!(ids(matched), vec!["AE4"]);
    }

    #[test]
    fn result_sets_are_released() {
        let events = events();
        let first = events.retrieve(&Predicate::all());
        let second = events.retrieve(&Predicate::all());
        assert_eq!(events.open_result_sets(), 2);
        first.close();
        assert_eq!(events.open_result_sets(), 1);
        drop(second);
        assert_eq!(events.open_result_sets(), 0);
    }

    #[test]
    fn inverted_range_matches_only_empties() {
        let postings = BTreeMap::from([(TotalF64::new(1.0), vec![0]), (TotalF64::new(2.0), vec![1])]);
        let found = range_candidates(
            &postings,
            &[2],
            (Some(TotalF64::new(3.0)), Some(TotalF64::new(1.0))),
            true,
        );
        assert_eq!(found, vec![2]);
    }

    #[test]
    fn negative_zero_is_zero() {
        assert_eq!(TotalF64::new(-0.0), TotalF64::new(0.0));
    }
}
