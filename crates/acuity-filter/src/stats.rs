//! Available-filter statistics.
//!
//! A fold over filtered items that widens each facet of a fresh, cleared
//! Filters object: ranges stretch to cover every value seen, sets collect
//! distinct values, and any empty value switches `include_empty_values` on.

use acuity_model::Filters;

use crate::indexed::{FiltersOf, Indexed};

/// Incremental accumulator for one domain's available filters.
pub struct FilterStatsCollector<E: Indexed> {
    filters: FiltersOf<E>,
    count: usize,
}

impl<E: Indexed> Default for FilterStatsCollector<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Indexed> FilterStatsCollector<E> {
    pub fn new() -> Self {
        Self {
            filters: <FiltersOf<E> as Filters>::unobserved(),
            count: 0,
        }
    }

    pub fn observe(&mut self, item: &E) {
        for attr in <FiltersOf<E> as Filters>::attributes() {
            self.filters
                .facet_mut(*attr)
                .observe(&item.attribute(*attr));
        }
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn finish(mut self) -> FiltersOf<E> {
        self.filters.set_matched_item_count(self.count);
        self.filters
    }
}

impl<'a, E: Indexed + 'a> Extend<&'a E> for FilterStatsCollector<E> {
    fn extend<I: IntoIterator<Item = &'a E>>(&mut self, items: I) {
        for item in items {
            self.observe(item);
        }
    }
}

/// Fold `items` into the filters they make available.
pub fn collect_filters<'a, E, I>(items: I) -> FiltersOf<E>
where
    E: Indexed + 'a,
    I: IntoIterator<Item = &'a E>,
{
    let mut collector = FilterStatsCollector::new();
    collector.extend(items);
    collector.finish()
}
