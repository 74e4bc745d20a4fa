//! Predicates over indexed items.

use std::collections::HashSet;

use acuity_model::{Facet, Filters, SubjectId};

use crate::indexed::Indexed;

/// A subject restriction combined with the constrained facets of a filter.
///
/// Unconstrained facets are dropped up front; a predicate with no subject
/// restriction and no constraints matches everything.
#[derive(Debug, Clone)]
pub struct Predicate<F: Filters> {
    subjects: Option<HashSet<SubjectId>>,
    constrained: Vec<F::Attr>,
    filters: F,
}

impl<F: Filters> Default for Predicate<F> {
    fn default() -> Self {
        Self::all()
    }
}

impl<F: Filters> Predicate<F> {
    pub fn all() -> Self {
        Self {
            subjects: None,
            constrained: Vec::new(),
            filters: F::empty(),
        }
    }

    pub fn for_subjects(subjects: HashSet<SubjectId>) -> Self {
        Self {
            subjects: Some(subjects),
            ..Self::all()
        }
    }

    pub fn with_filters(mut self, filters: F) -> Self {
        self.constrained = filters.constrained_attributes();
        self.filters = filters;
        self
    }

    pub fn subjects(&self) -> Option<&HashSet<SubjectId>> {
        self.subjects.as_ref()
    }

    /// Constrained attributes with their facets.
    pub fn constraints(&self) -> impl Iterator<Item = (F::Attr, Facet<'_>)> + '_ {
        self.constrained
            .iter()
            .map(|attr| (*attr, self.filters.facet(*attr)))
    }

    pub fn is_unconstrained(&self) -> bool {
        self.subjects.is_none() && self.constrained.is_empty()
    }

    /// Evaluate the predicate against one item without an index.
    pub fn matches<E>(&self, item: &E) -> bool
    where
        E: Indexed<Filters = F>,
    {
        if let Some(subjects) = &self.subjects
            && !subjects.contains(item.subject_id())
        {
            return false;
        }
        self.constraints()
            .all(|(attr, facet)| facet.matches(&item.attribute(attr)))
    }
}

#[cfg(test)]
mod tests {
    use acuity_model::{AeAttr, AeFilters, SetFilter};

    use super::*;

    #[test]
    fn only_constrained_facets_are_kept() {
        let filters = AeFilters {
            severity: SetFilter::of(["Mild"]),
            ..AeFilters::default()
        };
        let predicate = Predicate::all().with_filters(filters);
        let attrs: Vec<AeAttr> = predicate.constraints().map(|(attr, _)| attr).collect();
        assert_eq!(attrs, vec![AeAttr::Severity]);
        assert!(!predicate.is_unconstrained());
        assert!(Predicate::<AeFilters>::all().is_unconstrained());
    }
}
