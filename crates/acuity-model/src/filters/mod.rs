//! Filter facets shared by every domain.
//!
//! A Filters object plays two roles. As input it describes the selection
//! the user made; as output of a query it describes which values and
//! ranges remain available. Each filterable attribute maps to one facet:
//!
//! - [`SetFilter`]: discrete selection over text values
//! - [`RangeFilter`]: inclusive numeric or date range
//!
//! A facet with nothing selected does not constrain the query. Empty
//! (missing) attribute values pass a constrained facet only when
//! `include_empty_values` is set, which is the default.

pub mod ae;
pub mod dose;
pub mod lab;
pub mod population;
pub mod renal;
pub mod tumour;

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::hash::Hash;

use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

fn include_empty_default() -> bool {
    true
}

/// Discrete value selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetFilter {
    #[serde(default)]
    pub values: BTreeSet<String>,
    #[serde(default = "include_empty_default")]
    pub include_empty_values: bool,
}

impl Default for SetFilter {
    fn default() -> Self {
        Self {
            values: BTreeSet::new(),
            include_empty_values: true,
        }
    }
}

impl SetFilter {
    pub fn of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            include_empty_values: true,
        }
    }

    pub fn excluding_empty(mut self) -> Self {
        self.include_empty_values = false;
        self
    }

    pub fn is_constrained(&self) -> bool {
        !self.values.is_empty()
    }

    pub fn matches(&self, value: Option<&str>) -> bool {
        if !self.is_constrained() {
            return true;
        }
        match value {
            Some(value) => self.values.contains(value),
            None => self.include_empty_values,
        }
    }

    /// Multi-valued attributes match when any of their values is selected.
    pub fn matches_any(&self, values: &[&str]) -> bool {
        if !self.is_constrained() {
            return true;
        }
        if values.is_empty() {
            return self.include_empty_values;
        }
        values.iter().any(|value| self.values.contains(*value))
    }

    /// Widen the facet to include `value`.
    pub fn complete(&mut self, value: Option<&str>) {
        match value {
            Some(value) => {
                if !self.values.contains(value) {
                    self.values.insert(value.to_string());
                }
            }
            None => self.include_empty_values = true,
        }
    }

    fn reset_observed(&mut self) {
        self.values.clear();
        self.include_empty_values = false;
    }
}

/// Inclusive `[from, to]` range; either bound may be open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeFilter<T> {
    #[serde(default)]
    pub from: Option<T>,
    #[serde(default)]
    pub to: Option<T>,
    #[serde(default = "include_empty_default")]
    pub include_empty_values: bool,
}

impl<T> Default for RangeFilter<T> {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            include_empty_values: true,
        }
    }
}

impl<T: Copy + PartialOrd> RangeFilter<T> {
    pub fn between(from: Option<T>, to: Option<T>) -> Self {
        Self {
            from,
            to,
            include_empty_values: true,
        }
    }

    pub fn excluding_empty(mut self) -> Self {
        self.include_empty_values = false;
        self
    }

    pub fn is_constrained(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    pub fn matches(&self, value: Option<T>) -> bool {
        if !self.is_constrained() {
            return true;
        }
        match value.filter(is_comparable) {
            Some(value) => {
                self.from.is_none_or(|from| value >= from) && self.to.is_none_or(|to| value <= to)
            }
            None => self.include_empty_values,
        }
    }

    /// Widen the range to include `value`. Incomparable values (NaN)
    /// count as empty.
    pub fn complete(&mut self, value: Option<T>) {
        match value.filter(is_comparable) {
            Some(value) => {
                if self.from.is_none_or(|from| value < from) {
                    self.from = Some(value);
                }
                if self.to.is_none_or(|to| value > to) {
                    self.to = Some(value);
                }
            }
            None => self.include_empty_values = true,
        }
    }

    fn reset_observed(&mut self) {
        self.from = None;
        self.to = None;
        self.include_empty_values = false;
    }
}

fn is_comparable<T: PartialOrd>(value: &T) -> bool {
    value.partial_cmp(value).is_some()
}

/// Value of one attribute of one event, as seen by filters and indexes.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue<'a> {
    Text(Option<&'a str>),
    /// Multi-valued text; an empty list is an empty value.
    Texts(Vec<&'a str>),
    Number(Option<f64>),
    Date(Option<NaiveDateTime>),
}

impl AttrValue<'_> {
    pub fn flag(value: bool) -> AttrValue<'static> {
        AttrValue::Text(Some(if value { "Yes" } else { "No" }))
    }

    pub fn maybe_flag(value: Option<bool>) -> AttrValue<'static> {
        match value {
            Some(value) => AttrValue::flag(value),
            None => AttrValue::Text(None),
        }
    }

    pub fn count(value: Option<i64>) -> AttrValue<'static> {
        AttrValue::Number(value.map(|value| value as f64))
    }
}

/// Read access to one facet.
#[derive(Debug, Clone, Copy)]
pub enum Facet<'a> {
    Set(&'a SetFilter),
    Number(&'a RangeFilter<f64>),
    Date(&'a RangeFilter<NaiveDateTime>),
}

impl Facet<'_> {
    pub fn is_constrained(&self) -> bool {
        match self {
            Facet::Set(filter) => filter.is_constrained(),
            Facet::Number(filter) => filter.is_constrained(),
            Facet::Date(filter) => filter.is_constrained(),
        }
    }

    pub fn include_empty_values(&self) -> bool {
        match self {
            Facet::Set(filter) => filter.include_empty_values,
            Facet::Number(filter) => filter.include_empty_values,
            Facet::Date(filter) => filter.include_empty_values,
        }
    }

    /// Whether `value` passes this facet. A value of the wrong kind never
    /// passes.
    pub fn matches(&self, value: &AttrValue<'_>) -> bool {
        match (self, value) {
            (Facet::Set(filter), AttrValue::Text(value)) => filter.matches(*value),
            (Facet::Set(filter), AttrValue::Texts(values)) => filter.matches_any(values),
            (Facet::Number(filter), AttrValue::Number(value)) => filter.matches(*value),
            (Facet::Date(filter), AttrValue::Date(value)) => filter.matches(*value),
            _ => false,
        }
    }

    pub fn accepts_kind_of(&self, value: &AttrValue<'_>) -> bool {
        matches!(
            (self, value),
            (Facet::Set(_), AttrValue::Text(_) | AttrValue::Texts(_))
                | (Facet::Number(_), AttrValue::Number(_))
                | (Facet::Date(_), AttrValue::Date(_))
        )
    }
}

/// Write access to one facet, used when collecting available filters.
#[derive(Debug)]
pub enum FacetMut<'a> {
    Set(&'a mut SetFilter),
    Number(&'a mut RangeFilter<f64>),
    Date(&'a mut RangeFilter<NaiveDateTime>),
}

impl FacetMut<'_> {
    pub fn observe(&mut self, value: &AttrValue<'_>) {
        match (self, value) {
            (FacetMut::Set(filter), AttrValue::Text(value)) => filter.complete(*value),
            (FacetMut::Set(filter), AttrValue::Texts(values)) => {
                if values.is_empty() {
                    filter.complete(None);
                }
                for value in values {
                    filter.complete(Some(*value));
                }
            }
            (FacetMut::Number(filter), AttrValue::Number(value)) => filter.complete(*value),
            (FacetMut::Date(filter), AttrValue::Date(value)) => filter.complete(*value),
            _ => {}
        }
    }

    pub fn reset_observed(&mut self) {
        match self {
            FacetMut::Set(filter) => filter.reset_observed(),
            FacetMut::Number(filter) => filter.reset_observed(),
            FacetMut::Date(filter) => filter.reset_observed(),
        }
    }
}

/// A filterable attribute of one domain.
pub trait Attribute: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    fn name(&self) -> &'static str;
}

/// Per-domain filter object: one facet per attribute.
pub trait Filters:
    Clone + Default + PartialEq + Debug + Serialize + DeserializeOwned + Send + Sync
{
    type Attr: Attribute;

    /// Every filterable attribute of the domain, in display order.
    fn attributes() -> &'static [Self::Attr];

    fn facet(&self, attr: Self::Attr) -> Facet<'_>;

    fn facet_mut(&mut self, attr: Self::Attr) -> FacetMut<'_>;

    fn matched_item_count(&self) -> usize;

    fn set_matched_item_count(&mut self, count: usize);

    /// A filter that constrains nothing.
    fn empty() -> Self {
        Self::default()
    }

    fn is_empty(&self) -> bool {
        Self::attributes()
            .iter()
            .all(|attr| !self.facet(*attr).is_constrained())
    }

    fn constrained_attributes(&self) -> Vec<Self::Attr> {
        Self::attributes()
            .iter()
            .copied()
            .filter(|attr| self.facet(*attr).is_constrained())
            .collect()
    }

    /// A filter with every facet cleared, ready to be widened by
    /// observations.
    fn unobserved() -> Self {
        let mut filters = Self::default();
        for attr in Self::attributes() {
            filters.facet_mut(*attr).reset_observed();
        }
        filters
    }
}
