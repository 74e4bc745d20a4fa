use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::filters::{Attribute, Facet, FacetMut, Filters, RangeFilter, SetFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AeAttr {
    PreferredTerm,
    HighLevelTerm,
    SystemOrganClass,
    Severity,
    Serious,
    Causality,
    Outcome,
    StartDate,
    EndDate,
    DaysOnStudy,
}

impl AeAttr {
    pub const ALL: &'static [AeAttr] = &[
        AeAttr::PreferredTerm,
        AeAttr::HighLevelTerm,
        AeAttr::SystemOrganClass,
        AeAttr::Severity,
        AeAttr::Serious,
        AeAttr::Causality,
        AeAttr::Outcome,
        AeAttr::StartDate,
        AeAttr::EndDate,
        AeAttr::DaysOnStudy,
    ];
}

impl Attribute for AeAttr {
    fn name(&self) -> &'static str {
        match self {
            AeAttr::PreferredTerm => "preferred_term",
            AeAttr::HighLevelTerm => "high_level_term",
            AeAttr::SystemOrganClass => "system_organ_class",
            AeAttr::Severity => "severity",
            AeAttr::Serious => "serious",
            AeAttr::Causality => "causality",
            AeAttr::Outcome => "outcome",
            AeAttr::StartDate => "start_date",
            AeAttr::EndDate => "end_date",
            AeAttr::DaysOnStudy => "days_on_study",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AeFilters {
    pub preferred_term: SetFilter,
    pub high_level_term: SetFilter,
    pub system_organ_class: SetFilter,
    pub severity: SetFilter,
    pub serious: SetFilter,
    pub causality: SetFilter,
    pub outcome: SetFilter,
    pub start_date: RangeFilter<NaiveDateTime>,
    pub end_date: RangeFilter<NaiveDateTime>,
    pub days_on_study: RangeFilter<f64>,
    pub matched_item_count: usize,
}

impl Filters for AeFilters {
    type Attr = AeAttr;

    fn attributes() -> &'static [AeAttr] {
        AeAttr::ALL
    }

    fn facet(&self, attr: AeAttr) -> Facet<'_> {
        match attr {
            AeAttr::PreferredTerm => Facet::Set(&self.preferred_term),
            AeAttr::HighLevelTerm => Facet::Set(&self.high_level_term),
            AeAttr::SystemOrganClass => Facet::Set(&self.system_organ_class),
            AeAttr::Severity => Facet::Set(&self.severity),
            AeAttr::Serious => Facet::Set(&self.serious),
            AeAttr::Causality => Facet::Set(&self.causality),
            AeAttr::Outcome => Facet::Set(&self.outcome),
            AeAttr::StartDate => Facet::Date(&self.start_date),
            AeAttr::EndDate => Facet::Date(&self.end_date),
            AeAttr::DaysOnStudy => Facet::Number(&self.days_on_study),
        }
    }

    fn facet_mut(&mut self, attr: AeAttr) -> FacetMut<'_> {
        match attr {
            AeAttr::PreferredTerm => FacetMut::Set(&mut self.preferred_term),
            AeAttr::HighLevelTerm => FacetMut::Set(&mut self.high_level_term),
            AeAttr::SystemOrganClass => FacetMut::Set(&mut self.system_organ_class),
            AeAttr::Severity => FacetMut::Set(&mut self.severity),
            AeAttr::Serious => FacetMut::Set(&mut self.serious),
            AeAttr::Causality => FacetMut::Set(&mut self.causality),
            AeAttr::Outcome => FacetMut::Set(&mut self.outcome),
            AeAttr::StartDate => FacetMut::Date(&mut self.start_date),
            AeAttr::EndDate => FacetMut::Date(&mut self.end_date),
            AeAttr::DaysOnStudy => FacetMut::Number(&mut self.days_on_study),
        }
    }

    fn matched_item_count(&self) -> usize {
        self.matched_item_count
    }

    fn set_matched_item_count(&mut self, count: usize) {
        self.matched_item_count = count;
    }
}
