use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::filters::{Attribute, Facet, FacetMut, Filters, RangeFilter, SetFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DoseAttr {
    Drug,
    Dose,
    DoseUnit,
    Frequency,
    PeriodType,
    StartDate,
    EndDate,
    DaysOnStudy,
}

impl DoseAttr {
    pub const ALL: &'static [DoseAttr] = &[
        DoseAttr::Drug,
        DoseAttr::Dose,
        DoseAttr::DoseUnit,
        DoseAttr::Frequency,
        DoseAttr::PeriodType,
        DoseAttr::StartDate,
        DoseAttr::EndDate,
        DoseAttr::DaysOnStudy,
    ];
}

impl Attribute for DoseAttr {
    fn name(&self) -> &'static str {
        match self {
            DoseAttr::Drug => "drug",
            DoseAttr::Dose => "dose",
            DoseAttr::DoseUnit => "dose_unit",
            DoseAttr::Frequency => "frequency",
            DoseAttr::PeriodType => "period_type",
            DoseAttr::StartDate => "start_date",
            DoseAttr::EndDate => "end_date",
            DoseAttr::DaysOnStudy => "days_on_study",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoseFilters {
    pub drug: SetFilter,
    pub dose: RangeFilter<f64>,
    pub dose_unit: SetFilter,
    pub frequency: SetFilter,
    pub period_type: SetFilter,
    pub start_date: RangeFilter<NaiveDateTime>,
    pub end_date: RangeFilter<NaiveDateTime>,
    pub days_on_study: RangeFilter<f64>,
    pub matched_item_count: usize,
}

impl Filters for DoseFilters {
    type Attr = DoseAttr;

    fn attributes() -> &'static [DoseAttr] {
        DoseAttr::ALL
    }

    fn facet(&self, attr: DoseAttr) -> Facet<'_> {
        match attr {
            DoseAttr::Drug => Facet::Set(&self.drug),
            DoseAttr::Dose => Facet::Number(&self.dose),
            DoseAttr::DoseUnit => Facet::Set(&self.dose_unit),
            DoseAttr::Frequency => Facet::Set(&self.frequency),
            DoseAttr::PeriodType => Facet::Set(&self.period_type),
            DoseAttr::StartDate => Facet::Date(&self.start_date),
            DoseAttr::EndDate => Facet::Date(&self.end_date),
            DoseAttr::DaysOnStudy => Facet::Number(&self.days_on_study),
        }
    }

    fn facet_mut(&mut self, attr: DoseAttr) -> FacetMut<'_> {
        match attr {
            DoseAttr::Drug => FacetMut::Set(&mut self.drug),
            DoseAttr::Dose => FacetMut::Number(&mut self.dose),
            DoseAttr::DoseUnit => FacetMut::Set(&mut self.dose_unit),
            DoseAttr::Frequency => FacetMut::Set(&mut self.frequency),
            DoseAttr::PeriodType => FacetMut::Set(&mut self.period_type),
            DoseAttr::StartDate => FacetMut::Date(&mut self.start_date),
            DoseAttr::EndDate => FacetMut::Date(&mut self.end_date),
            DoseAttr::DaysOnStudy => FacetMut::Number(&mut self.days_on_study),
        }
    }

    fn matched_item_count(&self) -> usize {
        self.matched_item_count
    }

    fn set_matched_item_count(&mut self, count: usize) {
        self.matched_item_count = count;
    }
}
