use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::filters::{Attribute, Facet, FacetMut, Filters, RangeFilter, SetFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenalAttr {
    LabCode,
    Method,
    Value,
    CkdStage,
    IsBaseline,
    ChangeFromBaseline,
    MeasurementDate,
    VisitNumber,
    DaysOnStudy,
}

impl RenalAttr {
    pub const ALL: &'static [RenalAttr] = &[
        RenalAttr::LabCode,
        RenalAttr::Method,
        RenalAttr::Value,
        RenalAttr::CkdStage,
        RenalAttr::IsBaseline,
        RenalAttr::ChangeFromBaseline,
        RenalAttr::MeasurementDate,
        RenalAttr::VisitNumber,
        RenalAttr::DaysOnStudy,
    ];
}

impl Attribute for RenalAttr {
    fn name(&self) -> &'static str {
        match self {
            RenalAttr::LabCode => "lab_code",
            RenalAttr::Method => "method",
            RenalAttr::Value => "value",
            RenalAttr::CkdStage => "ckd_stage",
            RenalAttr::IsBaseline => "is_baseline",
            RenalAttr::ChangeFromBaseline => "change_from_baseline",
            RenalAttr::MeasurementDate => "measurement_date",
            RenalAttr::VisitNumber => "visit_number",
            RenalAttr::DaysOnStudy => "days_on_study",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenalFilters {
    pub lab_code: SetFilter,
    pub method: SetFilter,
    pub value: RangeFilter<f64>,
    pub ckd_stage: SetFilter,
    pub is_baseline: SetFilter,
    pub change_from_baseline: RangeFilter<f64>,
    pub measurement_date: RangeFilter<NaiveDateTime>,
    pub visit_number: RangeFilter<f64>,
    pub days_on_study: RangeFilter<f64>,
    pub matched_item_count: usize,
}

impl Filters for RenalFilters {
    type Attr = RenalAttr;

    fn attributes() -> &'static [RenalAttr] {
        RenalAttr::ALL
    }

    fn facet(&self, attr: RenalAttr) -> Facet<'_> {
        match attr {
            RenalAttr::LabCode => Facet::Set(&self.lab_code),
            RenalAttr::Method => Facet::Set(&self.method),
            RenalAttr::Value => Facet::Number(&self.value),
            RenalAttr::CkdStage => Facet::Set(&self.ckd_stage),
            RenalAttr::IsBaseline => Facet::Set(&self.is_baseline),
            RenalAttr::ChangeFromBaseline => Facet::Number(&self.change_from_baseline),
            RenalAttr::MeasurementDate => Facet::Date(&self.measurement_date),
            RenalAttr::VisitNumber => Facet::Number(&self.visit_number),
            RenalAttr::DaysOnStudy => Facet::Number(&self.days_on_study),
        }
    }

    fn facet_mut(&mut self, attr: RenalAttr) -> FacetMut<'_> {
        match attr {
            RenalAttr::LabCode => FacetMut::Set(&mut self.lab_code),
            RenalAttr::Method => FacetMut::Set(&mut self.method),
            RenalAttr::Value => FacetMut::Number(&mut self.value),
            RenalAttr::CkdStage => FacetMut::Set(&mut self.ckd_stage),
            RenalAttr::IsBaseline => FacetMut::Set(&mut self.is_baseline),
            RenalAttr::ChangeFromBaseline => FacetMut::Number(&mut self.change_from_baseline),
            RenalAttr::MeasurementDate => FacetMut::Date(&mut self.measurement_date),
            RenalAttr::VisitNumber => FacetMut::Number(&mut self.visit_number),
            RenalAttr::DaysOnStudy => FacetMut::Number(&mut self.days_on_study),
        }
    }

    fn matched_item_count(&self) -> usize {
        self.matched_item_count
    }

    fn set_matched_item_count(&mut self, count: usize) {
        self.matched_item_count = count;
    }
}
