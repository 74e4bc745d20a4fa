use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::filters::{Attribute, Facet, FacetMut, Filters, RangeFilter, SetFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabAttr {
    LabCode,
    LabCategory,
    Unit,
    Value,
    BaselineValue,
    IsBaseline,
    ChangeFromBaseline,
    PercentChangeFromBaseline,
    OutOfRange,
    MeasurementDate,
    VisitNumber,
    DaysOnStudy,
}

impl LabAttr {
    pub const ALL: &'static [LabAttr] = &[
        LabAttr::LabCode,
        LabAttr::LabCategory,
        LabAttr::Unit,
        LabAttr::Value,
        LabAttr::BaselineValue,
        LabAttr::IsBaseline,
        LabAttr::ChangeFromBaseline,
        LabAttr::PercentChangeFromBaseline,
        LabAttr::OutOfRange,
        LabAttr::MeasurementDate,
        LabAttr::VisitNumber,
        LabAttr::DaysOnStudy,
    ];
}

impl Attribute for LabAttr {
    fn name(&self) -> &'static str {
        match self {
            LabAttr::LabCode => "lab_code",
            LabAttr::LabCategory => "lab_category",
            LabAttr::Unit => "unit",
            LabAttr::Value => "value",
            LabAttr::BaselineValue => "baseline_value",
            LabAttr::IsBaseline => "is_baseline",
            LabAttr::ChangeFromBaseline => "change_from_baseline",
            LabAttr::PercentChangeFromBaseline => "percent_change_from_baseline",
            LabAttr::OutOfRange => "out_of_range",
            LabAttr::MeasurementDate => "measurement_date",
            LabAttr::VisitNumber => "visit_number",
            LabAttr::DaysOnStudy => "days_on_study",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabFilters {
    pub lab_code: SetFilter,
    pub lab_category: SetFilter,
    pub unit: SetFilter,
    pub value: RangeFilter<f64>,
    pub baseline_value: RangeFilter<f64>,
    pub is_baseline: SetFilter,
    pub change_from_baseline: RangeFilter<f64>,
    pub percent_change_from_baseline: RangeFilter<f64>,
    pub out_of_range: SetFilter,
    pub measurement_date: RangeFilter<NaiveDateTime>,
    pub visit_number: RangeFilter<f64>,
    pub days_on_study: RangeFilter<f64>,
    pub matched_item_count: usize,
}

impl Filters for LabFilters {
    type Attr = LabAttr;

    fn attributes() -> &'static [LabAttr] {
        LabAttr::ALL
    }

    fn facet(&self, attr: LabAttr) -> Facet<'_> {
        match attr {
            LabAttr::LabCode => Facet::Set(&self.lab_code),
            LabAttr::LabCategory => Facet::Set(&self.lab_category),
            LabAttr::Unit => Facet::Set(&self.unit),
            LabAttr::Value => Facet::Number(&self.value),
            LabAttr::BaselineValue => Facet::Number(&self.baseline_value),
            LabAttr::IsBaseline => Facet::Set(&self.is_baseline),
            LabAttr::ChangeFromBaseline => Facet::Number(&self.change_from_baseline),
            LabAttr::PercentChangeFromBaseline => {
                Facet::Number(&self.percent_change_from_baseline)
            }
            LabAttr::OutOfRange => Facet::Set(&self.out_of_range),
            LabAttr::MeasurementDate => Facet::Date(&self.measurement_date),
            LabAttr::VisitNumber => Facet::Number(&self.visit_number),
            LabAttr::DaysOnStudy => Facet::Number(&self.days_on_study),
        }
    }

    fn facet_mut(&mut self, attr: LabAttr) -> FacetMut<'_> {
        match attr {
            LabAttr::LabCode => FacetMut::Set(&mut self.lab_code),
            LabAttr::LabCategory => FacetMut::Set(&mut self.lab_category),
            LabAttr::Unit => FacetMut::Set(&mut self.unit),
            LabAttr::Value => FacetMut::Number(&mut self.value),
            LabAttr::BaselineValue => FacetMut::Number(&mut self.baseline_value),
            LabAttr::IsBaseline => FacetMut::Set(&mut self.is_baseline),
            LabAttr::ChangeFromBaseline => FacetMut::Number(&mut self.change_from_baseline),
            LabAttr::PercentChangeFromBaseline => {
                FacetMut::Number(&mut self.percent_change_from_baseline)
            }
            LabAttr::OutOfRange => FacetMut::Set(&mut self.out_of_range),
            LabAttr::MeasurementDate => FacetMut::Date(&mut self.measurement_date),
            LabAttr::VisitNumber => FacetMut::Number(&mut self.visit_number),
            LabAttr::DaysOnStudy => FacetMut::Number(&mut self.days_on_study),
        }
    }

    fn matched_item_count(&self) -> usize {
        self.matched_item_count
    }

    fn set_matched_item_count(&mut self, count: usize) {
        self.matched_item_count = count;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VitalAttr {
    TestName,
    Unit,
    Value,
    BaselineValue,
    IsBaseline,
    ChangeFromBaseline,
    PercentChangeFromBaseline,
    MeasurementDate,
    VisitNumber,
    DaysOnStudy,
}

impl VitalAttr {
    pub const ALL: &'static [VitalAttr] = &[
        VitalAttr::TestName,
        VitalAttr::Unit,
        VitalAttr::Value,
        VitalAttr::BaselineValue,
        VitalAttr::IsBaseline,
        VitalAttr::ChangeFromBaseline,
        VitalAttr::PercentChangeFromBaseline,
        VitalAttr::MeasurementDate,
        VitalAttr::VisitNumber,
        VitalAttr::DaysOnStudy,
    ];
}

impl Attribute for VitalAttr {
    fn name(&self) -> &'static str {
        match self {
            VitalAttr::TestName => "test_name",
            VitalAttr::Unit => "unit",
            VitalAttr::Value => "value",
            VitalAttr::BaselineValue => "baseline_value",
            VitalAttr::IsBaseline => "is_baseline",
            VitalAttr::ChangeFromBaseline => "change_from_baseline",
            VitalAttr::PercentChangeFromBaseline => "percent_change_from_baseline",
            VitalAttr::MeasurementDate => "measurement_date",
            VitalAttr::VisitNumber => "visit_number",
            VitalAttr::DaysOnStudy => "days_on_study",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalFilters {
    pub test_name: SetFilter,
    pub unit: SetFilter,
    pub value: RangeFilter<f64>,
    pub baseline_value: RangeFilter<f64>,
    pub is_baseline: SetFilter,
    pub change_from_baseline: RangeFilter<f64>,
    pub percent_change_from_baseline: RangeFilter<f64>,
    pub measurement_date: RangeFilter<NaiveDateTime>,
    pub visit_number: RangeFilter<f64>,
    pub days_on_study: RangeFilter<f64>,
    pub matched_item_count: usize,
}

impl Filters for VitalFilters {
    type Attr = VitalAttr;

    fn attributes() -> &'static [VitalAttr] {
        VitalAttr::ALL
    }

    fn facet(&self, attr: VitalAttr) -> Facet<'_> {
        match attr {
            VitalAttr::TestName => Facet::Set(&self.test_name),
            VitalAttr::Unit => Facet::Set(&self.unit),
            VitalAttr::Value => Facet::Number(&self.value),
            VitalAttr::BaselineValue => Facet::Number(&self.baseline_value),
            VitalAttr::IsBaseline => Facet::Set(&self.is_baseline),
            VitalAttr::ChangeFromBaseline => Facet::Number(&self.change_from_baseline),
            VitalAttr::PercentChangeFromBaseline => {
                Facet::Number(&self.percent_change_from_baseline)
            }
            VitalAttr::MeasurementDate => Facet::Date(&self.measurement_date),
            VitalAttr::VisitNumber => Facet::Number(&self.visit_number),
            VitalAttr::DaysOnStudy => Facet::Number(&self.days_on_study),
        }
    }

    fn facet_mut(&mut self, attr: VitalAttr) -> FacetMut<'_> {
        match attr {
            VitalAttr::TestName => FacetMut::Set(&mut self.test_name),
            VitalAttr::Unit => FacetMut::Set(&mut self.unit),
            VitalAttr::Value => FacetMut::Number(&mut self.value),
            VitalAttr::BaselineValue => FacetMut::Number(&mut self.baseline_value),
            VitalAttr::IsBaseline => FacetMut::Set(&mut self.is_baseline),
            VitalAttr::ChangeFromBaseline => FacetMut::Number(&mut self.change_from_baseline),
            VitalAttr::PercentChangeFromBaseline => {
                FacetMut::Number(&mut self.percent_change_from_baseline)
            }
            VitalAttr::MeasurementDate => FacetMut::Date(&mut self.measurement_date),
            VitalAttr::VisitNumber => FacetMut::Number(&mut self.visit_number),
            VitalAttr::DaysOnStudy => FacetMut::Number(&mut self.days_on_study),
        }
    }

    fn matched_item_count(&self) -> usize {
        self.matched_item_count
    }

    fn set_matched_item_count(&mut self, count: usize) {
        self.matched_item_count = count;
    }
}
