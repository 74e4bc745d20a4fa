use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::filters::{Attribute, Facet, FacetMut, Filters, RangeFilter, SetFilter};

/// Filterable attributes of assessed target lesions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TumourAttr {
    LesionSite,
    VisitNumber,
    LesionDate,
    LesionPercentageChange,
    SumPercentageChange,
    BestPercentageChange,
    Response,
    BestResponse,
    IsBestResponse,
    IsBaseline,
    MissingTargetLesions,
    AssessmentWeek,
    DaysOnStudy,
}

impl TumourAttr {
    pub const ALL: &'static [TumourAttr] = &[
        TumourAttr::LesionSite,
        TumourAttr::VisitNumber,
        TumourAttr::LesionDate,
        TumourAttr::LesionPercentageChange,
        TumourAttr::SumPercentageChange,
        TumourAttr::BestPercentageChange,
        TumourAttr::Response,
        TumourAttr::BestResponse,
        TumourAttr::IsBestResponse,
        TumourAttr::IsBaseline,
        TumourAttr::MissingTargetLesions,
        TumourAttr::AssessmentWeek,
        TumourAttr::DaysOnStudy,
    ];
}

impl Attribute for TumourAttr {
    fn name(&self) -> &'static str {
        match self {
            TumourAttr::LesionSite => "lesion_site",
            TumourAttr::VisitNumber => "visit_number",
            TumourAttr::LesionDate => "lesion_date",
            TumourAttr::LesionPercentageChange => "lesion_percentage_change",
            TumourAttr::SumPercentageChange => "sum_percentage_change",
            TumourAttr::BestPercentageChange => "best_percentage_change",
            TumourAttr::Response => "response",
            TumourAttr::BestResponse => "best_response",
            TumourAttr::IsBestResponse => "is_best_response",
            TumourAttr::IsBaseline => "is_baseline",
            TumourAttr::MissingTargetLesions => "missing_target_lesions",
            TumourAttr::AssessmentWeek => "assessment_week",
            TumourAttr::DaysOnStudy => "days_on_study",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TumourFilters {
    pub lesion_site: SetFilter,
    pub visit_number: RangeFilter<f64>,
    pub lesion_date: RangeFilter<NaiveDateTime>,
    pub lesion_percentage_change: RangeFilter<f64>,
    pub sum_percentage_change: RangeFilter<f64>,
    pub best_percentage_change: RangeFilter<f64>,
    pub response: SetFilter,
    pub best_response: SetFilter,
    pub is_best_response: SetFilter,
    pub is_baseline: SetFilter,
    pub missing_target_lesions: SetFilter,
    pub assessment_week: RangeFilter<f64>,
    pub days_on_study: RangeFilter<f64>,
    pub matched_item_count: usize,
}

impl Filters for TumourFilters {
    type Attr = TumourAttr;

    fn attributes() -> &'static [TumourAttr] {
        TumourAttr::ALL
    }

    fn facet(&self, attr: TumourAttr) -> Facet<'_> {
        match attr {
            TumourAttr::LesionSite => Facet::Set(&self.lesion_site),
            TumourAttr::VisitNumber => Facet::Number(&self.visit_number),
            TumourAttr::LesionDate => Facet::Date(&self.lesion_date),
            TumourAttr::LesionPercentageChange => Facet::Number(&self.lesion_percentage_change),
            TumourAttr::SumPercentageChange => Facet::Number(&self.sum_percentage_change),
            TumourAttr::BestPercentageChange => Facet::Number(&self.best_percentage_change),
            TumourAttr::Response => Facet::Set(&self.response),
            TumourAttr::BestResponse => Facet::Set(&self.best_response),
            TumourAttr::IsBestResponse => Facet::Set(&self.is_best_response),
            TumourAttr::IsBaseline => Facet::Set(&self.is_baseline),
            TumourAttr::MissingTargetLesions => Facet::Set(&self.missing_target_lesions),
            TumourAttr::AssessmentWeek => Facet::Number(&self.assessment_week),
            TumourAttr::DaysOnStudy => Facet::Number(&self.days_on_study),
        }
    }

    fn facet_mut(&mut self, attr: TumourAttr) -> FacetMut<'_> {
        match attr {
            TumourAttr::LesionSite => FacetMut::Set(&mut self.lesion_site),
            TumourAttr::VisitNumber => FacetMut::Number(&mut self.visit_number),
            TumourAttr::LesionDate => FacetMut::Date(&mut self.lesion_date),
            TumourAttr::LesionPercentageChange => {
                FacetMut::Number(&mut self.lesion_percentage_change)
            }
            TumourAttr::SumPercentageChange => FacetMut::Number(&mut self.sum_percentage_change),
            TumourAttr::BestPercentageChange => {
                FacetMut::Number(&mut self.best_percentage_change)
            }
            TumourAttr::Response => FacetMut::Set(&mut self.response),
            TumourAttr::BestResponse => FacetMut::Set(&mut self.best_response),
            TumourAttr::IsBestResponse => FacetMut::Set(&mut self.is_best_response),
            TumourAttr::IsBaseline => FacetMut::Set(&mut self.is_baseline),
            TumourAttr::MissingTargetLesions => FacetMut::Set(&mut self.missing_target_lesions),
            TumourAttr::AssessmentWeek => FacetMut::Number(&mut self.assessment_week),
            TumourAttr::DaysOnStudy => FacetMut::Number(&mut self.days_on_study),
        }
    }

    fn matched_item_count(&self) -> usize {
        self.matched_item_count
    }

    fn set_matched_item_count(&mut self, count: usize) {
        self.matched_item_count = count;
    }
}
