use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::filters::{Attribute, Facet, FacetMut, Filters, RangeFilter, SetFilter};

/// Filterable subject attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubjectAttr {
    SubjectCode,
    StudyPart,
    Sex,
    Race,
    EthnicGroup,
    Age,
    PlannedArm,
    ActualArm,
    Cohort,
    RandomisationDate,
    FirstTreatmentDate,
    WithdrawalDate,
    Died,
    DrugsDosed,
    DrugsDiscontinued,
}

impl SubjectAttr {
    pub const ALL: &'static [SubjectAttr] = &[
        SubjectAttr::SubjectCode,
        SubjectAttr::StudyPart,
        SubjectAttr::Sex,
        SubjectAttr::Race,
        SubjectAttr::EthnicGroup,
        SubjectAttr::Age,
        SubjectAttr::PlannedArm,
        SubjectAttr::ActualArm,
        SubjectAttr::Cohort,
        SubjectAttr::RandomisationDate,
        SubjectAttr::FirstTreatmentDate,
        SubjectAttr::WithdrawalDate,
        SubjectAttr::Died,
        SubjectAttr::DrugsDosed,
        SubjectAttr::DrugsDiscontinued,
    ];
}

impl Attribute for SubjectAttr {
    fn name(&self) -> &'static str {
        match self {
            SubjectAttr::SubjectCode => "subject_code",
            SubjectAttr::StudyPart => "study_part",
            SubjectAttr::Sex => "sex",
            SubjectAttr::Race => "race",
            SubjectAttr::EthnicGroup => "ethnic_group",
            SubjectAttr::Age => "age",
            SubjectAttr::PlannedArm => "planned_arm",
            SubjectAttr::ActualArm => "actual_arm",
            SubjectAttr::Cohort => "cohort",
            SubjectAttr::RandomisationDate => "randomisation_date",
            SubjectAttr::FirstTreatmentDate => "first_treatment_date",
            SubjectAttr::WithdrawalDate => "withdrawal_date",
            SubjectAttr::Died => "died",
            SubjectAttr::DrugsDosed => "drugs_dosed",
            SubjectAttr::DrugsDiscontinued => "drugs_discontinued",
        }
    }
}

/// Filters over the subject population.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationFilters {
    pub subject_code: SetFilter,
    pub study_part: SetFilter,
    pub sex: SetFilter,
    pub race: SetFilter,
    pub ethnic_group: SetFilter,
    pub age: RangeFilter<f64>,
    pub planned_arm: SetFilter,
    pub actual_arm: SetFilter,
    pub cohort: SetFilter,
    pub randomisation_date: RangeFilter<NaiveDateTime>,
    pub first_treatment_date: RangeFilter<NaiveDateTime>,
    pub withdrawal_date: RangeFilter<NaiveDateTime>,
    pub died: SetFilter,
    pub drugs_dosed: SetFilter,
    pub drugs_discontinued: SetFilter,
    pub matched_item_count: usize,
}

impl Filters for PopulationFilters {
    type Attr = SubjectAttr;

    fn attributes() -> &'static [SubjectAttr] {
        SubjectAttr::ALL
    }

    fn facet(&self, attr: SubjectAttr) -> Facet<'_> {
        match attr {
            SubjectAttr::SubjectCode => Facet::Set(&self.subject_code),
            SubjectAttr::StudyPart => Facet::Set(&self.study_part),
            SubjectAttr::Sex => Facet::Set(&self.sex),
            SubjectAttr::Race => Facet::Set(&self.race),
            SubjectAttr::EthnicGroup => Facet::Set(&self.ethnic_group),
            SubjectAttr::Age => Facet::Number(&self.age),
            SubjectAttr::PlannedArm => Facet::Set(&self.planned_arm),
            SubjectAttr::ActualArm => Facet::Set(&self.actual_arm),
            SubjectAttr::Cohort => Facet::Set(&self.cohort),
            SubjectAttr::RandomisationDate => Facet::Date(&self.randomisation_date),
            SubjectAttr::FirstTreatmentDate => Facet::Date(&self.first_treatment_date),
            SubjectAttr::WithdrawalDate => Facet::Date(&self.withdrawal_date),
            SubjectAttr::Died => Facet::Set(&self.died),
            SubjectAttr::DrugsDosed => Facet::Set(&self.drugs_dosed),
            SubjectAttr::DrugsDiscontinued => Facet::Set(&self.drugs_discontinued),
        }
    }

    fn facet_mut(&mut self, attr: SubjectAttr) -> FacetMut<'_> {
        match attr {
            SubjectAttr::SubjectCode => FacetMut::Set(&mut self.subject_code),
            SubjectAttr::StudyPart => FacetMut::Set(&mut self.study_part),
            SubjectAttr::Sex => FacetMut::Set(&mut self.sex),
            SubjectAttr::Race => FacetMut::Set(&mut self.race),
            SubjectAttr::EthnicGroup => FacetMut::Set(&mut self.ethnic_group),
            SubjectAttr::Age => FacetMut::Number(&mut self.age),
            SubjectAttr::PlannedArm => FacetMut::Set(&mut self.planned_arm),
            SubjectAttr::ActualArm => FacetMut::Set(&mut self.actual_arm),
            SubjectAttr::Cohort => FacetMut::Set(&mut self.cohort),
            SubjectAttr::RandomisationDate => FacetMut::Date(&mut self.randomisation_date),
            SubjectAttr::FirstTreatmentDate => FacetMut::Date(&mut self.first_treatment_date),
            SubjectAttr::WithdrawalDate => FacetMut::Date(&mut self.withdrawal_date),
            SubjectAttr::Died => FacetMut::Set(&mut self.died),
            SubjectAttr::DrugsDosed => FacetMut::Set(&mut self.drugs_dosed),
            SubjectAttr::DrugsDiscontinued => FacetMut::Set(&mut self.drugs_discontinued),
        }
    }

    fn matched_item_count(&self) -> usize {
        self.matched_item_count
    }

    fn set_matched_item_count(&mut self, count: usize) {
        self.matched_item_count = count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        assert!(PopulationFilters::empty().is_empty());
    }

    #[test]
    fn constrained_attributes_lists_selected_facets() {
        let filters = PopulationFilters {
            sex: SetFilter::of(["F"]),
            age: RangeFilter::between(Some(18.0), None),
            ..Default::default()
        };
        assert!(!filters.is_empty());
        assert_eq!(
            filters.constrained_attributes(),
            vec![SubjectAttr::Sex, SubjectAttr::Age]
        );
    }

    #[test]
    fn partial_json_deserializes() {
        let filters: PopulationFilters =
            serde_json::from_str(r#"{"sex":{"values":["M"]}}"#).unwrap();
        assert!(filters.sex.values.contains("M"));
        assert!(!filters.race.is_constrained());
    }
}
