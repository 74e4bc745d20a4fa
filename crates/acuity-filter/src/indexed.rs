//! Attribute extraction for indexing and filtering.
//!
//! Each domain declares here which value every filterable attribute takes
//! for one event. The index, the predicates and the statistics collector
//! all read events through this one seam.

use std::sync::Arc;

use acuity_model::{
    AdverseEvent, AeAttr, AeFilters, AssessedTargetLesion, AttrValue, DoseAttr, DoseFilters,
    DrugDose, Filters, Lab, LabAttr, LabFilters, PopulationFilters, RenalAttr, RenalClearance,
    RenalFilters, Subject, SubjectAttr, SubjectAware, SubjectId, TumourAttr, TumourFilters,
    Vital, VitalAttr, VitalFilters,
};

/// An item the query engine can index and filter.
pub trait Indexed: Send + Sync {
    type Filters: Filters;

    /// Owning subject; subjects own themselves.
    fn subject_id(&self) -> &SubjectId;

    fn attribute(&self, attr: <Self::Filters as Filters>::Attr) -> AttrValue<'_>;
}

/// Attribute enum of an indexed item's domain.
pub type AttrOf<E> = <<E as Indexed>::Filters as Filters>::Attr;

/// Filters object of an indexed item's domain.
pub type FiltersOf<E> = <E as Indexed>::Filters;

impl<T: Indexed> Indexed for Arc<T> {
    type Filters = T::Filters;

    fn subject_id(&self) -> &SubjectId {
        T::subject_id(self)
    }

    fn attribute(&self, attr: <Self::Filters as Filters>::Attr) -> AttrValue<'_> {
        T::attribute(self, attr)
    }
}

fn text(value: &Option<String>) -> AttrValue<'_> {
    AttrValue::Text(value.as_deref())
}

impl Indexed for Subject {
    type Filters = PopulationFilters;

    fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }

    fn attribute(&self, attr: SubjectAttr) -> AttrValue<'_> {
        match attr {
            SubjectAttr::SubjectCode => AttrValue::Text(Some(&self.subject_code)),
            SubjectAttr::StudyPart => text(&self.study_part),
            SubjectAttr::Sex => text(&self.sex),
            SubjectAttr::Race => text(&self.race),
            SubjectAttr::EthnicGroup => text(&self.ethnic_group),
            SubjectAttr::Age => AttrValue::Number(self.age.map(f64::from)),
            SubjectAttr::PlannedArm => text(&self.planned_arm),
            SubjectAttr::ActualArm => text(&self.actual_arm),
            SubjectAttr::Cohort => text(&self.cohort),
            SubjectAttr::RandomisationDate => AttrValue::Date(self.randomisation_date),
            SubjectAttr::FirstTreatmentDate => AttrValue::Date(self.first_treatment_date),
            SubjectAttr::WithdrawalDate => AttrValue::Date(self.withdrawal_date),
            SubjectAttr::Died => AttrValue::flag(self.is_dead()),
            SubjectAttr::DrugsDosed => AttrValue::Texts(self.dosed_drugs()),
            SubjectAttr::DrugsDiscontinued => AttrValue::Texts(self.discontinued_drugs()),
        }
    }
}

impl Indexed for SubjectAware<AdverseEvent> {
    type Filters = AeFilters;

    fn subject_id(&self) -> &SubjectId {
        SubjectAware::subject_id(self)
    }

    fn attribute(&self, attr: AeAttr) -> AttrValue<'_> {
        let ae = self.event();
        match attr {
            AeAttr::PreferredTerm => text(&ae.preferred_term),
            AeAttr::HighLevelTerm => text(&ae.high_level_term),
            AeAttr::SystemOrganClass => text(&ae.system_organ_class),
            AeAttr::Severity => text(&ae.severity),
            AeAttr::Serious => text(&ae.serious),
            AeAttr::Causality => text(&ae.causality),
            AeAttr::Outcome => text(&ae.outcome),
            AeAttr::StartDate => AttrValue::Date(ae.start_date),
            AeAttr::EndDate => AttrValue::Date(ae.end_date),
            AeAttr::DaysOnStudy => AttrValue::count(self.days_on_study(ae.start_date)),
        }
    }
}

impl Indexed for SubjectAware<Lab> {
    type Filters = LabFilters;

    fn subject_id(&self) -> &SubjectId {
        SubjectAware::subject_id(self)
    }

    fn attribute(&self, attr: LabAttr) -> AttrValue<'_> {
        let lab = self.event();
        match attr {
            LabAttr::LabCode => AttrValue::Text(Some(&lab.lab_code)),
            LabAttr::LabCategory => text(&lab.lab_category),
            LabAttr::Unit => text(&lab.unit),
            LabAttr::Value => AttrValue::Number(lab.value),
            LabAttr::BaselineValue => AttrValue::Number(lab.baseline.baseline_value),
            LabAttr::IsBaseline => AttrValue::flag(lab.baseline.is_baseline),
            LabAttr::ChangeFromBaseline => AttrValue::Number(lab.baseline.change_from_baseline),
            LabAttr::PercentChangeFromBaseline => {
                AttrValue::Number(lab.baseline.percent_change_from_baseline)
            }
            LabAttr::OutOfRange => AttrValue::maybe_flag(lab.out_of_range()),
            LabAttr::MeasurementDate => AttrValue::Date(lab.measured_at),
            LabAttr::VisitNumber => AttrValue::Number(lab.visit_number),
            LabAttr::DaysOnStudy => AttrValue::count(self.days_on_study(lab.measured_at)),
        }
    }
}

impl Indexed for SubjectAware<Vital> {
    type Filters = VitalFilters;

    fn subject_id(&self) -> &SubjectId {
        SubjectAware::subject_id(self)
    }

    fn attribute(&self, attr: VitalAttr) -> AttrValue<'_> {
        let vital = self.event();
        match attr {
            VitalAttr::TestName => AttrValue::Text(Some(&vital.test_name)),
            VitalAttr::Unit => text(&vital.unit),
            VitalAttr::Value => AttrValue::Number(vital.value),
            VitalAttr::BaselineValue => AttrValue::Number(vital.baseline.baseline_value),
            VitalAttr::IsBaseline => AttrValue::flag(vital.baseline.is_baseline),
            VitalAttr::ChangeFromBaseline => {
                AttrValue::Number(vital.baseline.change_from_baseline)
            }
            VitalAttr::PercentChangeFromBaseline => {
                AttrValue::Number(vital.baseline.percent_change_from_baseline)
            }
            VitalAttr::MeasurementDate => AttrValue::Date(vital.measured_at),
            VitalAttr::VisitNumber => AttrValue::Number(vital.visit_number),
            VitalAttr::DaysOnStudy => AttrValue::count(self.days_on_study(vital.measured_at)),
        }
    }
}

impl Indexed for SubjectAware<RenalClearance> {
    type Filters = RenalFilters;

    fn subject_id(&self) -> &SubjectId {
        SubjectAware::subject_id(self)
    }

    fn attribute(&self, attr: RenalAttr) -> AttrValue<'_> {
        let renal = self.event();
        match attr {
            RenalAttr::LabCode => AttrValue::Text(Some(&renal.lab_code)),
            RenalAttr::Method => AttrValue::Text(Some(renal.method.as_str())),
            RenalAttr::Value => AttrValue::Number(renal.value),
            RenalAttr::CkdStage => AttrValue::Text(renal.ckd_stage().map(|stage| stage.as_str())),
            RenalAttr::IsBaseline => AttrValue::flag(renal.baseline.is_baseline),
            RenalAttr::ChangeFromBaseline => {
                AttrValue::Number(renal.baseline.change_from_baseline)
            }
            RenalAttr::MeasurementDate => AttrValue::Date(renal.measured_at),
            RenalAttr::VisitNumber => AttrValue::Number(renal.visit_number),
            RenalAttr::DaysOnStudy => AttrValue::count(self.days_on_study(renal.measured_at)),
        }
    }
}

impl Indexed for SubjectAware<AssessedTargetLesion> {
    type Filters = TumourFilters;

    fn subject_id(&self) -> &SubjectId {
        SubjectAware::subject_id(self)
    }

    fn attribute(&self, attr: TumourAttr) -> AttrValue<'_> {
        let row = self.event();
        match attr {
            TumourAttr::LesionSite => text(&row.lesion.lesion_site),
            TumourAttr::VisitNumber => AttrValue::Number(row.lesion.visit_number),
            TumourAttr::LesionDate => AttrValue::Date(row.lesion.lesion_date),
            TumourAttr::LesionPercentageChange => AttrValue::Number(row.lesion_percentage_change),
            TumourAttr::SumPercentageChange => AttrValue::Number(row.sum_percentage_change),
            TumourAttr::BestPercentageChange => AttrValue::Number(row.best_percentage_change),
            TumourAttr::Response => AttrValue::Text(Some(row.response.as_str())),
            TumourAttr::BestResponse => {
                AttrValue::Text(row.best_response.as_ref().map(|response| response.as_str()))
            }
            TumourAttr::IsBestResponse => AttrValue::flag(row.is_best_response),
            TumourAttr::IsBaseline => AttrValue::flag(row.is_baseline),
            TumourAttr::MissingTargetLesions => AttrValue::flag(row.missing_target_lesions),
            TumourAttr::AssessmentWeek => {
                AttrValue::Number(row.assessment_week.map(f64::from))
            }
            TumourAttr::DaysOnStudy => {
                AttrValue::count(self.days_on_study(row.lesion.lesion_date))
            }
        }
    }
}

impl Indexed for SubjectAware<DrugDose> {
    type Filters = DoseFilters;

    fn subject_id(&self) -> &SubjectId {
        SubjectAware::subject_id(self)
    }

    fn attribute(&self, attr: DoseAttr) -> AttrValue<'_> {
        let dose = self.event();
        match attr {
            DoseAttr::Drug => AttrValue::Text(Some(&dose.drug)),
            DoseAttr::Dose => AttrValue::Number(dose.dose),
            DoseAttr::DoseUnit => text(&dose.dose_unit),
            DoseAttr::Frequency => text(&dose.frequency),
            DoseAttr::PeriodType => AttrValue::Text(Some(dose.period_type.as_str())),
            DoseAttr::StartDate => AttrValue::Date(dose.start_date),
            DoseAttr::EndDate => AttrValue::Date(dose.end_date),
            DoseAttr::DaysOnStudy => AttrValue::count(self.days_on_study(dose.start_date)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use acuity_model::DatasetId;
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn days_on_study_comes_from_the_subject() {
        let first = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let subject = Subject::new(
            SubjectId::new("S1").unwrap(),
            DatasetId::new("STUDY").unwrap(),
        )
        .with_first_treatment_date(Some(first));
        let mut ae = AdverseEvent::new("AE1", SubjectId::new("S1").unwrap());
        ae.start_date = Some(first + chrono::Duration::days(9));
        let wrapped = SubjectAware::new(ae, Arc::new(subject));
        assert_eq!(
            wrapped.attribute(AeAttr::DaysOnStudy),
            AttrValue::Number(Some(9.0))
        );
        assert_eq!(wrapped.attribute(AeAttr::Severity), AttrValue::Text(None));
    }

    #[test]
    fn multi_valued_subject_attribute() {
        let mut subject = Subject::new(
            SubjectId::new("S1").unwrap(),
            DatasetId::new("STUDY").unwrap(),
        );
        subject.drugs_dosed.insert("A".to_string(), true);
        subject.drugs_dosed.insert("B".to_string(), true);
        assert_eq!(
            subject.attribute(SubjectAttr::DrugsDosed),
            AttrValue::Texts(vec!["A", "B"])
        );
        assert_eq!(subject.attribute(SubjectAttr::Died), AttrValue::flag(false));
    }
}
