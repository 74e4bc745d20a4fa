//! The domains the engine serves and their wiring.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use acuity_derive::{DerivationEngine, TumourSources};
use acuity_model::{
    AdverseEvent, AssessedTargetLesion, Assessment, DeathRow, Discontinuation, DrugDose, Lab,
    NonTargetLesion, PopulationRow, RenalClearance, SubjectAware, TargetLesion, Vital, VisitRow,
};

use crate::provider::{
    DomainProvider, PopulationProvider, PopulationSourceSet, RawDataSource, StudyInfoSource,
    fetch_all,
};
use crate::service::EventFilterService;

pub type AeEvent = SubjectAware<AdverseEvent>;
pub type LabEvent = SubjectAware<Lab>;
pub type VitalEvent = SubjectAware<Vital>;
pub type RenalEvent = SubjectAware<RenalClearance>;
pub type TumourEvent = SubjectAware<AssessedTargetLesion>;
pub type DoseEvent = SubjectAware<DrugDose>;

pub type AeFilterService = EventFilterService<AeEvent>;
pub type LabFilterService = EventFilterService<LabEvent>;
pub type VitalFilterService = EventFilterService<VitalEvent>;
pub type RenalFilterService = EventFilterService<RenalEvent>;
pub type TumourFilterService = EventFilterService<TumourEvent>;
pub type DoseFilterService = EventFilterService<DoseEvent>;

/// A queryable domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Domain {
    Population,
    Ae,
    Lab,
    Vitals,
    Renal,
    Tumour,
    Dose,
}

impl Domain {
    pub const ALL: [Domain; 7] = [
        Domain::Population,
        Domain::Ae,
        Domain::Lab,
        Domain::Vitals,
        Domain::Renal,
        Domain::Tumour,
        Domain::Dose,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Population => "population",
            Domain::Ae => "ae",
            Domain::Lab => "lab",
            Domain::Vitals => "vitals",
            Domain::Renal => "renal",
            Domain::Tumour => "tumour",
            Domain::Dose => "dose",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Domain::Population => "Subjects with demography and dosing summary",
            Domain::Ae => "Adverse events",
            Domain::Lab => "Laboratory results with baselines",
            Domain::Vitals => "Vital signs with baselines",
            Domain::Renal => "Creatinine clearance and eGFR",
            Domain::Tumour => "Assessed target lesions with RECIST responses",
            Domain::Dose => "Reconstructed drug dosing intervals",
        }
    }

    /// Parse a domain name, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|domain| domain.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(value).ok_or_else(|| format!("unknown domain '{value}'"))
    }
}

/// A backend serving every raw domain.
pub trait StudySource:
    RawDataSource<PopulationRow>
    + RawDataSource<AdverseEvent>
    + RawDataSource<Lab>
    + RawDataSource<Vital>
    + RawDataSource<TargetLesion>
    + RawDataSource<Assessment>
    + RawDataSource<NonTargetLesion>
    + RawDataSource<DrugDose>
    + RawDataSource<Discontinuation>
    + RawDataSource<DeathRow>
    + RawDataSource<VisitRow>
    + StudyInfoSource
    + 'static
{
}

impl<T> StudySource for T where
    T: RawDataSource<PopulationRow>
        + RawDataSource<AdverseEvent>
        + RawDataSource<Lab>
        + RawDataSource<Vital>
        + RawDataSource<TargetLesion>
        + RawDataSource<Assessment>
        + RawDataSource<NonTargetLesion>
        + RawDataSource<DrugDose>
        + RawDataSource<Discontinuation>
        + RawDataSource<DeathRow>
        + RawDataSource<VisitRow>
        + StudyInfoSource
        + 'static
{
}

/// One provider per domain over a shared backend and engine.
#[derive(Debug)]
pub struct StudyProviders {
    population: PopulationProvider,
    ae: DomainProvider<AdverseEvent, AdverseEvent>,
    lab: DomainProvider<Lab, Lab>,
    vitals: DomainProvider<Vital, Vital>,
    renal: DomainProvider<Lab, RenalClearance>,
    tumour: DomainProvider<TargetLesion, AssessedTargetLesion>,
    dose: DomainProvider<DrugDose, DrugDose>,
}

impl StudyProviders {
    pub fn new<S: StudySource>(source: Arc<S>, engine: DerivationEngine) -> Self {
        let engine = Arc::new(engine);
        let population = PopulationProvider::new(
            (*engine).clone(),
            PopulationSourceSet::from_source(source.clone()),
        );

        let ae = DomainProvider::<AdverseEvent, AdverseEvent>::passthrough("ae", source.clone());

        let lab = {
            let engine = Arc::clone(&engine);
            DomainProvider::<Lab, Lab>::new("lab", source.clone(), move |labs, context| {
                Ok(engine.labs(labs, context.population.lookup())?)
            })
        };

        let vitals = {
            let engine = Arc::clone(&engine);
            DomainProvider::<Vital, Vital>::new("vitals", source.clone(), move |vitals, context| {
                Ok(engine.vitals(vitals, context.population.lookup())?)
            })
        };

        let renal = {
            let engine = Arc::clone(&engine);
            let weights: Arc<dyn RawDataSource<Vital>> = source.clone();
            DomainProvider::<Lab, RenalClearance>::new(
                "renal",
                source.clone(),
                move |labs, context| {
                    let vitals = fetch_all(weights.as_ref(), "vitals", context.datasets)?;
                    Ok(engine.renal(&labs, &vitals, context.population.lookup())?)
                },
            )
        };

        let tumour = {
            let engine = Arc::clone(&engine);
            let assessments: Arc<dyn RawDataSource<Assessment>> = source.clone();
            let non_target: Arc<dyn RawDataSource<NonTargetLesion>> = source.clone();
            DomainProvider::<TargetLesion, AssessedTargetLesion>::new(
                "tumour",
                source.clone(),
                move |target_lesions, context| {
                    let sources = TumourSources {
                        target_lesions,
                        assessments: fetch_all(
                            assessments.as_ref(),
                            "assessment",
                            context.datasets,
                        )?,
                        non_target_lesions: fetch_all(
                            non_target.as_ref(),
                            "non_target_lesion",
                            context.datasets,
                        )?,
                    };
                    Ok(engine.tumour(sources, context.population.lookup()))
                },
            )
        };

        let dose = {
            let engine = Arc::clone(&engine);
            let discontinuations: Arc<dyn RawDataSource<Discontinuation>> = source.clone();
            DomainProvider::<DrugDose, DrugDose>::new("dose", source, move |doses, context| {
                let discontinuations =
                    fetch_all(discontinuations.as_ref(), "discontinuation", context.datasets)?;
                let last_updated = engine
                    .config()
                    .dosing
                    .last_updated
                    .or(context.population.info().last_updated);
                let engine =
                    DerivationEngine::new(engine.config().clone().with_last_updated(last_updated));
                Ok(engine.dosing(doses, &discontinuations))
            })
        };

        Self {
            population,
            ae,
            lab,
            vitals,
            renal,
            tumour,
            dose,
        }
    }

    pub fn population(&self) -> &PopulationProvider {
        &self.population
    }

    pub fn ae(&self) -> &DomainProvider<AdverseEvent, AdverseEvent> {
        &self.ae
    }

    pub fn lab(&self) -> &DomainProvider<Lab, Lab> {
        &self.lab
    }

    pub fn vitals(&self) -> &DomainProvider<Vital, Vital> {
        &self.vitals
    }

    pub fn renal(&self) -> &DomainProvider<Lab, RenalClearance> {
        &self.renal
    }

    pub fn tumour(&self) -> &DomainProvider<TargetLesion, AssessedTargetLesion> {
        &self.tumour
    }

    pub fn dose(&self) -> &DomainProvider<DrugDose, DrugDose> {
        &self.dose
    }
}
