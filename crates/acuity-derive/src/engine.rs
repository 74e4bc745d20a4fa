//! Configured entry point to every derivation.

use acuity_model::{
    AssessedTargetLesion, DatasetId, Discontinuation, DrugDose, EngineConfig, Lab,
    RenalClearance, Subject, SubjectLookup, Vital,
};
use tracing::info_span;

use crate::baseline::derive_baselines;
use crate::dose::reconstruct_dosing;
use crate::error::Result;
use crate::population::{PopulationSources, build_population};
use crate::renal::derive_renal;
use crate::target_lesion::{TumourSources, assess_target_lesions};

/// Decimal places kept on percent change from baseline.
const BASELINE_PRECISION: u32 = 2;

/// Runs derivations with one engine configuration.
#[derive(Debug, Clone, Default)]
pub struct DerivationEngine {
    config: EngineConfig,
}

impl DerivationEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn population(
        &self,
        dataset_id: &DatasetId,
        sources: PopulationSources<'_>,
    ) -> Result<Vec<Subject>> {
        info_span!("population", dataset_id = %dataset_id)
            .in_scope(|| build_population(dataset_id, sources))
    }

    pub fn labs(&self, labs: Vec<Lab>, subjects: &SubjectLookup) -> Result<Vec<Lab>> {
        info_span!("lab_baseline").in_scope(|| {
            derive_baselines(labs, subjects, BASELINE_PRECISION, self.config.parallel)
        })
    }

    pub fn vitals(&self, vitals: Vec<Vital>, subjects: &SubjectLookup) -> Result<Vec<Vital>> {
        info_span!("vital_baseline").in_scope(|| {
            derive_baselines(
                vitals,
                subjects,
                BASELINE_PRECISION,
                self.config.parallel,
            )
        })
    }

    /// Clearances from creatinine labs, with baselines applied.
    pub fn renal(
        &self,
        labs: &[Lab],
        vitals: &[Vital],
        subjects: &SubjectLookup,
    ) -> Result<Vec<RenalClearance>> {
        info_span!("renal").in_scope(|| {
            let clearances = derive_renal(labs, vitals, subjects, &self.config.renal);
            derive_baselines(
                clearances,
                subjects,
                self.config.renal.precision,
                self.config.parallel,
            )
        })
    }

    pub fn tumour(
        &self,
        sources: TumourSources,
        subjects: &SubjectLookup,
    ) -> Vec<AssessedTargetLesion> {
        info_span!("tumour").in_scope(|| {
            assess_target_lesions(sources, subjects, &self.config.tumour, self.config.parallel)
        })
    }

    pub fn dosing(&self, doses: Vec<DrugDose>, discontinuations: &[Discontinuation]) -> Vec<DrugDose> {
        info_span!("dosing").in_scope(|| {
            reconstruct_dosing(
                doses,
                discontinuations,
                &self.config.dosing,
                self.config.parallel,
            )
        })
    }
}
