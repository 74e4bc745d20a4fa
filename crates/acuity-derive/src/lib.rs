//! Derived-field computation for clinical-trial domains.
//!
//! Every derivation is a pure transformation from raw records (plus the
//! subjects and related records it needs) to new records. Nothing here
//! mutates its input in place.
//!
//! | Module | Derivation |
//! |--------|-----------|
//! | [`population`] | subjects from population, dosing, death, discontinuation and visit rows |
//! | [`baseline`] | baseline value and change from baseline per measurement group |
//! | [`baseline_date`] | baseline date among candidate visit dates |
//! | [`target_lesion`] | lesion and visit-sum change, missing lesions, assessed target lesions |
//! | [`recist`] | visit response and confirmed best overall response |
//! | [`frequency`] | assessment frequency and assessment week |
//! | [`dose`] | merged and ranked dosing intervals |
//! | [`renal`] | direct, Cockcroft-Gault and MDRD clearance |

pub mod baseline;
pub mod baseline_date;
pub mod dose;
pub mod engine;
pub mod error;
pub mod frequency;
pub mod numeric;
pub mod parallel;
pub mod population;
pub mod recist;
pub mod renal;
pub mod target_lesion;

pub use baseline::{GroupKey, Measurement, derive_baselines, select_baseline};
pub use baseline_date::select_baseline_date;
pub use dose::{reconstruct_dosing, resolve_last_updated};
pub use engine::DerivationEngine;
pub use error::{DeriveError, Result};
pub use numeric::{percent_change, round_to};
pub use population::{PopulationSources, build_population};
pub use recist::best_response;
pub use renal::{CreatinineUnit, PatientFactors, cockcroft_gault, derive_renal, mdrd_egfr};
pub use target_lesion::{TumourSources, assess_target_lesions};
