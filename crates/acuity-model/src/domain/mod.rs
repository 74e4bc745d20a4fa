//! Raw and derived domain records.
//!
//! Raw records mirror one row of the relational source. Derived fields are
//! never filled by the source; they start empty and are set by the
//! derivation engine, which always returns new values instead of mutating
//! published ones.
//!
//! | Module | Records |
//! |--------|---------|
//! | `population` | population, death and visit rows |
//! | `ae` | adverse events |
//! | `lab` | lab results and vital signs |
//! | `tumour` | target lesions, assessments, non-target lesions, assessed target lesions |
//! | `dose` | drug dosing and discontinuation |
//! | `renal` | creatinine clearance |

pub mod ae;
pub mod baseline;
pub mod dose;
pub mod lab;
pub mod population;
pub mod renal;
pub mod tumour;

use crate::ids::SubjectId;

/// A record owned by exactly one subject.
pub trait SubjectRecord {
    fn subject_id(&self) -> &SubjectId;
}

/// A record that carries its own stable identifier.
pub trait EventRecord: SubjectRecord {
    fn event_id(&self) -> &str;
}
