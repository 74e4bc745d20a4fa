//! Data model for the clinical-trial filtering engine.
//!
//! Subjects, raw and derived domain records, events wrapped with their
//! subject, and the filter facets every domain is queried through.

pub mod datetime;
pub mod domain;
pub mod error;
pub mod filters;
pub mod ids;
pub mod options;
pub mod study;
pub mod subject;
pub mod wrapped;

pub use domain::ae::AdverseEvent;
pub use domain::baseline::BaselineValues;
pub use domain::dose::{Discontinuation, DrugDose, PeriodType};
pub use domain::lab::{Lab, Vital};
pub use domain::population::{DeathRow, PopulationRow, VisitRow};
pub use domain::renal::{CkdStage, ClearanceMethod, RenalClearance};
pub use domain::tumour::{
    AssessedTargetLesion, Assessment, NonTargetLesion, Response, TargetLesion,
};
pub use domain::{EventRecord, SubjectRecord};
pub use error::{ModelError, Result};
pub use filters::ae::{AeAttr, AeFilters};
pub use filters::dose::{DoseAttr, DoseFilters};
pub use filters::lab::{LabAttr, LabFilters, VitalAttr, VitalFilters};
pub use filters::population::{PopulationFilters, SubjectAttr};
pub use filters::renal::{RenalAttr, RenalFilters};
pub use filters::tumour::{TumourAttr, TumourFilters};
pub use filters::{AttrValue, Attribute, Facet, FacetMut, Filters, RangeFilter, SetFilter};
pub use ids::{DatasetId, DatasetsKey, SubjectId};
pub use options::{DosingOptions, EngineConfig, RenalOptions, TumourOptions};
pub use study::StudyInfo;
pub use subject::Subject;
pub use wrapped::{SubjectAware, SubjectLookup, wrap_events};
