use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::baseline::BaselineValues;
use crate::domain::{EventRecord, SubjectRecord};
use crate::ids::SubjectId;

/// How a clearance value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearanceMethod {
    /// The lab already reports a clearance.
    Direct,
    CockcroftGault,
    /// MDRD estimated glomerular filtration rate.
    Egfr,
}

impl ClearanceMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClearanceMethod::Direct => "Direct",
            ClearanceMethod::CockcroftGault => "Cockcroft-Gault",
            ClearanceMethod::Egfr => "eGFR (MDRD)",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            ClearanceMethod::Egfr => "mL/min/1.73m2",
            _ => "mL/min",
        }
    }
}

impl fmt::Display for ClearanceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chronic kidney disease stage by clearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CkdStage {
    Stage1,
    Stage2,
    Stage3,
    Stage4,
    Stage5,
}

impl CkdStage {
    pub fn from_clearance(value: f64) -> Self {
        if value >= 90.0 {
            CkdStage::Stage1
        } else if value >= 60.0 {
            CkdStage::Stage2
        } else if value >= 30.0 {
            CkdStage::Stage3
        } else if value >= 15.0 {
            CkdStage::Stage4
        } else {
            CkdStage::Stage5
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CkdStage::Stage1 => "Stage 1",
            CkdStage::Stage2 => "Stage 2",
            CkdStage::Stage3 => "Stage 3",
            CkdStage::Stage4 => "Stage 4",
            CkdStage::Stage5 => "Stage 5",
        }
    }
}

/// A creatinine clearance derived from one lab record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenalClearance {
    /// `<lab event id>:<method>`; unique per lab and method.
    pub event_id: String,
    pub source_event_id: String,
    pub subject_id: SubjectId,
    pub lab_code: String,
    pub method: ClearanceMethod,
    pub value: Option<f64>,
    pub unit: String,
    pub measured_at: Option<NaiveDateTime>,
    pub visit_number: Option<f64>,
    pub baseline: BaselineValues,
}

impl RenalClearance {
    pub fn ckd_stage(&self) -> Option<CkdStage> {
        self.value.map(CkdStage::from_clearance)
    }
}

impl SubjectRecord for RenalClearance {
    fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }
}

impl EventRecord for RenalClearance {
    fn event_id(&self) -> &str {
        &self.event_id
    }
}
