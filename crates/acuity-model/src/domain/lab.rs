use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::baseline::BaselineValues;
use crate::domain::{EventRecord, SubjectRecord};
use crate::ids::SubjectId;

/// A laboratory result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lab {
    pub event_id: String,
    pub subject_id: SubjectId,
    pub lab_code: String,
    #[serde(default)]
    pub lab_category: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub ref_low: Option<f64>,
    #[serde(default)]
    pub ref_high: Option<f64>,
    #[serde(default, with = "crate::datetime::flexible")]
    pub measured_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub visit_number: Option<f64>,
    #[serde(default, skip_deserializing)]
    pub baseline: BaselineValues,
}

impl Lab {
    pub fn new(
        event_id: impl Into<String>,
        subject_id: SubjectId,
        lab_code: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            subject_id,
            lab_code: lab_code.into(),
            lab_category: None,
            unit: None,
            value: None,
            ref_low: None,
            ref_high: None,
            measured_at: None,
            visit_number: None,
            baseline: BaselineValues::default(),
        }
    }

    /// `Some(true)` when the value lies outside the reference range.
    pub fn out_of_range(&self) -> Option<bool> {
        let value = self.value?;
        let below = self.ref_low.is_some_and(|low| value < low);
        let above = self.ref_high.is_some_and(|high| value > high);
        if self.ref_low.is_none() && self.ref_high.is_none() {
            return None;
        }
        Some(below || above)
    }
}

impl SubjectRecord for Lab {
    fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }
}

impl EventRecord for Lab {
    fn event_id(&self) -> &str {
        &self.event_id
    }
}

/// A vital-sign measurement (weight, blood pressure, pulse, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vital {
    pub event_id: String,
    pub subject_id: SubjectId,
    pub test_name: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default, with = "crate::datetime::flexible")]
    pub measured_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub visit_number: Option<f64>,
    #[serde(default, skip_deserializing)]
    pub baseline: BaselineValues,
}

impl Vital {
    pub fn new(
        event_id: impl Into<String>,
        subject_id: SubjectId,
        test_name: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            subject_id,
            test_name: test_name.into(),
            unit: None,
            value: None,
            measured_at: None,
            visit_number: None,
            baseline: BaselineValues::default(),
        }
    }

    pub fn is_weight(&self) -> bool {
        self.test_name.trim().eq_ignore_ascii_case("WEIGHT")
    }
}

impl SubjectRecord for Vital {
    fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }
}

impl EventRecord for Vital {
    fn event_id(&self) -> &str {
        &self.event_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_checks_both_limits() {
        let mut lab = Lab::new("L1", SubjectId::new("E01").unwrap(), "ALT");
        lab.value = Some(50.0);
        assert_eq!(lab.out_of_range(), None);
        lab.ref_high = Some(40.0);
        assert_eq!(lab.out_of_range(), Some(true));
        lab.ref_high = Some(60.0);
        lab.ref_low = Some(10.0);
        assert_eq!(lab.out_of_range(), Some(false));
    }
}
