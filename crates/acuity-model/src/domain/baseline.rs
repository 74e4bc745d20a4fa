use serde::Serialize;

/// Fields filled by baseline derivation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BaselineValues {
    /// Value of the group's baseline measurement.
    pub baseline_value: Option<f64>,
    /// Whether this record is the group's baseline measurement.
    pub is_baseline: bool,
    pub change_from_baseline: Option<f64>,
    pub percent_change_from_baseline: Option<f64>,
}
