use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{EventRecord, SubjectRecord};
use crate::ids::SubjectId;

/// RECIST response category.
///
/// Variant order is the rank order used for best-response selection:
/// a lower variant is a better response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Response {
    CompleteResponse,
    PartialResponse,
    StableDisease,
    ProgressiveDisease,
    NotEvaluable,
    MissingTargetLesions,
    NoAssessment,
    /// A response string the rank table does not know.
    Other(String),
}

impl Response {
    /// Parse a recorded response. Accepts codes (`PR`), names
    /// (`Partial Response`) and the combined `Partial Response (PR)` form.
    pub fn parse(raw: &str) -> Self {
        let upper = raw.trim().to_ascii_uppercase();
        let code = match (upper.rfind('('), upper.rfind(')')) {
            (Some(open), Some(close)) if open < close => upper[open + 1..close].trim().to_string(),
            _ => upper.clone(),
        };
        let name = match upper.find('(') {
            Some(open) => upper[..open].trim().to_string(),
            None => upper.clone(),
        };
        for candidate in [code.as_str(), name.as_str()] {
            let response = match candidate {
                "CR" | "COMPLETE RESPONSE" => Some(Response::CompleteResponse),
                "PR" | "PARTIAL RESPONSE" => Some(Response::PartialResponse),
                "SD" | "STABLE DISEASE" => Some(Response::StableDisease),
                "PD" | "PROGRESSIVE DISEASE" | "PROGRESSION" => {
                    Some(Response::ProgressiveDisease)
                }
                "NE" | "NOT EVALUABLE" | "UNABLE TO ASSESS" => Some(Response::NotEvaluable),
                "MISSING TARGET LESIONS" => Some(Response::MissingTargetLesions),
                "NO ASSESSMENT" => Some(Response::NoAssessment),
                _ => None,
            };
            if let Some(response) = response {
                return response;
            }
        }
        Response::Other(raw.trim().to_string())
    }

    /// Position in the rank table; lower is better.
    pub fn rank(&self) -> u8 {
        match self {
            Response::CompleteResponse => 1,
            Response::PartialResponse => 2,
            Response::StableDisease => 3,
            Response::ProgressiveDisease => 4,
            Response::NotEvaluable => 5,
            Response::MissingTargetLesions => 6,
            Response::NoAssessment => 7,
            Response::Other(_) => 8,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Response::CompleteResponse => "Complete Response (CR)",
            Response::PartialResponse => "Partial Response (PR)",
            Response::StableDisease => "Stable Disease (SD)",
            Response::ProgressiveDisease => "Progressive Disease (PD)",
            Response::NotEvaluable => "Not Evaluable (NE)",
            Response::MissingTargetLesions => "Missing Target Lesions",
            Response::NoAssessment => "No Assessment",
            Response::Other(value) => value,
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Response> for String {
    fn from(value: Response) -> Self {
        value.as_str().to_string()
    }
}

impl From<String> for Response {
    fn from(value: String) -> Self {
        Response::parse(&value)
    }
}

/// One target-lesion measurement at one visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetLesion {
    pub event_id: String,
    pub subject_id: SubjectId,
    /// Lesion number, stable across visits.
    pub lesion_id: String,
    #[serde(default)]
    pub lesion_site: Option<String>,
    #[serde(default, with = "crate::datetime::flexible")]
    pub lesion_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub visit_number: Option<f64>,
    #[serde(default, with = "crate::datetime::flexible")]
    pub visit_date: Option<NaiveDateTime>,
    /// Longest diameter in mm.
    #[serde(default)]
    pub diameter: Option<f64>,
}

impl TargetLesion {
    pub fn new(
        event_id: impl Into<String>,
        subject_id: SubjectId,
        lesion_id: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            subject_id,
            lesion_id: lesion_id.into(),
            lesion_site: None,
            lesion_date: None,
            visit_number: None,
            visit_date: None,
            diameter: None,
        }
    }
}

impl SubjectRecord for TargetLesion {
    fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }
}

impl EventRecord for TargetLesion {
    fn event_id(&self) -> &str {
        &self.event_id
    }
}

/// The investigator's overall assessment at one visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub subject_id: SubjectId,
    #[serde(default)]
    pub visit_number: Option<f64>,
    #[serde(default, with = "crate::datetime::flexible")]
    pub visit_date: Option<NaiveDateTime>,
    #[serde(default, with = "crate::datetime::flexible")]
    pub assessment_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub response: Option<String>,
}

impl SubjectRecord for Assessment {
    fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonTargetLesion {
    pub subject_id: SubjectId,
    #[serde(default)]
    pub visit_number: Option<f64>,
    #[serde(default, with = "crate::datetime::flexible")]
    pub visit_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub lesion_site: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
}

impl SubjectRecord for NonTargetLesion {
    fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }
}

/// A target lesion joined with its visit's assessment and non-target
/// lesions, carrying every derived tumour-response field.
///
/// Rebuilt on every load; there is no raw source for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessedTargetLesion {
    pub lesion: TargetLesion,
    pub baseline_date: Option<NaiveDateTime>,
    pub is_baseline: bool,
    pub baseline_diameter: Option<f64>,
    pub lesion_change_from_baseline: Option<f64>,
    pub lesion_percentage_change: Option<f64>,
    pub sum_diameters: Option<f64>,
    pub baseline_sum_diameters: Option<f64>,
    pub sum_change_from_baseline: Option<f64>,
    pub sum_percentage_change: Option<f64>,
    /// Lowest visit-sum percentage change after baseline, unless target
    /// lesions went missing at some visit.
    pub best_percentage_change: Option<f64>,
    /// The visit's valid lesions differ from the baseline visit's.
    pub missing_target_lesions: bool,
    pub response: Response,
    pub best_response: Option<Response>,
    pub is_best_response: bool,
    pub non_target_response: Option<String>,
    pub assessment_frequency_weeks: Option<u32>,
    pub assessment_week: Option<u32>,
}

impl AssessedTargetLesion {
    /// A lesion with every derived field empty.
    pub fn unassessed(lesion: TargetLesion) -> Self {
        Self {
            lesion,
            baseline_date: None,
            is_baseline: false,
            baseline_diameter: None,
            lesion_change_from_baseline: None,
            lesion_percentage_change: None,
            sum_diameters: None,
            baseline_sum_diameters: None,
            sum_change_from_baseline: None,
            sum_percentage_change: None,
            best_percentage_change: None,
            missing_target_lesions: false,
            response: Response::NoAssessment,
            best_response: None,
            is_best_response: false,
            non_target_response: None,
            assessment_frequency_weeks: None,
            assessment_week: None,
        }
    }
}

impl SubjectRecord for AssessedTargetLesion {
    fn subject_id(&self) -> &SubjectId {
        &self.lesion.subject_id
    }
}

impl EventRecord for AssessedTargetLesion {
    fn event_id(&self) -> &str {
        &self.lesion.event_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_names_and_combined_forms() {
        assert_eq!(Response::parse("PR"), Response::PartialResponse);
        assert_eq!(Response::parse("partial response"), Response::PartialResponse);
        assert_eq!(
            Response::parse("Complete Response (CR)"),
            Response::CompleteResponse
        );
        assert_eq!(
            Response::parse("Missing Target Lesions"),
            Response::MissingTargetLesions
        );
        assert_eq!(
            Response::parse("Mixed"),
            Response::Other("Mixed".to_string())
        );
    }

    #[test]
    fn rank_order_matches_variant_order() {
        let ordered = [
            Response::CompleteResponse,
            Response::PartialResponse,
            Response::StableDisease,
            Response::ProgressiveDisease,
            Response::NotEvaluable,
            Response::MissingTargetLesions,
            Response::NoAssessment,
            Response::Other("x".to_string()),
        ];
        for pair in ordered.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].rank() < pair[1].rank());
        }
    }

    #[test]
    fn response_serializes_as_display_string() {
        let json = serde_json::to_string(&Response::StableDisease).unwrap();
        assert_eq!(json, "\"Stable Disease (SD)\"");
        let back: Response = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Response::StableDisease);
    }
}
