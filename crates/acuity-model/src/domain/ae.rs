use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{EventRecord, SubjectRecord};
use crate::ids::SubjectId;

/// An adverse event as reported by the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdverseEvent {
    pub event_id: String,
    pub subject_id: SubjectId,
    #[serde(default)]
    pub preferred_term: Option<String>,
    #[serde(default)]
    pub high_level_term: Option<String>,
    #[serde(default)]
    pub system_organ_class: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub serious: Option<String>,
    #[serde(default)]
    pub causality: Option<String>,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default, with = "crate::datetime::flexible")]
    pub start_date: Option<NaiveDateTime>,
    #[serde(default, with = "crate::datetime::flexible")]
    pub end_date: Option<NaiveDateTime>,
}

impl AdverseEvent {
    pub fn new(event_id: impl Into<String>, subject_id: SubjectId) -> Self {
        Self {
            event_id: event_id.into(),
            subject_id,
            preferred_term: None,
            high_level_term: None,
            system_organ_class: None,
            severity: None,
            serious: None,
            causality: None,
            outcome: None,
            start_date: None,
            end_date: None,
        }
    }
}

impl SubjectRecord for AdverseEvent {
    fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }
}

impl EventRecord for AdverseEvent {
    fn event_id(&self) -> &str {
        &self.event_id
    }
}
