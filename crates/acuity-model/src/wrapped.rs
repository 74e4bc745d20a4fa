//! Events paired with the subject that owns them.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::domain::SubjectRecord;
use crate::ids::SubjectId;
use crate::subject::Subject;

/// A domain event together with its resolved subject.
///
/// The subject is shared: every event of one subject points at the same
/// `Subject` allocation. Cloning a wrapped event is two reference-count
/// increments.
#[derive(Debug)]
pub struct SubjectAware<E> {
    event: Arc<E>,
    subject: Arc<Subject>,
}

impl<E> Clone for SubjectAware<E> {
    fn clone(&self) -> Self {
        Self {
            event: Arc::clone(&self.event),
            subject: Arc::clone(&self.subject),
        }
    }
}

impl<E> SubjectAware<E> {
    pub fn new(event: E, subject: Arc<Subject>) -> Self {
        Self {
            event: Arc::new(event),
            subject,
        }
    }

    pub fn event(&self) -> &E {
        &self.event
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    pub fn shared_subject(&self) -> &Arc<Subject> {
        &self.subject
    }

    pub fn subject_id(&self) -> &SubjectId {
        &self.subject.subject_id
    }

    /// Days from the subject's first treatment to `at`.
    pub fn days_on_study(&self, at: Option<NaiveDateTime>) -> Option<i64> {
        self.subject.days_on_study(at)
    }
}

/// Lookup of subjects by id, shared by every wrapped event.
#[derive(Debug, Clone, Default)]
pub struct SubjectLookup {
    subjects: HashMap<SubjectId, Arc<Subject>>,
}

impl SubjectLookup {
    pub fn new(subjects: &[Arc<Subject>]) -> Self {
        let subjects = subjects
            .iter()
            .map(|subject| (subject.subject_id.clone(), Arc::clone(subject)))
            .collect();
        Self { subjects }
    }

    pub fn get(&self, subject_id: &SubjectId) -> Option<&Arc<Subject>> {
        self.subjects.get(subject_id)
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

/// Pair each event with its subject. Events whose subject is unknown are
/// dropped; the number dropped is returned alongside the wrapped events.
pub fn wrap_events<E: SubjectRecord>(
    events: Vec<E>,
    lookup: &SubjectLookup,
) -> (Vec<SubjectAware<E>>, usize) {
    let mut dropped = 0usize;
    let mut wrapped = Vec::with_capacity(events.len());
    for event in events {
        match lookup.get(event.subject_id()) {
            Some(subject) => wrapped.push(SubjectAware::new(event, Arc::clone(subject))),
            None => dropped += 1,
        }
    }
    (wrapped, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ae::AdverseEvent;
    use crate::ids::DatasetId;

    fn subject(id: &str) -> Arc<Subject> {
        Arc::new(Subject::new(
            SubjectId::new(id).unwrap(),
            DatasetId::new("STUDY1").unwrap(),
        ))
    }

    #[test]
    fn events_of_unknown_subjects_are_dropped() {
        let lookup = SubjectLookup::new(&[subject("E01")]);
        let events = vec![
            AdverseEvent::new("AE1", SubjectId::new("E01").unwrap()),
            AdverseEvent::new("AE2", SubjectId::new("E99").unwrap()),
        ];
        let (wrapped, dropped) = wrap_events(events, &lookup);
        assert_eq!(wrapped.len(), 1);
        assert_eq!(dropped, 1);
        assert_eq!(wrapped[0].event().event_id, "AE1");
    }

    #[test]
    fn wrapped_events_share_the_subject() {
        let shared = subject("E01");
        let lookup = SubjectLookup::new(std::slice::from_ref(&shared));
        let events = vec![
            AdverseEvent::new("AE1", SubjectId::new("E01").unwrap()),
            AdverseEvent::new("AE2", SubjectId::new("E01").unwrap()),
        ];
        let (wrapped, _) = wrap_events(events, &lookup);
        assert!(Arc::ptr_eq(wrapped[0].shared_subject(), wrapped[1].shared_subject()));
        assert_eq!(Arc::strong_count(&shared), 4);
    }
}
