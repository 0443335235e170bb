//! The assignment store.
//!
//! Owns the ordered collection of assignments and their sent/unsent
//! status. Ids are dense, start at 1, and follow creation order, so the
//! vector index doubles as `id - 1`.

use std::sync::RwLock;

use chrono::Utc;

use crate::error::CoreError;
use crate::model::{Assignment, AssignmentId, AssignmentKind, NewAssignment};

/// Thread-safe, process-lifetime store of assignments.
///
/// Shared via `Arc`; all methods take `&self`.
#[derive(Debug, Default)]
pub struct AssignmentStore {
    inner: RwLock<Vec<Assignment>>,
}

impl AssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an assignment from a validated authoring payload.
    ///
    /// Assigns the next id and stamps the creation time. Rejects choice
    /// assignments with no options, duplicate labels, or a correct
    /// answer that is not one of the labels, so programmatic callers
    /// get the same validation as the authoring parser.
    pub fn create(&self, new: NewAssignment) -> Result<Assignment, CoreError> {
        if let AssignmentKind::Choice { options } = &new.kind {
            if options.is_empty() {
                return Err(CoreError::EmptyOptions);
            }
            let mut seen = std::collections::HashSet::new();
            for option in options {
                if !seen.insert(option.label.as_str()) {
                    return Err(CoreError::DuplicateLabel(option.label.clone()));
                }
            }
            if !seen.contains(new.correct_answer.as_str()) {
                return Err(CoreError::CorrectLabelMissing(new.correct_answer));
            }
        }

        let mut assignments = self.inner.write().expect("assignment store poisoned");
        let assignment = Assignment {
            id: assignments.len() as AssignmentId + 1,
            kind: new.kind,
            question: new.question,
            correct_answer: new.correct_answer,
            explanation: new.explanation,
            sent: false,
            created_at: Utc::now(),
        };
        assignments.push(assignment.clone());
        tracing::debug!(id = assignment.id, kind = %assignment.kind, "assignment created");
        Ok(assignment)
    }

    /// All assignments in creation order.
    pub fn list(&self) -> Vec<Assignment> {
        self.inner.read().expect("assignment store poisoned").clone()
    }

    /// The first assignment in creation order that has not been sent.
    pub fn next_unsent(&self) -> Option<Assignment> {
        self.inner
            .read()
            .expect("assignment store poisoned")
            .iter()
            .find(|a| !a.sent)
            .cloned()
    }

    /// Mark an assignment sent. Idempotent; no-op for unknown ids.
    pub fn mark_sent(&self, id: AssignmentId) {
        let mut assignments = self.inner.write().expect("assignment store poisoned");
        if let Some(assignment) = assignments.iter_mut().find(|a| a.id == id) {
            assignment.sent = true;
        }
    }

    pub fn get(&self, id: AssignmentId) -> Option<Assignment> {
        self.inner
            .read()
            .expect("assignment store poisoned")
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("assignment store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChoiceOption;

    fn text_assignment(question: &str, answer: &str) -> NewAssignment {
        NewAssignment {
            kind: AssignmentKind::Text,
            question: question.into(),
            correct_answer: answer.into(),
            explanation: None,
        }
    }

    fn choice_assignment(labels: &[&str], correct: &str) -> NewAssignment {
        NewAssignment {
            kind: AssignmentKind::Choice {
                options: labels
                    .iter()
                    .map(|l| ChoiceOption {
                        label: (*l).into(),
                        text: format!("option {l}"),
                    })
                    .collect(),
            },
            question: "pick one".into(),
            correct_answer: correct.into(),
            explanation: None,
        }
    }

    #[test]
    fn ids_are_dense_and_monotonic() {
        let store = AssignmentStore::new();
        for i in 1..=5u64 {
            let a = store.create(text_assignment(&format!("q{i}"), "x")).unwrap();
            assert_eq!(a.id, i);
        }
        let ids: Vec<_> = store.list().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn created_at_non_decreasing() {
        let store = AssignmentStore::new();
        store.create(text_assignment("q1", "x")).unwrap();
        store.create(text_assignment("q2", "x")).unwrap();
        let list = store.list();
        assert!(list[0].created_at <= list[1].created_at);
    }

    #[test]
    fn next_unsent_is_fifo() {
        let store = AssignmentStore::new();
        let a = store.create(text_assignment("first", "x")).unwrap();
        let b = store.create(text_assignment("second", "x")).unwrap();

        assert_eq!(store.next_unsent().unwrap().id, a.id);
        store.mark_sent(a.id);
        assert_eq!(store.next_unsent().unwrap().id, b.id);
        store.mark_sent(b.id);
        assert!(store.next_unsent().is_none());
    }

    #[test]
    fn mark_sent_is_idempotent() {
        let store = AssignmentStore::new();
        let a = store.create(text_assignment("q", "x")).unwrap();
        store.mark_sent(a.id);
        store.mark_sent(a.id);
        assert!(store.get(a.id).unwrap().sent);
        // unknown id is a no-op
        store.mark_sent(99);
    }

    #[test]
    fn rejects_empty_options() {
        let store = AssignmentStore::new();
        let result = store.create(choice_assignment(&[], "A"));
        assert_eq!(result.unwrap_err(), CoreError::EmptyOptions);
    }

    #[test]
    fn rejects_duplicate_labels() {
        let store = AssignmentStore::new();
        let result = store.create(choice_assignment(&["A", "A"], "A"));
        assert_eq!(result.unwrap_err(), CoreError::DuplicateLabel("A".into()));
    }

    #[test]
    fn rejects_correct_answer_not_a_label() {
        let store = AssignmentStore::new();
        let result = store.create(choice_assignment(&["A", "B"], "C"));
        assert_eq!(
            result.unwrap_err(),
            CoreError::CorrectLabelMissing("C".into())
        );
    }

    #[test]
    fn get_unknown_returns_none() {
        let store = AssignmentStore::new();
        assert!(store.get(1).is_none());
        assert!(store.is_empty());
    }
}
