//! The answer ledger.
//!
//! Owns the sparse (assignment × recipient) matrix of answer records.
//! Records are never deleted; a later grading event for the same key
//! overwrites the earlier record.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use chrono::Utc;

use crate::model::{AnswerRecord, AssignmentId, RecipientId};

/// Thread-safe store of graded answers, keyed by (assignment, recipient).
///
/// A single lock covers the whole matrix, which makes each `record`
/// call atomic per key with no lost updates under concurrent grading.
#[derive(Debug, Default)]
pub struct AnswerLedger {
    inner: Mutex<BTreeMap<AssignmentId, BTreeMap<RecipientId, AnswerRecord>>>,
}

impl AnswerLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the record for (assignment, recipient),
    /// stamping the current time.
    pub fn record(
        &self,
        assignment_id: AssignmentId,
        recipient: RecipientId,
        raw_answer: impl Into<String>,
        is_correct: bool,
    ) {
        let record = AnswerRecord {
            recipient,
            assignment_id,
            raw_answer: raw_answer.into(),
            is_correct,
            answered_at: Utc::now(),
        };
        self.inner
            .lock()
            .expect("answer ledger poisoned")
            .entry(assignment_id)
            .or_default()
            .insert(recipient, record);
    }

    /// All records for one assignment, keyed by recipient.
    pub fn records_for(&self, assignment_id: AssignmentId) -> BTreeMap<RecipientId, AnswerRecord> {
        self.inner
            .lock()
            .expect("answer ledger poisoned")
            .get(&assignment_id)
            .cloned()
            .unwrap_or_default()
    }

    /// All records by one recipient, keyed by assignment id (ascending).
    pub fn records_by_recipient(
        &self,
        recipient: RecipientId,
    ) -> BTreeMap<AssignmentId, AnswerRecord> {
        self.inner
            .lock()
            .expect("answer ledger poisoned")
            .iter()
            .filter_map(|(id, by_recipient)| {
                by_recipient.get(&recipient).map(|r| (*id, r.clone()))
            })
            .collect()
    }

    /// Union of all recipients who have ever answered any assignment.
    pub fn all_recipients(&self) -> HashSet<RecipientId> {
        self.inner
            .lock()
            .expect("answer ledger poisoned")
            .values()
            .flat_map(|by_recipient| by_recipient.keys().copied())
            .collect()
    }

    /// Total number of stored records.
    pub fn answer_count(&self) -> usize {
        self.inner
            .lock()
            .expect("answer ledger poisoned")
            .values()
            .map(|by_recipient| by_recipient.len())
            .sum()
    }

    /// Assignment ids with at least one record, ascending.
    pub fn answered_assignments(&self) -> Vec<AssignmentId> {
        self.inner
            .lock()
            .expect("answer ledger poisoned")
            .iter()
            .filter(|(_, by_recipient)| !by_recipient.is_empty())
            .map(|(id, _)| *id)
            .collect()
    }
}
