//! Aggregate correctness statistics.
//!
//! A pure read model over the assignment store, answer ledger, and
//! subscriber registry. Nothing here mutates state, so every query may
//! run concurrently with any other operation.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ledger::AnswerLedger;
use crate::model::{AssignmentId, RecipientId};
use crate::registry::SubscriberRegistry;
use crate::store::AssignmentStore;

/// Correct/total counts with a derived percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Accuracy {
    pub correct: usize,
    pub total: usize,
    /// `correct / total * 100`, or `0.0` when there are no answers.
    pub percentage: f64,
}

impl Accuracy {
    pub fn new(correct: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64 * 100.0
        };
        Self {
            correct,
            total,
            percentage,
        }
    }
}

/// One line of a recipient's answer history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerDetail {
    pub assignment_id: AssignmentId,
    pub answer: String,
    pub is_correct: bool,
}

/// A recipient's accuracy with their per-assignment details in
/// assignment order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientAccuracy {
    pub recipient: RecipientId,
    pub accuracy: Accuracy,
    pub details: Vec<AnswerDetail>,
}

/// One leaderboard row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub recipient: RecipientId,
    pub accuracy: Accuracy,
}

/// Per-cell verdict in the progress matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Correct,
    Incorrect,
    Unanswered,
}

/// One row of the progress matrix: a recipient's accuracy plus their
/// verdict for every created assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRow {
    pub recipient: RecipientId,
    pub accuracy: Accuracy,
    pub per_assignment: BTreeMap<AssignmentId, Verdict>,
}

/// Which population `completion_rate` measures against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionBasis {
    /// Current subscribers.
    Subscribers,
    /// Everyone who has ever answered any assignment.
    Answerers,
}

/// Read-only statistics over the current store state.
pub struct StatsAggregator {
    store: Arc<AssignmentStore>,
    ledger: Arc<AnswerLedger>,
    subscribers: Arc<SubscriberRegistry>,
}

impl StatsAggregator {
    pub fn new(
        store: Arc<AssignmentStore>,
        ledger: Arc<AnswerLedger>,
        subscribers: Arc<SubscriberRegistry>,
    ) -> Self {
        Self {
            store,
            ledger,
            subscribers,
        }
    }

    /// Accuracy across all answers to one assignment.
    pub fn per_assignment_accuracy(&self, assignment_id: AssignmentId) -> Accuracy {
        let records = self.ledger.records_for(assignment_id);
        let correct = records.values().filter(|r| r.is_correct).count();
        Accuracy::new(correct, records.len())
    }

    /// Accuracy summed across all assignments.
    pub fn overall_accuracy(&self) -> Accuracy {
        let mut correct = 0;
        let mut total = 0;
        for id in self.ledger.answered_assignments() {
            let records = self.ledger.records_for(id);
            correct += records.values().filter(|r| r.is_correct).count();
            total += records.len();
        }
        Accuracy::new(correct, total)
    }

    /// One recipient's accuracy, with details in assignment order.
    pub fn per_recipient_accuracy(&self, recipient: RecipientId) -> RecipientAccuracy {
        let records = self.ledger.records_by_recipient(recipient);
        let correct = records.values().filter(|r| r.is_correct).count();
        let details = records
            .iter()
            .map(|(id, r)| AnswerDetail {
                assignment_id: *id,
                answer: r.raw_answer.clone(),
                is_correct: r.is_correct,
            })
            .collect();
        RecipientAccuracy {
            recipient,
            accuracy: Accuracy::new(correct, records.len()),
            details,
        }
    }

    /// All-time answerers ranked by percentage, descending.
    ///
    /// Tie order is unspecified; callers must not depend on it.
    pub fn leaderboard(&self) -> Vec<LeaderboardRow> {
        let mut rows: Vec<LeaderboardRow> = self
            .ledger
            .all_recipients()
            .into_iter()
            .map(|recipient| {
                let records = self.ledger.records_by_recipient(recipient);
                let correct = records.values().filter(|r| r.is_correct).count();
                LeaderboardRow {
                    recipient,
                    accuracy: Accuracy::new(correct, records.len()),
                }
            })
            .collect();
        rows.sort_by(|a, b| {
            b.accuracy
                .percentage
                .partial_cmp(&a.accuracy.percentage)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        rows
    }

    /// Per-recipient verdicts over every created assignment, rows
    /// sorted by percentage descending.
    pub fn progress_matrix(&self) -> Vec<ProgressRow> {
        let assignment_ids: Vec<AssignmentId> =
            self.store.list().iter().map(|a| a.id).collect();

        let mut rows: Vec<ProgressRow> = self
            .ledger
            .all_recipients()
            .into_iter()
            .map(|recipient| {
                let records = self.ledger.records_by_recipient(recipient);
                let correct = records.values().filter(|r| r.is_correct).count();
                let per_assignment = assignment_ids
                    .iter()
                    .map(|id| {
                        let verdict = match records.get(id) {
                            Some(r) if r.is_correct => Verdict::Correct,
                            Some(_) => Verdict::Incorrect,
                            None => Verdict::Unanswered,
                        };
                        (*id, verdict)
                    })
                    .collect();
                ProgressRow {
                    recipient,
                    accuracy: Accuracy::new(correct, records.len()),
                    per_assignment,
                }
            })
            .collect();
        rows.sort_by(|a, b| {
            b.accuracy
                .percentage
                .partial_cmp(&a.accuracy.percentage)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        rows
    }

    /// Percentage of the chosen population that answered the
    /// assignment correctly.
    pub fn completion_rate(&self, assignment_id: AssignmentId, basis: CompletionBasis) -> f64 {
        let population = match basis {
            CompletionBasis::Subscribers => self.subscribers.len(),
            CompletionBasis::Answerers => self.ledger.all_recipients().len(),
        };
        if population == 0 {
            return 0.0;
        }
        let correct = self
            .ledger
            .records_for(assignment_id)
            .values()
            .filter(|r| r.is_correct)
            .count();
        correct as f64 / population as f64 * 100.0
    }
}
