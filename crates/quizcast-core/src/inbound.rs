//! Inbound answer routing.
//!
//! The entry points the transport layer invokes when a recipient clicks
//! a choice button or sends a free-text reply. Routing grades the
//! answer, records it in the ledger, and hands back everything the
//! caller needs to render a verdict.
//!
//! The two paths are deliberately asymmetric: a choice click for any
//! valid (assignment, label) is always graded and overwrites the prior
//! record, while a text reply is only graded while a pending entry
//! exists for the recipient and grading consumes that entry.

use std::sync::Arc;

use crate::error::CoreError;
use crate::grader;
use crate::ledger::AnswerLedger;
use crate::model::{Assignment, AssignmentId, AssignmentKind, RecipientId};
use crate::registry::PendingAnswerRegistry;
use crate::store::AssignmentStore;

/// The graded result of an inbound answer, for the caller to render.
#[derive(Debug, Clone)]
pub struct GradedReply {
    pub assignment: Assignment,
    pub recipient: RecipientId,
    /// The answer as graded: the clicked label, or the folded text.
    pub answer: String,
    pub is_correct: bool,
}

/// Routes inbound answer events through grading into the ledger.
pub struct AnswerRouter {
    store: Arc<AssignmentStore>,
    pending: Arc<PendingAnswerRegistry>,
    ledger: Arc<AnswerLedger>,
}

impl AnswerRouter {
    pub fn new(
        store: Arc<AssignmentStore>,
        pending: Arc<PendingAnswerRegistry>,
        ledger: Arc<AnswerLedger>,
    ) -> Self {
        Self {
            store,
            pending,
            ledger,
        }
    }

    /// Handle a choice-button click.
    ///
    /// Accepted for any existing choice assignment regardless of prior
    /// answers from the recipient; a resubmission overwrites the
    /// earlier record. Discards events for unknown ids or non-choice
    /// assignments.
    pub fn handle_choice(
        &self,
        recipient: RecipientId,
        assignment_id: AssignmentId,
        label: &str,
    ) -> Result<GradedReply, CoreError> {
        let assignment = self
            .store
            .get(assignment_id)
            .ok_or(CoreError::UnknownAssignment(assignment_id))?;
        if !assignment.kind.is_choice() {
            return Err(CoreError::WrongKind(assignment_id, "choice"));
        }

        let is_correct = grader::grade_choice(&assignment, label);
        self.ledger.record(assignment_id, recipient, label, is_correct);
        tracing::debug!(recipient, assignment_id, label, is_correct, "choice graded");

        Ok(GradedReply {
            assignment,
            recipient,
            answer: label.to_string(),
            is_correct,
        })
    }

    /// Handle a free-text reply.
    ///
    /// Only graded while the recipient has a pending entry; the entry
    /// is consumed before grading so each delivery is answered at most
    /// once. A reply with no pending entry is discarded silently.
    pub fn handle_text(
        &self,
        recipient: RecipientId,
        raw_text: &str,
    ) -> Result<GradedReply, CoreError> {
        let assignment_id = self
            .pending
            .take(recipient)
            .ok_or(CoreError::NoPendingAnswer)?;

        let Some(assignment) = self.store.get(assignment_id) else {
            // Stale entry for an assignment that no longer resolves.
            // The entry is already consumed, which is what we want.
            return Err(CoreError::UnknownAssignment(assignment_id));
        };
        if !matches!(assignment.kind, AssignmentKind::Text) {
            return Err(CoreError::WrongKind(assignment_id, "text"));
        }

        let folded = grader::fold(raw_text);
        let is_correct = grader::grade_text(&assignment, raw_text);
        self.ledger
            .record(assignment_id, recipient, folded.clone(), is_correct);
        tracing::debug!(recipient, assignment_id, is_correct, "text reply graded");

        Ok(GradedReply {
            assignment,
            recipient,
            answer: folded,
            is_correct,
        })
    }
}
