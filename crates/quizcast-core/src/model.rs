//! Core data model types for quizcast.
//!
//! These are the fundamental types the entire quizcast system uses to
//! represent assignments, subscribers, and answer records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of an assignment. Dense, assigned in creation order from 1.
pub type AssignmentId = u64;

/// Opaque recipient identifier. Signed to fit Telegram chat ids.
pub type RecipientId = i64;

/// One answer option of a multiple-choice assignment.
///
/// Options keep the order they were authored in; `label` is the small
/// fixed token shown on the button ("A", "B", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// Option label, e.g. "A".
    pub label: String,
    /// Option text, e.g. "4".
    pub text: String,
}

/// The kind of an assignment: button-answered or free-text-answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AssignmentKind {
    /// Multiple choice; answered by clicking a labeled button.
    Choice {
        /// Ordered answer options. Non-empty by construction.
        options: Vec<ChoiceOption>,
    },
    /// Free text; answered by a plain chat message.
    Text,
}

impl AssignmentKind {
    /// Returns `true` for multiple-choice assignments.
    pub fn is_choice(&self) -> bool {
        matches!(self, AssignmentKind::Choice { .. })
    }

    /// Look up an option's text by label, for choice assignments.
    pub fn option_text(&self, label: &str) -> Option<&str> {
        match self {
            AssignmentKind::Choice { options } => options
                .iter()
                .find(|o| o.label == label)
                .map(|o| o.text.as_str()),
            AssignmentKind::Text => None,
        }
    }
}

impl fmt::Display for AssignmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentKind::Choice { .. } => write!(f, "choice"),
            AssignmentKind::Text => write!(f, "text"),
        }
    }
}

/// A quiz assignment as stored by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    /// Unique id, assigned in creation order starting at 1. Never reused.
    pub id: AssignmentId,
    /// Choice or free-text.
    pub kind: AssignmentKind,
    /// The question text. Non-empty (enforced by the authoring parser).
    pub question: String,
    /// For `Choice`, one of the option labels; for `Text`, the expected answer.
    pub correct_answer: String,
    /// Optional explanation shown after grading.
    pub explanation: Option<String>,
    /// Set true exactly once by the broadcaster; never reverts.
    pub sent: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// A validated authoring payload, as produced by the authoring parser.
///
/// The store turns this into an [`Assignment`] by assigning the next id
/// and stamping the creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAssignment {
    pub kind: AssignmentKind,
    pub question: String,
    pub correct_answer: String,
    pub explanation: Option<String>,
}

/// One recipient's graded response to one assignment.
///
/// Keyed by (assignment id, recipient); a later grading event for the
/// same key overwrites the earlier record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub recipient: RecipientId,
    pub assignment_id: AssignmentId,
    /// The answer as graded: the clicked label, or the folded text reply.
    pub raw_answer: String,
    pub is_correct: bool,
    pub answered_at: DateTime<Utc>,
}
