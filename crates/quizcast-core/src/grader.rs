//! Pure grading rules.
//!
//! Choice answers compare labels exactly (labels are small fixed tokens
//! like "A", "B"). Text answers fold case and surrounding whitespace on
//! both sides, nothing more: no fuzzy matching, no numeric
//! normalization.

use crate::model::Assignment;

/// Grade a choice click: exact, case-sensitive label comparison.
pub fn grade_choice(assignment: &Assignment, submitted_label: &str) -> bool {
    submitted_label == assignment.correct_answer
}

/// Grade a free-text reply: trim and lowercase both sides, then compare.
pub fn grade_text(assignment: &Assignment, submitted_text: &str) -> bool {
    fold(submitted_text) == fold(&assignment.correct_answer)
}

/// Case/whitespace folding applied to text answers before comparison.
///
/// Exposed so callers can store the folded form in the ledger, matching
/// what was actually graded.
pub fn fold(text: &str) -> String {
    text.trim().to_lowercase()
}
