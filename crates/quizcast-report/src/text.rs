//! Text rendering of assignments and statistics.
//!
//! Output is plain text sized for chat messages; anything long goes
//! through [`paginate`] before sending (Telegram caps messages at 4096
//! characters).

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Table};

use quizcast_core::model::{Assignment, AssignmentKind};
use quizcast_core::stats::{
    CompletionBasis, LeaderboardRow, ProgressRow, RecipientAccuracy, StatsAggregator, Verdict,
};

/// Telegram's message length cap.
pub const MESSAGE_LIMIT: usize = 4096;

/// Split `text` into chunks of at most `limit` characters, breaking on
/// char boundaries.
pub fn paginate(text: &str, limit: usize) -> Vec<String> {
    if limit == 0 || text.is_empty() {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if current.chars().count() == limit {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    chunks.push(current);
    chunks
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}

/// The operator's assignment list: id, status, kind, and a preview.
pub fn render_assignment_list(assignments: &[Assignment]) -> String {
    if assignments.is_empty() {
        return "No assignments yet.".into();
    }

    let mut out = String::from("Assignments:\n\n");
    for assignment in assignments {
        let status = if assignment.sent { "sent" } else { "waiting" };
        out.push_str(&format!(
            "#{} [{}] ({})\n  Q: {}\n",
            assignment.id,
            status,
            assignment.kind,
            truncate(&assignment.question, 50),
        ));
        if let AssignmentKind::Choice { options } = &assignment.kind {
            let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
            out.push_str(&format!("  Options: {}\n", labels.join(", ")));
        }
        out.push_str(&format!("  Answer: {}\n\n", assignment.correct_answer));
    }
    out
}

/// Per-assignment accuracy plus the overall total.
pub fn render_stats_report(assignments: &[Assignment], stats: &StatsAggregator) -> String {
    let mut out = String::from("Statistics\n\n");
    let mut any = false;

    for assignment in assignments {
        let acc = stats.per_assignment_accuracy(assignment.id);
        if acc.total == 0 {
            continue;
        }
        any = true;
        out.push_str(&format!(
            "#{} {}\n  {}/{} correct ({:.1}%)\n\n",
            assignment.id,
            truncate(&assignment.question, 40),
            acc.correct,
            acc.total,
            acc.percentage,
        ));
    }

    if !any {
        return "No answers yet.".into();
    }

    let overall = stats.overall_accuracy();
    out.push_str(&format!(
        "Total: {}/{} ({:.1}%)\n",
        overall.correct, overall.total, overall.percentage
    ));
    out
}

/// Leaderboard table: rank, recipient, score, percentage.
pub fn render_leaderboard(rows: &[LeaderboardRow]) -> String {
    if rows.is_empty() {
        return "No answers yet.".into();
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Recipient", "Correct", "%"]);
    for (rank, row) in rows.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(row.recipient),
            Cell::new(format!("{}/{}", row.accuracy.correct, row.accuracy.total)),
            Cell::new(format!("{:.1}", row.accuracy.percentage)),
        ]);
    }
    table.to_string()
}

/// Progress matrix: one row per recipient, one column per assignment,
/// with a completion-rate footer.
pub fn render_progress_matrix(
    rows: &[ProgressRow],
    assignments: &[Assignment],
    stats: &StatsAggregator,
) -> String {
    if rows.is_empty() {
        return "No answers yet.".into();
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);

    let mut header = vec!["Recipient".to_string(), "Score".into(), "%".into()];
    header.extend(assignments.iter().map(|a| format!("#{}", a.id)));
    table.set_header(header);

    for row in rows {
        let mut cells = vec![
            Cell::new(row.recipient),
            Cell::new(format!("{}/{}", row.accuracy.correct, row.accuracy.total)),
            Cell::new(format!("{:.1}", row.accuracy.percentage)),
        ];
        for assignment in assignments {
            let mark = match row.per_assignment.get(&assignment.id) {
                Some(Verdict::Correct) => "+",
                Some(Verdict::Incorrect) => "x",
                Some(Verdict::Unanswered) | None => "-",
            };
            cells.push(Cell::new(mark));
        }
        table.add_row(cells);
    }

    let mut footer = vec![
        Cell::new("answered correctly"),
        Cell::new(""),
        Cell::new(""),
    ];
    for assignment in assignments {
        let rate = stats.completion_rate(assignment.id, CompletionBasis::Answerers);
        footer.push(Cell::new(format!("{rate:.0}%")));
    }
    table.add_row(footer);

    table.to_string()
}

/// One recipient's history with per-assignment detail.
pub fn render_recipient_details(
    accuracy: &RecipientAccuracy,
    assignments: &[Assignment],
) -> String {
    if accuracy.details.is_empty() {
        return format!("Recipient {} has not answered yet.", accuracy.recipient);
    }

    let mut out = format!(
        "Recipient {}: {}/{} correct ({:.1}%)\n\n",
        accuracy.recipient,
        accuracy.accuracy.correct,
        accuracy.accuracy.total,
        accuracy.accuracy.percentage,
    );

    for detail in &accuracy.details {
        let mark = if detail.is_correct { "+" } else { "x" };
        out.push_str(&format!(
            "{mark} #{}: answered '{}'\n",
            detail.assignment_id, detail.answer
        ));
        if let Some(assignment) = assignments.iter().find(|a| a.id == detail.assignment_id) {
            if !detail.is_correct {
                out.push_str(&format!("    correct: {}\n", assignment.correct_answer));
                if let Some(explanation) = &assignment.explanation {
                    out.push_str(&format!("    note: {}\n", truncate(explanation, 100)));
                }
            }
        }
    }
    out
}

/// A graded-answer verdict message sent back to the recipient.
pub fn render_verdict(reply: &quizcast_core::inbound::GradedReply) -> String {
    let assignment = &reply.assignment;
    if reply.is_correct {
        let mut out = format!(
            "Correct!\n\nAssignment #{}\nYour answer: {}",
            assignment.id, reply.answer
        );
        if let Some(explanation) = &assignment.explanation {
            out.push_str(&format!("\n\n{explanation}"));
        }
        out
    } else {
        let mut out = format!(
            "Not quite.\n\nAssignment #{}\nYour answer: {}\nCorrect answer: {}",
            assignment.id, reply.answer, assignment.correct_answer
        );
        if let Some(explanation) = &assignment.explanation {
            out.push_str(&format!("\n\nExplanation: {explanation}"));
        }
        out
    }
}
