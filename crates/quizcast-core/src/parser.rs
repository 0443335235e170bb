//! Authoring text parser.
//!
//! Turns the operator's free-form authoring text into a validated
//! [`NewAssignment`]. The engine never sees a partially-filled
//! assignment: parsing either yields a complete value or a structured
//! error.
//!
//! Format, one assignment per block:
//!
//! ```text
//! QUESTION: What is 2+2?
//! A) 3
//! B) 4
//! CORRECT ANSWER: B
//! EXPLANATION: 2+2=4
//! ```
//!
//! A block with option lines is a choice assignment; one without is a
//! free-text assignment whose `CORRECT ANSWER` is the expected reply.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::model::{AssignmentKind, ChoiceOption, NewAssignment};

const QUESTION_PREFIX: &str = "question:";
const ANSWER_PREFIX: &str = "correct answer:";
const EXPLANATION_PREFIX: &str = "explanation:";

/// Structured authoring parse errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("no question found; start a line with 'QUESTION:'")]
    MissingQuestion,

    #[error("no correct answer found; add a 'CORRECT ANSWER:' line")]
    MissingCorrectAnswer,

    #[error("duplicate option label: {0}")]
    DuplicateLabel(String),

    #[error("correct answer '{0}' is not one of the option labels")]
    CorrectLabelMissing(String),

    #[error("input contains no assignment text")]
    Empty,
}

/// Parse one authoring block into a validated `NewAssignment`.
pub fn parse_assignment(text: &str) -> Result<NewAssignment, ParseError> {
    let mut question = None;
    let mut correct_answer = None;
    let mut explanation = None;
    let mut options: Vec<ChoiceOption> = Vec::new();
    let mut any_content = false;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        any_content = true;

        let lower = line.to_lowercase();
        if lower.starts_with(QUESTION_PREFIX) {
            question = Some(line[QUESTION_PREFIX.len()..].trim().to_string());
        } else if lower.starts_with(ANSWER_PREFIX) {
            correct_answer = Some(line[ANSWER_PREFIX.len()..].trim().to_string());
        } else if lower.starts_with(EXPLANATION_PREFIX) {
            explanation = Some(line[EXPLANATION_PREFIX.len()..].trim().to_string());
        } else if let Some((label, option_text)) = split_option_line(line) {
            options.push(ChoiceOption {
                label: label.to_string(),
                text: option_text.to_string(),
            });
        }
        // other lines are ignored, matching lenient authoring input
    }

    if !any_content {
        return Err(ParseError::Empty);
    }

    let question = question
        .filter(|q| !q.is_empty())
        .ok_or(ParseError::MissingQuestion)?;
    let correct_answer = correct_answer
        .filter(|a| !a.is_empty())
        .ok_or(ParseError::MissingCorrectAnswer)?;
    let explanation = explanation.filter(|e| !e.is_empty());

    let kind = if options.is_empty() {
        AssignmentKind::Text
    } else {
        let mut seen = HashSet::new();
        for option in &options {
            if !seen.insert(option.label.clone()) {
                return Err(ParseError::DuplicateLabel(option.label.clone()));
            }
        }
        if !seen.contains(&correct_answer) {
            return Err(ParseError::CorrectLabelMissing(correct_answer));
        }
        AssignmentKind::Choice { options }
    };

    Ok(NewAssignment {
        kind,
        question,
        correct_answer,
        explanation,
    })
}

/// Match an option line like `A) 3`. The label must be short and
/// alphanumeric so ordinary prose with a stray `)` is not misread.
fn split_option_line(line: &str) -> Option<(&str, &str)> {
    let (label, rest) = line.split_once(") ")?;
    let label = label.trim();
    if label.is_empty() || label.len() > 3 || !label.chars().all(|c| c.is_alphanumeric()) {
        return None;
    }
    let rest = rest.trim();
    if rest.is_empty() {
        return None;
    }
    Some((label, rest))
}

/// Parse a file that may contain several assignments, each block
/// starting at a `QUESTION:` line.
pub fn parse_assignment_file(content: &str) -> Result<Vec<NewAssignment>> {
    let mut blocks: Vec<String> = Vec::new();

    for line in content.lines() {
        let starts_block = line.trim().to_lowercase().starts_with(QUESTION_PREFIX);
        if starts_block {
            blocks.push(String::new());
        } else if blocks.is_empty() {
            if line.trim().is_empty() {
                continue;
            }
            // content before the first QUESTION: line forms its own
            // block so it surfaces as a parse error
            blocks.push(String::new());
        }
        let block = blocks.last_mut().expect("block list non-empty");
        block.push_str(line);
        block.push('\n');
    }

    blocks
        .iter()
        .enumerate()
        .map(|(i, block)| {
            parse_assignment(block)
                .with_context(|| format!("assignment block {} is invalid", i + 1))
        })
        .collect()
}

/// Load one authoring file from disk.
pub fn load_assignment_file(path: &Path) -> Result<Vec<NewAssignment>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read assignment file: {}", path.display()))?;
    parse_assignment_file(&content)
        .with_context(|| format!("failed to parse {}", path.display()))
}

/// Load all `.txt` authoring files from a directory, skipping (and
/// logging) files that fail to parse.
pub fn load_assignment_directory(dir: &Path) -> Result<Vec<NewAssignment>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    let mut assignments = Vec::new();
    for entry in entries {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "txt") {
            match load_assignment_file(&path) {
                Ok(parsed) => assignments.extend(parsed),
                Err(e) => {
                    tracing::warn!("skipping {}: {e:#}", path.display());
                }
            }
        }
    }

    Ok(assignments)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHOICE_BLOCK: &str = "\
QUESTION: What is 2+2?
A) 3
B) 4
C) 5
CORRECT ANSWER: B
EXPLANATION: 2+2=4
";

    const TEXT_BLOCK: &str = "\
QUESTION: Name the capital of France
CORRECT ANSWER: Paris
";

    #[test]
    fn parse_choice_block() {
        let a = parse_assignment(CHOICE_BLOCK).unwrap();
        assert_eq!(a.question, "What is 2+2?");
        assert_eq!(a.correct_answer, "B");
        assert_eq!(a.explanation.as_deref(), Some("2+2=4"));
        let AssignmentKind::Choice { options } = a.kind else {
            panic!("expected choice kind");
        };
        let labels: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "B", "C"]);
        assert_eq!(options[1].text, "4");
    }

    #[test]
    fn parse_text_block() {
        let a = parse_assignment(TEXT_BLOCK).unwrap();
        assert_eq!(a.kind, AssignmentKind::Text);
        assert_eq!(a.correct_answer, "Paris");
        assert!(a.explanation.is_none());
    }

    #[test]
    fn prefixes_are_case_insensitive() {
        let a = parse_assignment("question: q\ncorrect answer: x\n").unwrap();
        assert_eq!(a.question, "q");
        assert_eq!(a.correct_answer, "x");
    }

    #[test]
    fn missing_question_rejected() {
        let err = parse_assignment("CORRECT ANSWER: B\n").unwrap_err();
        assert_eq!(err, ParseError::MissingQuestion);
    }

    #[test]
    fn missing_correct_answer_rejected() {
        let err = parse_assignment("QUESTION: q\nA) 1\n").unwrap_err();
        assert_eq!(err, ParseError::MissingCorrectAnswer);
    }

    #[test]
    fn duplicate_label_rejected() {
        let block = "QUESTION: q\nA) 1\nA) 2\nCORRECT ANSWER: A\n";
        let err = parse_assignment(block).unwrap_err();
        assert_eq!(err, ParseError::DuplicateLabel("A".into()));
    }

    #[test]
    fn correct_label_must_be_an_option() {
        let block = "QUESTION: q\nA) 1\nB) 2\nCORRECT ANSWER: D\n";
        let err = parse_assignment(block).unwrap_err();
        assert_eq!(err, ParseError::CorrectLabelMissing("D".into()));
    }

    #[test]
    fn empty_input_rejected() {
        assert_eq!(parse_assignment("  \n \n").unwrap_err(), ParseError::Empty);
    }

    #[test]
    fn prose_with_parenthesis_is_not_an_option() {
        let block = "QUESTION: Solve f(x) = x\nCORRECT ANSWER: zero\n";
        let a = parse_assignment(block).unwrap();
        assert_eq!(a.kind, AssignmentKind::Text);
    }

    #[test]
    fn multi_block_file() {
        let content = format!("{CHOICE_BLOCK}\n{TEXT_BLOCK}");
        let parsed = parse_assignment_file(&content).unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(parsed[0].kind.is_choice());
        assert_eq!(parsed[1].kind, AssignmentKind::Text);
    }

    #[test]
    fn invalid_block_fails_whole_file() {
        let content = format!("{CHOICE_BLOCK}\nQUESTION: broken\n");
        let err = parse_assignment_file(&content).unwrap_err();
        assert!(err.to_string().contains("block 2"));
    }

    #[test]
    fn load_directory_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.txt"), TEXT_BLOCK).unwrap();
        std::fs::write(dir.path().join("bad.txt"), "CORRECT ANSWER: x\n").unwrap();
        std::fs::write(dir.path().join("ignored.md"), "not loaded").unwrap();

        let assignments = load_assignment_directory(dir.path()).unwrap();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].correct_answer, "Paris");
    }
}
