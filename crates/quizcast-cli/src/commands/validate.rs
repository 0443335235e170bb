//! The `quizcast validate` command.

use std::path::PathBuf;

use anyhow::Result;

use quizcast_core::parser;

pub fn execute(path: PathBuf) -> Result<()> {
    let assignments = if path.is_dir() {
        parser::load_assignment_directory(&path)?
    } else {
        parser::load_assignment_file(&path)?
    };

    for (i, assignment) in assignments.iter().enumerate() {
        let preview: String = assignment.question.chars().take(50).collect();
        println!("{}. [{}] {}", i + 1, assignment.kind, preview);
    }

    println!("{} assignment(s) parsed, all valid.", assignments.len());
    Ok(())
}
