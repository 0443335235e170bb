use assert_cmd::Command;
use predicates::prelude::*;

const SAMPLE_ASSIGNMENTS: &str = r#"QUESTION: What is 2+2?
A) 3
B) 4
CORRECT ANSWER: B
EXPLANATION: basic arithmetic

QUESTION: Name the capital of France
CORRECT ANSWER: Paris
"#;

#[test]
fn validate_accepts_well_formed_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("assignments.txt");
    std::fs::write(&path, SAMPLE_ASSIGNMENTS).unwrap();

    Command::cargo_bin("quizcast")
        .unwrap()
        .args(["validate", "--file"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 assignment(s) parsed"))
        .stdout(predicate::str::contains("What is 2+2?"));
}

#[test]
fn validate_rejects_block_without_correct_answer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.txt");
    std::fs::write(&path, "QUESTION: Orphaned question\nA) yes\nB) no\n").unwrap();

    Command::cargo_bin("quizcast")
        .unwrap()
        .args(["validate", "--file"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn validate_missing_file_fails() {
    Command::cargo_bin("quizcast")
        .unwrap()
        .args(["validate", "--file", "/nonexistent/assignments.txt"])
        .assert()
        .failure();
}

#[test]
fn init_creates_starter_files() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("quizcast")
        .unwrap()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created quizcast.toml"));

    assert!(dir.path().join("quizcast.toml").exists());
    assert!(dir.path().join("assignments/example.txt").exists());

    // the generated example must itself validate
    Command::cargo_bin("quizcast")
        .unwrap()
        .current_dir(dir.path())
        .args(["validate", "--file", "assignments/example.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 assignment(s) parsed"));
}

#[test]
fn init_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();

    for _ in 0..2 {
        Command::cargo_bin("quizcast")
            .unwrap()
            .current_dir(dir.path())
            .arg("init")
            .assert()
            .success();
    }
}

#[test]
fn run_without_config_fails() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("quizcast")
        .unwrap()
        .current_dir(dir.path())
        .env_remove("QUIZCAST_TELEGRAM_TOKEN")
        .args(["run", "--config", "/nonexistent/quizcast.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("quizcast")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("init"));
}
