//! The `quizcast init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("quizcast.toml").exists() {
        println!("quizcast.toml already exists, skipping.");
    } else {
        std::fs::write("quizcast.toml", SAMPLE_CONFIG)?;
        println!("Created quizcast.toml");
    }

    std::fs::create_dir_all("assignments")?;
    let example_path = std::path::Path::new("assignments/example.txt");
    if example_path.exists() {
        println!("assignments/example.txt already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_ASSIGNMENTS)?;
        println!("Created assignments/example.txt");
    }

    println!("\nNext steps:");
    println!("  1. Edit quizcast.toml with your bot token and admin id");
    println!("  2. Run: quizcast validate --file assignments/example.txt");
    println!("  3. Run: quizcast run");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizcast configuration

# Your own chat id; admin commands from anyone else are ignored.
admin_id = 0

# Authoring files loaded at startup.
assignments_path = "assignments"

[telegram]
token = "${QUIZCAST_TELEGRAM_TOKEN}"

[schedule]
weekdays = ["mon", "wed", "fri"]
hour = 0
minute = 0
"#;

const EXAMPLE_ASSIGNMENTS: &str = r#"QUESTION: What is 2+2?
A) 3
B) 4
C) 5
D) 6
CORRECT ANSWER: B
EXPLANATION: 2+2=4

QUESTION: Name the capital of France
CORRECT ANSWER: Paris
EXPLANATION: Paris has been the capital since 987.
"#;
