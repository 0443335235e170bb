//! quizcast CLI — the operator-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "quizcast", version, about = "Scheduled quiz broadcast service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the broadcast service
    Run {
        /// Config file path (default: quizcast.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Authoring file or directory to seed assignments from,
        /// overriding the config's assignments_path
        #[arg(long)]
        assignments: Option<PathBuf>,
    },

    /// Validate authoring files
    Validate {
        /// Path to an authoring .txt file or a directory of them
        #[arg(long)]
        file: PathBuf,
    },

    /// Create starter config and an example assignment file
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quizcast=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            assignments,
        } => commands::run::execute(config, assignments).await,
        Commands::Validate { file } => commands::validate::execute(file),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
