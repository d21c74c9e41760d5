mod commands;
mod notifier;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use clash_common::types::{ExecutionMode, Language};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "clash")]
#[command(about = "Clash CLI - Run and grade solutions against a remote sandbox", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
pub struct ExecArgs {
    /// Question id (or slug when reading from --questions)
    #[arg(short, long)]
    pub question: String,

    /// Language (javascript, python, cpp, java; aliases like js, py, c++ work).
    /// Guessed from the file extension when omitted.
    #[arg(short, long)]
    pub language: Option<Language>,

    /// Source file containing the solution
    #[arg(short, long)]
    pub file: PathBuf,

    /// Read questions from a JSON file instead of Redis
    #[arg(long)]
    pub questions: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the solution against the first test case
    Run(ExecArgs),

    /// Grade the solution against every test case
    Submit(ExecArgs),

    /// Load questions from a JSON file into Redis
    Seed {
        /// JSON file with one question or an array of questions
        #[arg(short, long)]
        file: PathBuf,
    },

    /// List problems the harness knows how to call
    Problems {
        /// List question ids stored in Redis instead
        #[arg(long, default_value = "false")]
        stored: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Diagnostics go to stderr; results are printed on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            if !commands::execute(ExecutionMode::Run, &args).await? {
                std::process::exit(1);
            }
        }
        Commands::Submit(args) => {
            if !commands::execute(ExecutionMode::Submit, &args).await? {
                std::process::exit(1);
            }
        }
        Commands::Seed { file } => {
            commands::seed(&file).await?;
        }
        Commands::Problems { stored } => {
            if stored {
                commands::list_stored().await?;
            } else {
                commands::list_problems();
            }
        }
    }

    Ok(())
}
