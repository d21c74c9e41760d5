// CLI commands for running solutions and managing questions
use anyhow::{bail, Context, Result};
use clash_common::config::SandboxConfig;
use clash_common::redis;
use clash_common::types::{ExecutionMode, ExecutionOutcome, Language, OutcomeResults, Question, TestResult};
use clash_engine::{ExecutionOrchestrator, HarnessGenerator, Judge0Client};
use ::redis::aio::ConnectionManager;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::notifier::TerminalNotifier;
use crate::ExecArgs;

async fn connect_redis() -> Result<ConnectionManager> {
    let redis_url = std::env::var("REDIS_URL")
        .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

    let client = ::redis::Client::open(redis_url.as_str())
        .context("Failed to create Redis client")?;
    let conn = ConnectionManager::new(client)
        .await
        .with_context(|| format!("Failed to connect to Redis at {}", redis_url))?;

    info!("Connected to Redis: {}", redis_url);
    Ok(conn)
}

/// Parse a questions file: a single question object or an array of them
fn parse_questions(content: &str) -> Result<Vec<Question>> {
    let value: Value = serde_json::from_str(content).context("Questions file is not valid JSON")?;
    let questions = match value {
        Value::Array(_) => serde_json::from_value(value).context("Failed to parse questions")?,
        _ => vec![serde_json::from_value(value).context("Failed to parse question")?],
    };
    Ok(questions)
}

fn load_questions(path: &Path) -> Result<Vec<Question>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_questions(&content)
}

/// Match by id first, then by problem key (`two-sum` finds "Two Sum")
fn find_question(questions: Vec<Question>, wanted: &str) -> Option<Question> {
    let position = questions
        .iter()
        .position(|q| q.id == wanted)
        .or_else(|| questions.iter().position(|q| q.problem_key() == wanted))?;
    questions.into_iter().nth(position)
}

async fn resolve_question(args: &ExecArgs) -> Result<Question> {
    let question = match &args.questions {
        Some(path) => find_question(load_questions(path)?, &args.question),
        None => {
            let mut conn = connect_redis().await?;
            redis::fetch_question(&mut conn, &args.question)
                .await
                .context("Failed to fetch question")?
        }
    };

    match question {
        Some(question) => Ok(question),
        None => bail!("Question '{}' not found", args.question),
    }
}

fn resolve_language(args: &ExecArgs) -> Result<Language> {
    if let Some(language) = args.language {
        return Ok(language);
    }
    let guessed = args
        .file
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(Language::from_file_extension);
    match guessed {
        Some(language) => Ok(language),
        None => bail!(
            "Cannot tell the language of {}; pass --language",
            args.file.display()
        ),
    }
}

fn print_case(index: usize, result: &TestResult) {
    let mark = if result.passed { "✔" } else { "✘" };
    println!("  {} case {}  input: {}", mark, index + 1, result.input);
    if !result.passed {
        match &result.error {
            Some(error) => println!("      error: {}", error),
            None => {
                let output = result
                    .output
                    .as_ref()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "nothing".to_string());
                println!("      expected: {}  got: {}", result.expected, output);
            }
        }
    }
}

fn print_results(outcome: &ExecutionOutcome) {
    match &outcome.results {
        Some(OutcomeResults::Single(result)) => print_case(0, result),
        Some(OutcomeResults::Suite(report)) => {
            for (index, result) in report.results.iter().enumerate() {
                print_case(index, result);
            }
        }
        None => {}
    }
}

/// Run or submit a solution. Returns whether the outcome succeeded.
pub async fn execute(mode: ExecutionMode, args: &ExecArgs) -> Result<bool> {
    let language = resolve_language(args)?;
    let source = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let question = resolve_question(args).await?;

    let config = SandboxConfig::from_env().context("Invalid sandbox configuration")?;
    let client = Judge0Client::new(config).context("Failed to create sandbox client")?;
    let orchestrator = ExecutionOrchestrator::new(client, TerminalNotifier::new(), HarnessGenerator::default());

    println!("🚀 {} {} ({})", mode, question.title, language);

    let Some(outcome) = orchestrator
        .execute(mode, &source, language, Some(&question))
        .await
    else {
        return Ok(false);
    };

    print_results(&outcome);
    Ok(outcome.success)
}

/// Load questions from a JSON file into Redis
pub async fn seed(file: &Path) -> Result<()> {
    let questions = load_questions(file)?;
    if questions.is_empty() {
        bail!("{} contains no questions", file.display());
    }

    let generator = HarnessGenerator::default();
    let mut conn = connect_redis().await?;

    for question in &questions {
        let key = question.problem_key();
        if generator.registry().get(&key).is_none() {
            warn!(question = %question.id, problem = %key, "No harness registered for this problem");
        }
        if question.test_cases.is_empty() {
            warn!(question = %question.id, "Question has no test cases");
        }

        redis::store_question(&mut conn, question)
            .await
            .with_context(|| format!("Failed to store question {}", question.id))?;
        println!("✅ Stored {} ({} test cases)", question.id, question.test_cases.len());
    }

    println!("🎉 Seeded {} question(s)", questions.len());
    Ok(())
}

/// Print every problem the harness generator can call
pub fn list_problems() {
    let generator = HarnessGenerator::default();
    let registry = generator.registry();
    for key in registry.keys() {
        if let Some(problem) = registry.get(key) {
            println!("{:<36} {}", key, problem.title);
        }
    }
}

pub async fn list_stored() -> Result<()> {
    let mut conn = connect_redis().await?;
    let ids = redis::list_question_ids(&mut conn)
        .await
        .context("Failed to list questions")?;

    if ids.is_empty() {
        println!("No questions stored. Use `clash seed --file <questions.json>`.");
    }
    for id in ids {
        println!("{}", id);
    }
    Ok(())
}
