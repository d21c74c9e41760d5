// User-facing feedback: one notice per terminal outcome
use async_trait::async_trait;
use clash_common::types::{ExecutionMode, ExecutionOutcome, TestResult, Verdict};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub body: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn no_test_cases() -> Self {
        Self::new(
            NoticeLevel::Warning,
            "No test cases",
            "This question has no test cases to run against.",
        )
    }

    pub fn please_wait(remaining: Duration) -> Self {
        Self::new(
            NoticeLevel::Info,
            "Please wait",
            format!(
                "You can run your code again in {:.1}s.",
                remaining.as_secs_f64()
            ),
        )
    }
}

/// Sink for execution feedback (toasts in a browser, lines in a terminal)
#[async_trait]
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);

    /// Cosmetic effect after an accepted submission
    async fn celebrate(&self, duration: Duration);
}

fn describe_failure(failure: &TestResult) -> String {
    match &failure.error {
        Some(error) => format!("Input: {}\nError: {}", failure.input, error),
        None => format!(
            "Input: {}\nExpected: {}\nGot: {}",
            failure.input,
            failure.expected,
            failure
                .output
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "nothing".to_string())
        ),
    }
}

/// Render the single notice for an outcome
pub fn notice_for(outcome: &ExecutionOutcome) -> Notice {
    match (&outcome.verdict, outcome.operation) {
        (Verdict::Passed, ExecutionMode::Run) => Notice::new(
            NoticeLevel::Success,
            "Test case passed",
            "Your solution produced the expected output.",
        ),
        (Verdict::Passed, ExecutionMode::Submit) => Notice::new(
            NoticeLevel::Success,
            "All test cases passed",
            "Submission accepted!",
        ),
        (Verdict::Failed { first_failure }, mode) => {
            let title = match mode {
                ExecutionMode::Run => "Test case failed",
                ExecutionMode::Submit => "Submission failed",
            };
            let body = first_failure
                .as_ref()
                .map(describe_failure)
                .unwrap_or_else(|| "At least one test case did not pass.".to_string());
            Notice::new(NoticeLevel::Error, title, body)
        }
        (Verdict::CompileError { message }, _) => {
            Notice::new(NoticeLevel::Error, "Compilation error", message.clone())
        }
        (Verdict::RuntimeError { message }, _) => {
            Notice::new(NoticeLevel::Error, "Runtime error", message.clone())
        }
        (Verdict::RateLimited, _) => Notice::new(
            NoticeLevel::Warning,
            "Too many requests",
            "The execution service is busy. Wait a moment and try again.",
        ),
        (Verdict::TimedOut { attempts }, _) => Notice::new(
            NoticeLevel::Warning,
            "Execution timed out",
            format!("No result after {} status checks. Try again.", attempts),
        ),
        (Verdict::TransportFailure { message }, _) => Notice::new(
            NoticeLevel::Error,
            "Execution service unavailable",
            message.clone(),
        ),
        (Verdict::MalformedOutput { .. }, _) => Notice::new(
            NoticeLevel::Error,
            "Execution failed",
            "The execution result could not be read.",
        ),
        (Verdict::InvalidRequest { message }, _) => {
            Notice::new(NoticeLevel::Warning, "Cannot run this question", message.clone())
        }
        (Verdict::Unexpected { description, .. }, _) => Notice::new(
            NoticeLevel::Error,
            "Execution error",
            description.clone(),
        ),
    }
}
