/// Result Interpreter - Sandbox Output Classification
///
/// **Core Responsibility:**
/// Turn a raw sandbox response into a normalized `ExecutionOutcome`.
///
/// **Critical Properties:**
/// - Knows nothing about HTTP or how the program was submitted
/// - Knows nothing about the target language
/// - Pure function: (raw result, mode) → outcome; interpreting twice gives the same answer
/// - Never fails: undecodable or unparsable output becomes `success: false`
///
/// **Status Mapping (sandbox status id):**
/// - 3 Accepted, 4 Wrong Answer: decode stdout; the harness's own JSON verdict governs
/// - 6 Compilation Error: decode compile_output
/// - 11, 12 Runtime Error: decode stderr
/// - 429 Too Many Requests: no decoding
/// - anything else: generic failure carrying the sandbox's description

use crate::error::ExecutionError;
use base64::{engine::general_purpose, Engine as _};
use clash_common::types::{
    ExecutionMode, ExecutionOutcome, OutcomeResults, SandboxResult, SuiteReport, TestResult, Verdict,
};
use tracing::warn;

pub const STATUS_ACCEPTED: u32 = 3;
pub const STATUS_WRONG_ANSWER: u32 = 4;
pub const STATUS_COMPILATION_ERROR: u32 = 6;
pub const STATUS_RUNTIME_ERROR_NZEC: u32 = 11;
pub const STATUS_RUNTIME_ERROR_OTHER: u32 = 12;
pub const STATUS_TOO_MANY_REQUESTS: u32 = 429;

/// Decode one base64 payload field.
///
/// The sandbox wraps long payloads across lines, so whitespace is stripped first.
/// Invalid UTF-8 is replaced rather than rejected.
pub fn decode_field(field: Option<&str>) -> Result<String, base64::DecodeError> {
    let Some(encoded) = field else {
        return Ok(String::new());
    };
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = general_purpose::STANDARD.decode(compact)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Decode a diagnostic field, keeping the raw text if it is not base64
fn decode_diagnostic(field: Option<&str>) -> String {
    match decode_field(field) {
        Ok(text) => text.trim_end().to_string(),
        Err(_) => field.unwrap_or_default().trim_end().to_string(),
    }
}

/// The harness prints its verdict last; earlier lines are user output.
fn result_line(stdout: &str) -> Option<&str> {
    stdout.lines().rev().map(str::trim).find(|line| !line.is_empty())
}

fn parse_report<T: serde::de::DeserializeOwned>(stdout: &str) -> Option<T> {
    result_line(stdout)
        .and_then(|line| serde_json::from_str(line).ok())
        .or_else(|| serde_json::from_str(stdout.trim()).ok())
}

pub fn interpret(raw: &SandboxResult, mode: ExecutionMode) -> ExecutionOutcome {
    match raw.status.id {
        STATUS_ACCEPTED | STATUS_WRONG_ANSWER => interpret_completed(raw, mode),
        STATUS_COMPILATION_ERROR => {
            let mut message = decode_diagnostic(raw.compile_output.as_deref());
            if message.is_empty() {
                message = raw.status.description.clone();
            }
            ExecutionOutcome::failure(mode, Verdict::CompileError { message })
        }
        STATUS_RUNTIME_ERROR_NZEC | STATUS_RUNTIME_ERROR_OTHER => {
            let mut message = decode_diagnostic(raw.stderr.as_deref());
            if message.is_empty() {
                message = decode_diagnostic(raw.message.as_deref());
            }
            if message.is_empty() {
                message = raw.status.description.clone();
            }
            ExecutionOutcome::failure(mode, Verdict::RuntimeError { message })
        }
        STATUS_TOO_MANY_REQUESTS => ExecutionOutcome::failure(mode, Verdict::RateLimited),
        status_id => {
            let detail = decode_diagnostic(raw.message.as_deref());
            let description = match (raw.status.description.trim(), detail.as_str()) {
                ("", "") => format!("sandbox status {}", status_id),
                (desc, "") => desc.to_string(),
                ("", detail) => detail.to_string(),
                (desc, detail) => format!("{}: {}", desc, detail),
            };
            ExecutionOutcome::failure(mode, Verdict::Unexpected { status_id, description })
        }
    }
}

fn interpret_completed(raw: &SandboxResult, mode: ExecutionMode) -> ExecutionOutcome {
    let stdout = match decode_field(raw.stdout.as_deref()) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "Sandbox stdout is not valid base64");
            return ExecutionOutcome::failure(
                mode,
                Verdict::MalformedOutput {
                    raw: raw.stdout.clone().unwrap_or_default(),
                },
            );
        }
    };

    let malformed = |stdout: &str| {
        warn!(mode = %mode, stdout = %stdout, "Harness output is not a JSON result line");
        ExecutionOutcome::failure(
            mode,
            Verdict::MalformedOutput {
                raw: stdout.to_string(),
            },
        )
    };

    match mode {
        ExecutionMode::Run => match parse_report::<TestResult>(&stdout) {
            Some(result) => {
                let verdict = if result.passed {
                    Verdict::Passed
                } else {
                    Verdict::Failed {
                        first_failure: Some(result.clone()),
                    }
                };
                ExecutionOutcome {
                    operation: mode,
                    success: result.passed,
                    results: Some(OutcomeResults::Single(result)),
                    verdict,
                }
            }
            None => malformed(&stdout),
        },
        ExecutionMode::Submit => match parse_report::<SuiteReport>(&stdout) {
            Some(report) => {
                let verdict = if report.all_passed {
                    Verdict::Passed
                } else {
                    Verdict::Failed {
                        first_failure: report.first_failure().cloned(),
                    }
                };
                ExecutionOutcome {
                    operation: mode,
                    success: report.all_passed,
                    results: Some(OutcomeResults::Suite(report)),
                    verdict,
                }
            }
            None => malformed(&stdout),
        },
    }
}

/// Outcome for an execution that never produced a sandbox result
pub fn outcome_from_error(error: &ExecutionError, mode: ExecutionMode) -> ExecutionOutcome {
    let verdict = match error {
        ExecutionError::RateLimited => Verdict::RateLimited,
        ExecutionError::Timeout { attempts } => Verdict::TimedOut { attempts: *attempts },
        ExecutionError::Transport(message) | ExecutionError::Configuration(message) => {
            Verdict::TransportFailure {
                message: message.clone(),
            }
        }
        ExecutionError::Validation(message) => Verdict::InvalidRequest {
            message: message.clone(),
        },
    };
    ExecutionOutcome::failure(mode, verdict)
}
