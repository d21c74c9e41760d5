/// Sandbox Client - Remote Code Execution
///
/// **Core Responsibility:**
/// Submit a harness program to the remote sandbox and return its raw result.
///
/// **Critical Architectural Boundary:**
/// - Knows HOW to reach the sandbox (HTTP, base64, wait vs poll)
/// - Does NOT decode payload fields
/// - Does NOT classify outcomes
/// - Passes the sandbox's status id/description through untouched
///
/// The orchestrator depends on the `Sandbox` trait only, so the submission
/// strategy (or a test double) can be swapped without touching it.

use crate::error::ExecutionError;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use clash_common::config::{SandboxConfig, SubmissionStrategy};
use clash_common::types::{SandboxResult, SandboxSubmission};
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Programs larger than this never leave the client
const MAX_PROGRAM_BYTES: usize = 1024 * 1024;

/// Status ids the sandbox uses while a submission is queued or running
const STATUS_IN_QUEUE: u32 = 1;
const STATUS_PROCESSING: u32 = 2;

#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Run `program` with the sandbox image selected by `language_id`.
    async fn submit(&self, program: &str, language_id: u32) -> Result<SandboxResult, ExecutionError>;
}

/// Request body of `POST /submissions`
#[derive(Debug, Serialize)]
struct SubmissionRequest {
    source_code: String,
    language_id: u32,
    stdin: String,
    expected_output: String,
    cpu_time_limit: f64,
    memory_limit: u64,
}

/// HTTP client for a Judge0-compatible sandbox (directly or through the proxy)
pub struct Judge0Client {
    http: reqwest::Client,
    config: SandboxConfig,
}

impl Judge0Client {
    pub fn new(config: SandboxConfig) -> Result<Self, ExecutionError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ExecutionError::Configuration(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url, path);
        let mut builder = self.http.request(method, url);
        if let Some(key) = &self.config.api_key {
            builder = builder
                .header("X-RapidAPI-Key", key)
                .header("X-RapidAPI-Host", &self.config.api_host);
        }
        builder
    }

    fn submission_body(&self, program: &str, language_id: u32) -> SubmissionRequest {
        SubmissionRequest {
            source_code: general_purpose::STANDARD.encode(program),
            language_id,
            stdin: String::new(),
            expected_output: String::new(),
            cpu_time_limit: self.config.cpu_time_limit,
            memory_limit: self.config.memory_limit_kb,
        }
    }

    /// Send a request and map transport-level failures
    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, ExecutionError> {
        let response = builder
            .send()
            .await
            .map_err(|e| ExecutionError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("Sandbox responded 429 Too Many Requests");
                Err(ExecutionError::RateLimited)
            }
            status if status.is_success() => Ok(response),
            status => {
                let body = response.text().await.unwrap_or_default();
                let preview: String = body.chars().take(200).collect();
                Err(ExecutionError::Transport(format!("sandbox returned {}: {}", status, preview)))
            }
        }
    }

    async fn submit_and_wait(&self, program: &str, language_id: u32) -> Result<SandboxResult, ExecutionError> {
        let builder = self
            .request(reqwest::Method::POST, "/submissions?base64_encoded=true&wait=true")
            .json(&self.submission_body(program, language_id));

        let response = self.send(builder).await?;
        response
            .json::<SandboxResult>()
            .await
            .map_err(|e| ExecutionError::Transport(format!("unreadable sandbox response: {}", e)))
    }

    async fn submit_and_poll(
        &self,
        program: &str,
        language_id: u32,
        interval: std::time::Duration,
        max_attempts: u32,
    ) -> Result<SandboxResult, ExecutionError> {
        let builder = self
            .request(reqwest::Method::POST, "/submissions?base64_encoded=true&wait=false")
            .json(&self.submission_body(program, language_id));

        let submission: SandboxSubmission = self
            .send(builder)
            .await?
            .json()
            .await
            .map_err(|e| ExecutionError::Transport(format!("sandbox returned no token: {}", e)))?;

        debug!(token = %submission.token, "Submission accepted, polling for result");

        for attempt in 1..=max_attempts {
            tokio::time::sleep(interval).await;

            let path = format!("/submissions/{}?base64_encoded=true", submission.token);
            let result: SandboxResult = self
                .send(self.request(reqwest::Method::GET, &path))
                .await?
                .json()
                .await
                .map_err(|e| ExecutionError::Transport(format!("unreadable sandbox response: {}", e)))?;

            if matches!(result.status.id, STATUS_IN_QUEUE | STATUS_PROCESSING) {
                debug!(attempt, status = %result.status.description, "Submission still running");
                continue;
            }
            return Ok(result);
        }

        warn!(token = %submission.token, attempts = max_attempts, "Gave up polling for submission");
        Err(ExecutionError::Timeout { attempts: max_attempts })
    }
}

#[async_trait]
impl Sandbox for Judge0Client {
    async fn submit(&self, program: &str, language_id: u32) -> Result<SandboxResult, ExecutionError> {
        if program.len() > MAX_PROGRAM_BYTES {
            return Err(ExecutionError::Validation(format!(
                "program exceeds maximum size of {} bytes",
                MAX_PROGRAM_BYTES
            )));
        }

        info!(
            language_id,
            program_bytes = program.len(),
            strategy = ?self.config.strategy,
            "Submitting program to sandbox"
        );

        let result = match self.config.strategy {
            SubmissionStrategy::Wait => self.submit_and_wait(program, language_id).await?,
            SubmissionStrategy::Poll { interval, max_attempts } => {
                self.submit_and_poll(program, language_id, interval, max_attempts).await?
            }
        };

        info!(
            status_id = result.status.id,
            status = %result.status.description,
            "Sandbox finished"
        );
        Ok(result)
    }
}
