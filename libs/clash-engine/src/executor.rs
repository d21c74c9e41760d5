/// Execution Orchestrator - High-Level Coordination
///
/// **Responsibility:**
/// Drive one execution request through the pipeline and back to the user.
///
/// **Architecture:**
/// 1. Guard: re-entrancy, missing test cases, minimum interval between runs
/// 2. Build the harness program (harness/)
/// 3. Submit it to the sandbox (engine.rs)
/// 4. Classify the raw result (evaluator.rs)
/// 5. Publish session state and exactly one notice
///
/// This module is the glue layer - it knows nothing about:
/// - How programs are assembled (harness's job)
/// - How the sandbox is reached (engine's job)
/// - How outputs are classified (evaluator's job)

use crate::engine::Sandbox;
use crate::error::ExecutionError;
use crate::evaluator::{interpret, outcome_from_error};
use crate::harness::HarnessGenerator;
use crate::notify::{notice_for, Notice, Notifier};
use clash_common::types::{ExecutionMode, ExecutionOutcome, Language, Question};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Timing rules for the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionPolicy {
    /// Minimum time between the starts of two executions
    pub min_interval: Duration,
    /// How long `current_operation` outlives `is_executing`
    pub cooldown: Duration,
    pub celebration: Duration,
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(2000),
            cooldown: Duration::from_millis(1000),
            celebration: Duration::from_secs(3),
        }
    }
}

/// Observable session state. Idle, Running and Cooldown are:
/// `(false, None)`, `(true, Some(mode))`, `(false, Some(mode))`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub is_executing: bool,
    pub current_operation: Option<ExecutionMode>,
    pub last_execution: Option<Instant>,
    pub last_result: Option<ExecutionOutcome>,
}

impl SessionState {
    pub fn is_busy(&self) -> bool {
        self.is_executing || self.current_operation.is_some()
    }
}

/// Returns the session to Idle however the execution ends: completion, error,
/// panic, or the caller dropping the future.
struct ExecutionGuard {
    state: Arc<watch::Sender<SessionState>>,
    cooldown: Duration,
}

impl Drop for ExecutionGuard {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.is_executing = false);

        let state = self.state.clone();
        let cooldown = self.cooldown;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(cooldown).await;
                    state.send_modify(|s| s.current_operation = None);
                });
            }
            Err(_) => state.send_modify(|s| s.current_operation = None),
        }
    }
}

enum Admission {
    Granted,
    Busy,
    Throttled(Duration),
}

pub struct ExecutionOrchestrator<S, N> {
    sandbox: S,
    notifier: N,
    harness: HarnessGenerator,
    policy: ExecutionPolicy,
    state: Arc<watch::Sender<SessionState>>,
}

impl<S: Sandbox, N: Notifier> ExecutionOrchestrator<S, N> {
    pub fn new(sandbox: S, notifier: N, harness: HarnessGenerator) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            sandbox,
            notifier,
            harness,
            policy: ExecutionPolicy::default(),
            state: Arc::new(state),
        }
    }

    pub fn with_policy(mut self, policy: ExecutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Snapshot of the current session state
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Follow state changes (for UI binding)
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Execute `code` against the question's test cases.
    ///
    /// Returns `None` when the request is refused (already running, no test cases,
    /// too soon after the previous run). Every other path yields an outcome and
    /// exactly one notice.
    pub async fn execute(
        &self,
        mode: ExecutionMode,
        code: &str,
        language: Language,
        question: Option<&Question>,
    ) -> Option<ExecutionOutcome> {
        if self.state.borrow().is_busy() {
            debug!(mode = %mode, "Execution already in progress; ignoring request");
            return None;
        }

        let Some(question) = question.filter(|q| !q.test_cases.is_empty()) else {
            self.notifier.notify(Notice::no_test_cases());
            return None;
        };

        let guard = match self.admit(mode) {
            Admission::Granted => ExecutionGuard {
                state: self.state.clone(),
                cooldown: self.policy.cooldown,
            },
            Admission::Busy => return None,
            Admission::Throttled(remaining) => {
                debug!(remaining_ms = remaining.as_millis() as u64, "Execution throttled");
                self.notifier.notify(Notice::please_wait(remaining));
                return None;
            }
        };

        let execution_id = Uuid::new_v4();
        let span = info_span!(
            "execution",
            execution_id = %execution_id,
            mode = %mode,
            language = %language,
            question = %question.id
        );
        let outcome = self.run_pipeline(mode, code, language, question).instrument(span).await;

        self.state.send_modify(|s| s.last_result = Some(outcome.clone()));
        drop(guard);

        info!(
            execution_id = %execution_id,
            success = outcome.success,
            verdict = ?outcome.verdict,
            "Execution finished"
        );

        self.notifier.notify(notice_for(&outcome));
        if mode == ExecutionMode::Submit && outcome.success {
            self.notifier.celebrate(self.policy.celebration).await;
        }

        Some(outcome)
    }

    /// Atomically check the busy flag and rate limit, then enter Running.
    fn admit(&self, mode: ExecutionMode) -> Admission {
        let now = Instant::now();
        let min_interval = self.policy.min_interval;
        let mut admission = Admission::Busy;

        self.state.send_if_modified(|state| {
            if state.is_busy() {
                return false;
            }
            if let Some(last) = state.last_execution {
                let elapsed = now.saturating_duration_since(last);
                if elapsed < min_interval {
                    admission = Admission::Throttled(min_interval - elapsed);
                    return false;
                }
            }
            state.is_executing = true;
            state.current_operation = Some(mode);
            state.last_execution = Some(now);
            admission = Admission::Granted;
            true
        });

        admission
    }

    async fn run_pipeline(
        &self,
        mode: ExecutionMode,
        code: &str,
        language: Language,
        question: &Question,
    ) -> ExecutionOutcome {
        let problem_key = question.problem_key();
        let program = match self
            .harness
            .generate(&problem_key, code, language, mode, &question.test_cases)
        {
            Ok(program) => program,
            Err(e) => {
                warn!(problem = %problem_key, error = %e, "Could not build harness");
                return outcome_from_error(&ExecutionError::from(e), mode);
            }
        };

        match self.sandbox.submit(&program, language.sandbox_id()).await {
            Ok(raw) => interpret(&raw, mode),
            Err(e) => {
                warn!(error = %e, "Sandbox submission failed");
                outcome_from_error(&e, mode)
            }
        }
    }
}
