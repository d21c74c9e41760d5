//! Remote execution pipeline: harness generation, sandbox submission,
//! result interpretation and session orchestration.

pub mod engine;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod harness;
pub mod notify;

mod engine_tests;

pub use engine::{Judge0Client, Sandbox};
pub use error::ExecutionError;
pub use executor::{ExecutionOrchestrator, ExecutionPolicy, SessionState};
pub use harness::HarnessGenerator;
pub use notify::{Notice, NoticeLevel, Notifier};
