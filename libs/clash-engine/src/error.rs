use crate::harness::HarnessError;
use thiserror::Error;

/// Failures that stop an execution before the sandbox reports a result
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("sandbox is not configured: {0}")]
    Configuration(String),
    #[error("{0}")]
    Validation(String),
    #[error("the execution service is rate limiting requests")]
    RateLimited,
    #[error("execution did not finish after {attempts} status checks")]
    Timeout { attempts: u32 },
    #[error("execution service unavailable: {0}")]
    Transport(String),
}

impl From<HarnessError> for ExecutionError {
    fn from(err: HarnessError) -> Self {
        ExecutionError::Validation(err.to_string())
    }
}
