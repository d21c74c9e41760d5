/// Harness Generator - wraps user source in a self-contained test driver
///
/// **Contract:**
/// `generate(problem, source, language, mode, test_cases) -> program text`
///
/// The emitted program runs the user's entry point against the embedded test
/// case(s), catches per-case exceptions, and prints exactly one JSON line as the
/// last line of stdout:
/// - run mode: `{input, output, expected, passed}` or `{input, expected, error, passed:false}`
/// - submit mode: `{allPassed, results}`, stopping at the first failing case
///
/// Knows nothing about the sandbox transport or how results are classified.
mod cpp;
mod java;
mod javascript;
mod python;
pub mod registry;

use clash_common::types::{ExecutionMode, Language, TestCase};
use handlebars::Handlebars;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

pub use registry::{Comparison, Param, ProblemRegistry, ProblemSpec, TypedValue, ValueKind};

#[derive(Debug, Error, PartialEq)]
pub enum HarnessError {
    #[error("no harness is registered for problem '{0}'")]
    UnknownProblem(String),
    #[error("problem '{0}' has no test cases")]
    NoTestCases(String),
    #[error("problem '{key}' cannot be registered: {reason}")]
    InvalidProblem { key: String, reason: String },
    #[error("failed to render harness: {0}")]
    Template(String),
}

/// One test case after input normalization
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedCase {
    /// Canonical `{param: value}` object, echoed back in results
    pub input: Value,
    pub args: Vec<TypedValue>,
    pub expected: TypedValue,
}

impl PreparedCase {
    fn to_json(&self) -> Value {
        json!({
            "input": self.input,
            "args": self.args.iter().map(TypedValue::to_json).collect::<Vec<_>>(),
            "expected": self.expected.to_json(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct HarnessGenerator {
    registry: ProblemRegistry,
}

impl HarnessGenerator {
    pub fn new(registry: ProblemRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProblemRegistry {
        &self.registry
    }

    /// Normalize test cases for a problem. Run mode keeps only the first case.
    pub fn prepare(
        &self,
        problem_key: &str,
        mode: ExecutionMode,
        test_cases: &[TestCase],
    ) -> Result<(&ProblemSpec, Vec<PreparedCase>), HarnessError> {
        let problem = self
            .registry
            .get(problem_key)
            .ok_or_else(|| HarnessError::UnknownProblem(problem_key.to_string()))?;

        if test_cases.is_empty() {
            return Err(HarnessError::NoTestCases(problem_key.to_string()));
        }

        let selected = match mode {
            ExecutionMode::Run => &test_cases[..1],
            ExecutionMode::Submit => test_cases,
        };

        let cases = selected
            .iter()
            .map(|tc| {
                let args = problem.build_args(&tc.input);
                PreparedCase {
                    input: problem.canonical_input(&args),
                    args,
                    expected: problem.coerce_expected(&tc.expected),
                }
            })
            .collect();

        Ok((problem, cases))
    }

    pub fn generate(
        &self,
        problem_key: &str,
        source: &str,
        language: Language,
        mode: ExecutionMode,
        test_cases: &[TestCase],
    ) -> Result<String, HarnessError> {
        let (problem, cases) = self.prepare(problem_key, mode, test_cases)?;

        tracing::debug!(
            problem = problem_key,
            language = %language,
            mode = %mode,
            cases = cases.len(),
            "Generating harness"
        );

        match language {
            Language::JavaScript => javascript::render(problem, source, &cases, mode),
            Language::Python => python::render(problem, source, &cases, mode),
            Language::Cpp => cpp::render(problem, source, &cases, mode),
            Language::Java => java::render(problem, source, &cases, mode),
        }
    }
}

/// Fill a driver template in a single pass. Substituted values are never
/// re-scanned, so test data that looks like template syntax stays intact.
fn render_template<T: Serialize>(template: &str, data: &T) -> Result<String, HarnessError> {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(true);
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars
        .render_template(template, data)
        .map_err(|e| HarnessError::Template(e.to_string()))
}

/// Embedded case data for the dynamic-language drivers
fn cases_payload(cases: &[PreparedCase]) -> Value {
    Value::Array(cases.iter().map(PreparedCase::to_json).collect())
}

/// A JSON string literal; also a valid JavaScript and Python string literal.
fn json_string_literal(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

/// Integer literal for 32-bit typed targets
fn int32_literal(n: i64) -> String {
    n.clamp(i64::from(i32::MIN), i64::from(i32::MAX)).to_string()
}
