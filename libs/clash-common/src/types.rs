use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Target runtime for a submission.
///
/// Each language maps to exactly one sandbox language id. The table is static and
/// never changes at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    Python,
    Cpp,
    Java,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::JavaScript,
        Language::Python,
        Language::Cpp,
        Language::Java,
    ];

    /// Sandbox image selector (JavaScript Node.js 12, Python 3.8, C++ GCC 9, Java OpenJDK 13)
    pub const fn sandbox_id(self) -> u32 {
        match self {
            Language::JavaScript => 63,
            Language::Python => 71,
            Language::Cpp => 54,
            Language::Java => 62,
        }
    }

    pub fn from_sandbox_id(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|lang| lang.sandbox_id() == id)
    }

    pub fn file_extension(self) -> &'static str {
        match self {
            Language::JavaScript => "js",
            Language::Python => "py",
            Language::Cpp => "cpp",
            Language::Java => "java",
        }
    }

    /// Guess the language of a source file from its extension
    pub fn from_file_extension(ext: &str) -> Option<Self> {
        let ext = match ext.to_ascii_lowercase().as_str() {
            "mjs" | "cjs" => "js".to_string(),
            "cc" | "cxx" => "cpp".to_string(),
            other => other.to_string(),
        };
        Self::ALL.into_iter().find(|lang| lang.file_extension() == ext)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Cpp => "cpp",
            Language::Java => "java",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "javascript" | "js" | "node" => Ok(Language::JavaScript),
            "python" | "py" | "python3" => Ok(Language::Python),
            "cpp" | "c++" | "cxx" => Ok(Language::Cpp),
            "java" => Ok(Language::Java),
            other => Err(format!(
                "unsupported language '{}' (expected javascript, python, cpp or java)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// First test case only, for quick feedback
    Run,
    /// Every test case, stopping at the first failure
    Submit,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Run => write!(f, "run"),
            ExecutionMode::Submit => write!(f, "submit"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: Value,
    #[serde(alias = "output", alias = "expected_output", default)]
    pub expected: Value,
}

/// A coding problem as stored by the persistence layer. Read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, alias = "testCases")]
    pub test_cases: Vec<TestCase>,
}

impl Question {
    /// Key used to look the problem up in the harness registry
    pub fn problem_key(&self) -> String {
        match self.slug.as_deref() {
            Some(slug) if !slug.trim().is_empty() => slugify(slug),
            _ => slugify(&self.title),
        }
    }
}

/// Lowercase alphanumerics, every other run of characters collapsed to a single `-`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Opaque handle returned by the sandbox; consumed by exactly one fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxSubmission {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxStatus {
    pub id: u32,
    #[serde(default)]
    pub description: String,
}

/// Raw sandbox response. Payload fields are base64 encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub status: SandboxStatus,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub compile_output: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub input: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default)]
    pub expected: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteReport {
    #[serde(rename = "allPassed")]
    pub all_passed: bool,
    #[serde(default)]
    pub results: Vec<TestResult>,
}

impl SuiteReport {
    pub fn first_failure(&self) -> Option<&TestResult> {
        self.results.iter().find(|r| !r.passed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutcomeResults {
    Suite(SuiteReport),
    Single(TestResult),
}

/// Classification of a finished (or refused) execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Verdict {
    Passed,
    Failed { first_failure: Option<TestResult> },
    CompileError { message: String },
    RuntimeError { message: String },
    RateLimited,
    TimedOut { attempts: u32 },
    TransportFailure { message: String },
    MalformedOutput { raw: String },
    InvalidRequest { message: String },
    Unexpected { status_id: u32, description: String },
}

/// Normalized result of one execution request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub operation: ExecutionMode,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<OutcomeResults>,
    pub verdict: Verdict,
}

impl ExecutionOutcome {
    pub fn failure(operation: ExecutionMode, verdict: Verdict) -> Self {
        Self {
            operation,
            success: false,
            results: None,
            verdict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sandbox_ids_are_unique_and_invertible() {
        for lang in Language::ALL {
            assert_eq!(Language::from_sandbox_id(lang.sandbox_id()), Some(lang));
        }
        assert_eq!(Language::from_sandbox_id(1), None);
    }

    #[test]
    fn test_language_from_file_extension() {
        for lang in Language::ALL {
            assert_eq!(Language::from_file_extension(lang.file_extension()), Some(lang));
        }
        assert_eq!(Language::from_file_extension("CC"), Some(Language::Cpp));
        assert_eq!(Language::from_file_extension("mjs"), Some(Language::JavaScript));
        assert_eq!(Language::from_file_extension("rs"), None);
    }

    #[test]
    fn test_language_parsing() {
        assert_eq!("Python".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("c++".parse::<Language>().unwrap(), Language::Cpp);
        assert_eq!("node".parse::<Language>().unwrap(), Language::JavaScript);
        assert!("cobol".parse::<Language>().is_err());
    }

    #[test]
    fn test_problem_key_prefers_slug() {
        let mut question = Question {
            id: "42".to_string(),
            title: "Two Sum".to_string(),
            description: String::new(),
            difficulty: "easy".to_string(),
            category: "arrays".to_string(),
            slug: None,
            test_cases: vec![],
        };
        assert_eq!(question.problem_key(), "two-sum");

        question.slug = Some("Valid Parentheses".to_string());
        assert_eq!(question.problem_key(), "valid-parentheses");
    }

    #[test]
    fn test_slugify_collapses_punctuation() {
        assert_eq!(slugify("  Best Time to Buy & Sell Stock!! "), "best-time-to-buy-sell-stock");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_question_accepts_stored_row_shapes() {
        let row = json!({
            "id": "q1",
            "title": "Two Sum",
            "testCases": [
                { "input": { "nums": [2, 7, 11, 15], "target": 9 }, "output": [0, 1] },
                { "input": [3, 2, 4], "expected_output": [1, 2] }
            ]
        });
        let question: Question = serde_json::from_value(row).unwrap();
        assert_eq!(question.test_cases.len(), 2);
        assert_eq!(question.test_cases[0].expected, json!([0, 1]));
        assert_eq!(question.test_cases[1].expected, json!([1, 2]));
    }

    #[test]
    fn test_suite_report_wire_names() {
        let report: SuiteReport = serde_json::from_value(json!({
            "allPassed": false,
            "results": [
                { "input": {"s": "()"}, "output": true, "expected": true, "passed": true },
                { "input": {"s": "(]"}, "output": true, "expected": false, "passed": false }
            ]
        }))
        .unwrap();
        assert!(!report.all_passed);
        assert_eq!(report.first_failure().unwrap().input, json!({"s": "(]"}));
    }
}
