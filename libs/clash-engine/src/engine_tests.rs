/// Tests for the sandbox client and the full remote pipeline
///
/// `sandbox_client_tests` run against an in-process stub speaking the
/// sandbox's HTTP dialect:
/// 1. Blocking submission (wait=true)
/// 2. Token polling through queued/processing states
/// 3. 429 and other error statuses
/// 4. Poll budget exhaustion
///
/// `live_sandbox_tests` need a reachable sandbox (SANDBOX_URL, optionally
/// SANDBOX_API_KEY) and are ignored by default.

#[cfg(test)]
mod sandbox_client_tests {
    use crate::engine::{Judge0Client, Sandbox};
    use crate::error::ExecutionError;
    use axum::extract::{Path, Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use base64::{engine::general_purpose, Engine as _};
    use clash_common::config::{SandboxConfig, SubmissionStrategy};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct Stub {
        final_result: Value,
        /// GETs answered with "Processing" before the final result
        busy_polls: usize,
        rate_limited: bool,
        broken: bool,
        bodies: Mutex<Vec<Value>>,
        queries: Mutex<Vec<HashMap<String, String>>>,
        api_keys: Mutex<Vec<Option<String>>>,
        polls: AtomicUsize,
    }

    async fn post_submission(
        State(stub): State<Arc<Stub>>,
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Response {
        stub.bodies.lock().unwrap().push(body);
        stub.api_keys.lock().unwrap().push(
            headers
                .get("x-rapidapi-key")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        );
        let wait = query.get("wait").map(String::as_str) == Some("true");
        stub.queries.lock().unwrap().push(query);

        if stub.rate_limited {
            return (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({"status": {"id": 429, "description": "Too Many Requests"}})),
            )
                .into_response();
        }
        if stub.broken {
            return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
        }
        if wait {
            Json(stub.final_result.clone()).into_response()
        } else {
            (StatusCode::CREATED, Json(json!({"token": "tok-1"}))).into_response()
        }
    }

    async fn get_submission(State(stub): State<Arc<Stub>>, Path(token): Path<String>) -> Json<Value> {
        let poll = stub.polls.fetch_add(1, Ordering::SeqCst) + 1;
        if poll <= stub.busy_polls {
            let (id, description) = if poll == 1 { (1, "In Queue") } else { (2, "Processing") };
            return Json(json!({"token": token, "status": {"id": id, "description": description}}));
        }
        Json(stub.final_result.clone())
    }

    async fn serve(stub: Stub) -> (String, Arc<Stub>) {
        let stub = Arc::new(stub);
        let app = Router::new()
            .route("/submissions", post(post_submission))
            .route("/submissions/:token", get(get_submission))
            .with_state(stub.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), stub)
    }

    fn accepted(stdout: &str) -> Value {
        json!({
            "token": "tok-1",
            "status": {"id": 3, "description": "Accepted"},
            "stdout": general_purpose::STANDARD.encode(stdout),
            "stderr": null,
            "compile_output": null,
            "message": null,
            "time": "0.012",
            "memory": 3400
        })
    }

    fn client(base_url: String, strategy: SubmissionStrategy) -> Judge0Client {
        Judge0Client::new(SandboxConfig {
            base_url,
            strategy,
            ..SandboxConfig::default()
        })
        .unwrap()
    }

    fn polling(max_attempts: u32) -> SubmissionStrategy {
        SubmissionStrategy::Poll {
            interval: Duration::from_millis(10),
            max_attempts,
        }
    }

    #[tokio::test]
    async fn test_wait_strategy_sends_encoded_program() {
        let (url, stub) = serve(Stub {
            final_result: accepted("hello\n"),
            ..Stub::default()
        })
        .await;

        let result = client(url, SubmissionStrategy::Wait)
            .submit("print('hello')", 71)
            .await
            .unwrap();

        assert_eq!(result.status.id, 3);
        assert_eq!(result.stdout.as_deref(), Some(general_purpose::STANDARD.encode("hello\n").as_str()));

        let bodies = stub.bodies.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["language_id"], 71);
        assert_eq!(bodies[0]["source_code"], general_purpose::STANDARD.encode("print('hello')"));
        assert_eq!(bodies[0]["stdin"], "");

        let queries = stub.queries.lock().unwrap();
        assert_eq!(queries[0].get("base64_encoded").map(String::as_str), Some("true"));
        assert_eq!(queries[0].get("wait").map(String::as_str), Some("true"));

        // no key configured, no credential headers
        assert_eq!(stub.api_keys.lock().unwrap()[0], None);
        assert_eq!(stub.polls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_api_key_is_forwarded() {
        let (url, stub) = serve(Stub {
            final_result: accepted(""),
            ..Stub::default()
        })
        .await;

        let client = Judge0Client::new(SandboxConfig {
            base_url: url,
            api_key: Some("secret".to_string()),
            ..SandboxConfig::default()
        })
        .unwrap();
        client.submit("1", 63).await.unwrap();

        assert_eq!(stub.api_keys.lock().unwrap()[0].as_deref(), Some("secret"));
    }

    #[tokio::test]
    async fn test_poll_strategy_waits_out_processing() {
        let (url, stub) = serve(Stub {
            final_result: accepted("{}"),
            busy_polls: 2,
            ..Stub::default()
        })
        .await;

        let result = client(url, polling(5)).submit("int main() {}", 54).await.unwrap();

        assert_eq!(result.status.id, 3);
        assert_eq!(stub.polls.load(Ordering::SeqCst), 3);
        let queries = stub.queries.lock().unwrap();
        assert_eq!(queries[0].get("wait").map(String::as_str), Some("false"));
    }

    #[tokio::test]
    async fn test_poll_budget_exhausted() {
        let (url, stub) = serve(Stub {
            final_result: accepted(""),
            busy_polls: usize::MAX,
            ..Stub::default()
        })
        .await;

        let err = client(url, polling(3)).submit("x", 71).await.unwrap_err();

        assert_eq!(err, ExecutionError::Timeout { attempts: 3 });
        assert_eq!(stub.polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_too_many_requests_is_rate_limited() {
        let (url, _stub) = serve(Stub {
            rate_limited: true,
            ..Stub::default()
        })
        .await;

        for strategy in [SubmissionStrategy::Wait, polling(3)] {
            let err = client(url.clone(), strategy).submit("x", 62).await.unwrap_err();
            assert_eq!(err, ExecutionError::RateLimited);
        }
    }

    #[tokio::test]
    async fn test_server_error_is_transport_failure() {
        let (url, _stub) = serve(Stub {
            broken: true,
            ..Stub::default()
        })
        .await;

        match client(url, SubmissionStrategy::Wait).submit("x", 71).await {
            Err(ExecutionError::Transport(message)) => {
                assert!(message.contains("500"));
                assert!(message.contains("upstream exploded"));
            }
            other => panic!("expected transport failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_sandbox_is_transport_failure() {
        // bind and drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(format!("http://{}", addr), SubmissionStrategy::Wait)
            .submit("x", 71)
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Transport(_)));
    }

    #[tokio::test]
    async fn test_oversized_program_never_sent() {
        let (url, stub) = serve(Stub::default()).await;

        let program = "a".repeat(1024 * 1024 + 1);
        let err = client(url, SubmissionStrategy::Wait).submit(&program, 71).await.unwrap_err();

        assert!(matches!(err, ExecutionError::Validation(_)));
        assert!(stub.bodies.lock().unwrap().is_empty());
    }
}

#[cfg(test)]
mod live_sandbox_tests {
    use crate::engine::{Judge0Client, Sandbox};
    use crate::evaluator::interpret;
    use crate::harness::HarnessGenerator;
    use clash_common::config::SandboxConfig;
    use clash_common::types::{ExecutionMode, Language, OutcomeResults, TestCase, Verdict};
    use serde_json::json;

    fn live_client() -> Judge0Client {
        Judge0Client::new(SandboxConfig::from_env().expect("invalid sandbox configuration"))
            .expect("Failed to build sandbox client")
    }

    fn two_sum_cases() -> Vec<TestCase> {
        vec![
            TestCase { input: json!({"nums": [2, 7, 11, 15], "target": 9}), expected: json!([0, 1]) },
            TestCase { input: json!({"nums": [3, 2, 4], "target": 6}), expected: json!([1, 2]) },
            TestCase { input: json!({"nums": [3, 3], "target": 6}), expected: json!([0, 1]) },
        ]
    }

    const TWO_SUM_JS: &str = r#"
function twoSum(nums, target) {
  const seen = new Map();
  for (let i = 0; i < nums.length; i++) {
    if (seen.has(target - nums[i])) return [seen.get(target - nums[i]), i];
    seen.set(nums[i], i);
  }
  return [];
}
"#;

    const TWO_SUM_PY: &str = r#"
class Solution:
    def twoSum(self, nums: List[int], target: int) -> List[int]:
        seen = {}
        for i, n in enumerate(nums):
            if target - n in seen:
                return [seen[target - n], i]
            seen[n] = i
        return []
"#;

    const TWO_SUM_CPP: &str = r#"
class Solution {
public:
    vector<int> twoSum(vector<int>& nums, int target) {
        unordered_map<int, int> seen;
        for (int i = 0; i < (int)nums.size(); i++) {
            auto it = seen.find(target - nums[i]);
            if (it != seen.end()) return {it->second, i};
            seen[nums[i]] = i;
        }
        return {};
    }
};
"#;

    const TWO_SUM_JAVA: &str = r#"
import java.util.*;

public class Solution {
    public int[] twoSum(int[] nums, int target) {
        Map<Integer, Integer> seen = new HashMap<>();
        for (int i = 0; i < nums.length; i++) {
            Integer j = seen.get(target - nums[i]);
            if (j != null) return new int[] { j, i };
            seen.put(nums[i], i);
        }
        return new int[0];
    }
}
"#;

    /// Test: the same algorithm passes in every supported language
    #[tokio::test]
    #[ignore] // Requires a reachable sandbox
    async fn test_two_sum_submit_all_languages() {
        let generator = HarnessGenerator::default();
        let client = live_client();

        for (language, source) in [
            (Language::JavaScript, TWO_SUM_JS),
            (Language::Python, TWO_SUM_PY),
            (Language::Cpp, TWO_SUM_CPP),
            (Language::Java, TWO_SUM_JAVA),
        ] {
            let program = generator
                .generate("two-sum", source, language, ExecutionMode::Submit, &two_sum_cases())
                .unwrap();
            let raw = client.submit(&program, language.sandbox_id()).await.unwrap();
            let outcome = interpret(&raw, ExecutionMode::Submit);

            assert!(outcome.success, "{} failed: {:?}", language, outcome.verdict);
            match outcome.results {
                Some(OutcomeResults::Suite(report)) => assert_eq!(report.results.len(), 3),
                other => panic!("expected a suite report, got {:?}", other),
            }
        }
    }

    /// Test: a wrong answer stops the suite at the first failing case
    #[tokio::test]
    #[ignore] // Requires a reachable sandbox
    async fn test_valid_parentheses_wrong_answer() {
        let source = "def isValid(s: str) -> bool:\n    return len(s) % 2 == 0\n";
        let cases = vec![
            TestCase { input: json!({"s": "()"}), expected: json!(true) },
            TestCase { input: json!({"s": "(]"}), expected: json!(false) },
            TestCase { input: json!({"s": "([)]"}), expected: json!(false) },
        ];

        let program = HarnessGenerator::default()
            .generate("valid-parentheses", source, Language::Python, ExecutionMode::Submit, &cases)
            .unwrap();
        let raw = live_client().submit(&program, Language::Python.sandbox_id()).await.unwrap();
        let outcome = interpret(&raw, ExecutionMode::Submit);

        assert!(!outcome.success);
        match &outcome.verdict {
            Verdict::Failed { first_failure: Some(failure) } => {
                assert_eq!(failure.input, json!({"s": "(]"}));
                assert_eq!(failure.expected, json!(false));
            }
            other => panic!("expected a failed verdict, got {:?}", other),
        }
        match outcome.results {
            Some(OutcomeResults::Suite(report)) => assert_eq!(report.results.len(), 2),
            other => panic!("expected a suite report, got {:?}", other),
        }
    }

    const VALID_PARENS_JS: &str = r#"
function isValid(s) {
  const pairs = { ')': '(', ']': '[', '}': '{' };
  const stack = [];
  for (const c of s) {
    if (pairs[c]) {
      if (stack.pop() !== pairs[c]) return false;
    } else {
      stack.push(c);
    }
  }
  return stack.length === 0;
}
"#;

    const VALID_PARENS_PY: &str = r#"
class Solution:
    def isValid(self, s: str) -> bool:
        pairs = {")": "(", "]": "[", "}": "{"}
        stack = []
        for c in s:
            if c in pairs:
                if not stack or stack.pop() != pairs[c]:
                    return False
            else:
                stack.append(c)
        return not stack
"#;

    const VALID_PARENS_CPP: &str = r#"
class Solution {
public:
    bool isValid(string s) {
        stack<char> open;
        for (char c : s) {
            if (c == '(' || c == '[' || c == '{') {
                open.push(c);
                continue;
            }
            if (open.empty()) return false;
            char top = open.top();
            open.pop();
            if ((c == ')' && top != '(') || (c == ']' && top != '[') || (c == '}' && top != '{')) return false;
        }
        return open.empty();
    }
};
"#;

    const VALID_PARENS_JAVA: &str = r#"
import java.util.*;

public class Solution {
    public boolean isValid(String s) {
        Deque<Character> open = new ArrayDeque<>();
        for (char c : s.toCharArray()) {
            if (c == '(' || c == '[' || c == '{') {
                open.push(c);
                continue;
            }
            if (open.isEmpty()) return false;
            char top = open.pop();
            if ((c == ')' && top != '(') || (c == ']' && top != '[') || (c == '}' && top != '{')) return false;
        }
        return open.isEmpty();
    }
}
"#;

    fn valid_parens_sources() -> [(Language, &'static str); 4] {
        [
            (Language::JavaScript, VALID_PARENS_JS),
            (Language::Python, VALID_PARENS_PY),
            (Language::Cpp, VALID_PARENS_CPP),
            (Language::Java, VALID_PARENS_JAVA),
        ]
    }

    fn valid_parens_cases() -> Vec<TestCase> {
        vec![
            TestCase { input: json!({"s": "{}[]"}), expected: json!(true) },
            TestCase { input: json!({"s": "([)]"}), expected: json!(false) },
        ]
    }

    /// Test: braces in string inputs reach the solution untouched in every language
    #[tokio::test]
    #[ignore] // Requires a reachable sandbox
    async fn test_valid_parentheses_run_all_languages() {
        let generator = HarnessGenerator::default();
        let client = live_client();

        for (language, source) in valid_parens_sources() {
            let program = generator
                .generate("valid-parentheses", source, language, ExecutionMode::Run, &valid_parens_cases())
                .unwrap();
            let raw = client.submit(&program, language.sandbox_id()).await.unwrap();
            let outcome = interpret(&raw, ExecutionMode::Run);

            assert!(outcome.success, "{} failed: {:?}", language, outcome.verdict);
            match outcome.results {
                Some(OutcomeResults::Single(result)) => {
                    assert_eq!(result.input, json!({"s": "{}[]"}), "{}", language);
                    assert_eq!(result.output, Some(json!(true)), "{}", language);
                    assert!(result.passed);
                }
                other => panic!("{}: expected a single result, got {:?}", language, other),
            }
        }
    }

    /// Test: a correct solution reports true for "{}[]" and false for "([)]"
    #[tokio::test]
    #[ignore] // Requires a reachable sandbox
    async fn test_valid_parentheses_submit_all_languages() {
        let generator = HarnessGenerator::default();
        let client = live_client();

        for (language, source) in valid_parens_sources() {
            let program = generator
                .generate("valid-parentheses", source, language, ExecutionMode::Submit, &valid_parens_cases())
                .unwrap();
            let raw = client.submit(&program, language.sandbox_id()).await.unwrap();
            let outcome = interpret(&raw, ExecutionMode::Submit);

            assert!(outcome.success, "{} failed: {:?}", language, outcome.verdict);
            match outcome.results {
                Some(OutcomeResults::Suite(report)) => {
                    assert!(report.all_passed);
                    assert_eq!(report.results.len(), 2, "{}", language);
                    assert_eq!(report.results[0].input, json!({"s": "{}[]"}));
                    assert_eq!(report.results[0].output, Some(json!(true)));
                    assert_eq!(report.results[1].input, json!({"s": "([)]"}));
                    assert_eq!(report.results[1].output, Some(json!(false)));
                }
                other => panic!("{}: expected a suite report, got {:?}", language, other),
            }
        }
    }

    /// Test: submit stops right after the first failing case (k = 1 of 4)
    #[tokio::test]
    #[ignore] // Requires a reachable sandbox
    async fn test_submit_stops_after_first_failure() {
        let cases = vec![
            TestCase { input: json!({"s": "()"}), expected: json!(true) },
            // deliberately wrong expectation
            TestCase { input: json!({"s": "()[]{}"}), expected: json!(false) },
            TestCase { input: json!({"s": "(]"}), expected: json!(false) },
            TestCase { input: json!({"s": "{[]}"}), expected: json!(true) },
        ];
        let generator = HarnessGenerator::default();
        let client = live_client();

        for (language, source) in valid_parens_sources() {
            let program = generator
                .generate("valid-parentheses", source, language, ExecutionMode::Submit, &cases)
                .unwrap();
            let raw = client.submit(&program, language.sandbox_id()).await.unwrap();
            let outcome = interpret(&raw, ExecutionMode::Submit);

            assert!(!outcome.success, "{}", language);
            match &outcome.verdict {
                Verdict::Failed { first_failure: Some(failure) } => {
                    assert_eq!(failure.input, json!({"s": "()[]{}"}), "{}", language);
                }
                other => panic!("{}: expected a failed verdict, got {:?}", language, other),
            }
            match outcome.results {
                Some(OutcomeResults::Suite(report)) => {
                    assert!(!report.all_passed);
                    assert_eq!(report.results.len(), 2, "{}", language);
                    assert!(report.results[0].passed);
                    assert!(!report.results[1].passed);
                }
                other => panic!("{}: expected a suite report, got {:?}", language, other),
            }
        }
    }

    /// Test: compiler diagnostics come back verbatim
    #[tokio::test]
    #[ignore] // Requires a reachable sandbox
    async fn test_cpp_compile_error() {
        let source = "class Solution { public: vector<int> twoSum(vector<int>& nums, int target) { return {} } };";
        let program = HarnessGenerator::default()
            .generate("two-sum", source, Language::Cpp, ExecutionMode::Run, &two_sum_cases())
            .unwrap();
        let raw = live_client().submit(&program, Language::Cpp.sandbox_id()).await.unwrap();

        match interpret(&raw, ExecutionMode::Run).verdict {
            Verdict::CompileError { message } => assert!(message.contains("expected ';'")),
            other => panic!("expected a compile error, got {:?}", other),
        }
    }
}
