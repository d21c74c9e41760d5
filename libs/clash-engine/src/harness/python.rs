use super::{cases_payload, json_string_literal, render_template, Comparison, HarnessError, PreparedCase, ProblemSpec};
use clash_common::types::ExecutionMode;
use serde_json::json;

const PRELUDE: &str = "from typing import *\nimport json as _clash_json\n\n";

const DRIVER: &str = r#"

def _clash_entry():
    scope = globals()
    solution = scope.get("Solution")
    if solution is not None and hasattr(solution, "{{entry}}"):
        return getattr(solution(), "{{entry}}")
    if callable(scope.get("{{entry}}")):
        return scope["{{entry}}"]
    raise NameError("{{entry}} is not defined")


def _clash_same(a, b):
    # JSON text equality: True never equals 1, a tuple equals a list
    return _clash_json.dumps(a, sort_keys=True) == _clash_json.dumps(b, sort_keys=True)


def _clash_run_case(case):
    try:
        args = case["args"]
        returned = _clash_entry()(*args)
        output = {{output}}
        passed = bool({{check}})
        return {"input": case["input"], "output": output, "expected": case["expected"], "passed": passed}
    except Exception as exc:
        error = "%s: %s" % (type(exc).__name__, exc)
        return {"input": case["input"], "expected": case["expected"], "error": error, "passed": False}


_clash_cases = _clash_json.loads({{cases}})
{{main}}
"#;

const RUN_MAIN: &str = r#"print(_clash_json.dumps(_clash_run_case(_clash_cases[0]), default=str))"#;

const SUBMIT_MAIN: &str = r#"_clash_results = []
_clash_all_passed = True
for _clash_case in _clash_cases:
    _clash_result = _clash_run_case(_clash_case)
    _clash_results.append(_clash_result)
    if not _clash_result["passed"]:
        _clash_all_passed = False
        break
print(_clash_json.dumps({"allPassed": _clash_all_passed, "results": _clash_results}, default=str))"#;

/// `from __future__` imports must open the module, ahead of the prelude.
fn split_future_imports(source: &str) -> (String, String) {
    let mut future = String::new();
    let mut rest = String::with_capacity(source.len());
    for line in source.lines() {
        if line.starts_with("from __future__ import") {
            future.push_str(line);
            future.push('\n');
        } else {
            rest.push_str(line);
            rest.push('\n');
        }
    }
    (future, rest)
}

pub(super) fn render(
    problem: &ProblemSpec,
    source: &str,
    cases: &[PreparedCase],
    mode: ExecutionMode,
) -> Result<String, HarnessError> {
    let (output, check) = match problem.comparison {
        Comparison::Exact => ("returned".to_string(), r#"_clash_same(output, case["expected"])"#),
        Comparison::SortedArray => (
            "returned".to_string(),
            r#"isinstance(output, (list, tuple)) and _clash_same(sorted(output), sorted(case["expected"]))"#,
        ),
        Comparison::MutatedArg(index) => (format!("args[{}]", index), r#"_clash_same(output, case["expected"])"#),
    };
    let main = match mode {
        ExecutionMode::Run => RUN_MAIN,
        ExecutionMode::Submit => SUBMIT_MAIN,
    };

    let driver = render_template(
        DRIVER,
        &json!({
            "cases": json_string_literal(&cases_payload(cases).to_string()),
            "entry": problem.entry_point,
            "output": output,
            "check": check,
            "main": main,
        }),
    )?;

    let (future, body) = split_future_imports(source);
    Ok(format!("{}{}{}\n{}", future, PRELUDE, body, driver))
}
