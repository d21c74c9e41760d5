use super::{cases_payload, json_string_literal, render_template, Comparison, HarnessError, PreparedCase, ProblemSpec};
use clash_common::types::ExecutionMode;
use serde_json::json;

const DRIVER: &str = r#"
;(() => {
  const cases = JSON.parse({{cases}});
  const resolveEntry = () => {
    if (typeof {{entry}} === "function") return {{entry}};
    if (typeof Solution === "function") {
      const solution = new Solution();
      if (typeof solution.{{entry}} === "function") return solution.{{entry}}.bind(solution);
    }
    throw new Error("{{entry}} is not defined");
  };
  const sorted = (xs) => [...xs].sort((a, b) => a - b);
  const same = (a, b) => JSON.stringify(a) === JSON.stringify(b);
  const runCase = (tc) => {
    try {
      const args = tc.args;
      const returned = resolveEntry()(...args);
      const output = {{output}};
      const passed = {{check}};
      return { input: tc.input, output, expected: tc.expected, passed };
    } catch (err) {
      const error = String(err && err.message ? err.message : err);
      return { input: tc.input, expected: tc.expected, error, passed: false };
    }
  };
{{main}}
})();
"#;

const RUN_MAIN: &str = r#"  console.log(JSON.stringify(runCase(cases[0])));"#;

const SUBMIT_MAIN: &str = r#"  const results = [];
  let allPassed = true;
  for (const tc of cases) {
    const result = runCase(tc);
    results.push(result);
    if (!result.passed) {
      allPassed = false;
      break;
    }
  }
  console.log(JSON.stringify({ allPassed, results }));"#;

pub(super) fn render(
    problem: &ProblemSpec,
    source: &str,
    cases: &[PreparedCase],
    mode: ExecutionMode,
) -> Result<String, HarnessError> {
    let (output, check) = match problem.comparison {
        Comparison::Exact => ("returned".to_string(), "same(output, tc.expected)"),
        Comparison::SortedArray => (
            "returned".to_string(),
            "Array.isArray(output) && same(sorted(output), sorted(tc.expected))",
        ),
        Comparison::MutatedArg(index) => (format!("args[{}]", index), "same(output, tc.expected)"),
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

    Ok(format!("{}\n{}", source, driver))
}
