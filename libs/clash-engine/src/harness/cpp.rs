use super::{int32_literal, render_template, Comparison, HarnessError, PreparedCase, ProblemSpec, TypedValue, ValueKind};
use clash_common::types::ExecutionMode;
use serde_json::json;

const PRELUDE: &str = "#include <bits/stdc++.h>\nusing namespace std;\n\n";

const HELPERS: &str = r#"
namespace clash_harness {
std::string quote(const std::string& s) {
    std::string out = "\"";
    for (unsigned char c : s) {
        switch (c) {
            case '"': out += "\\\""; break;
            case '\\': out += "\\\\"; break;
            case '\n': out += "\\n"; break;
            case '\r': out += "\\r"; break;
            case '\t': out += "\\t"; break;
            default:
                if (c < 0x20) {
                    char buf[8];
                    std::snprintf(buf, sizeof(buf), "\\u%04x", c);
                    out += buf;
                } else {
                    out += static_cast<char>(c);
                }
        }
    }
    return out + "\"";
}
std::string to_json(int v) { return std::to_string(v); }
std::string to_json(long long v) { return std::to_string(v); }
std::string to_json(bool v) { return v ? "true" : "false"; }
std::string to_json(const std::string& v) { return quote(v); }
template <typename T>
std::string to_json(const std::vector<T>& v) {
    std::string out = "[";
    for (size_t i = 0; i < v.size(); ++i) {
        if (i > 0) out += ",";
        out += to_json(v[i]);
    }
    return out + "]";
}
template <typename T>
std::vector<T> sorted(std::vector<T> v) {
    std::sort(v.begin(), v.end());
    return v;
}
std::string error_json(const std::string& input, const std::string& expected, const std::string& message) {
    return "{\"input\":" + input + ",\"expected\":" + expected + ",\"error\":" + quote(message) + ",\"passed\":false}";
}
}  // namespace clash_harness
"#;

const CASE: &str = r#"
static std::string clash_case_{{index}}(bool& passed) {
    const std::string input = {{input}};
    const std::string expected_json = {{expected_json}};
    try {
{{args}}
        Solution solution;
{{call}}
        const {{expected_type}} expected = {{expected}};
        passed = {{check}};
        return "{\"input\":" + input + ",\"output\":" + clash_harness::to_json(output) + ",\"expected\":" + expected_json + ",\"passed\":" + (passed ? "true" : "false") + "}";
    } catch (const std::exception& e) {
        passed = false;
        return clash_harness::error_json(input, expected_json, e.what());
    } catch (...) {
        passed = false;
        return clash_harness::error_json(input, expected_json, "unknown exception");
    }
}
"#;

const RUN_MAIN: &str = r#"
int main() {
    bool passed = false;
    std::cout << clash_case_0(passed) << std::endl;
    return 0;
}
"#;

const SUBMIT_MAIN: &str = r#"
int main() {
    using CaseFn = std::string (*)(bool&);
    const std::vector<CaseFn> cases = { {{case_fns}} };
    bool all_passed = true;
    std::string results;
    for (size_t i = 0; i < cases.size(); ++i) {
        bool passed = false;
        if (i > 0) results += ",";
        results += cases[i](passed);
        if (!passed) {
            all_passed = false;
            break;
        }
    }
    std::cout << "{\"allPassed\":" << (all_passed ? "true" : "false") << ",\"results\":[" << results << "]}" << std::endl;
    return 0;
}
"#;

pub(super) fn render(
    problem: &ProblemSpec,
    source: &str,
    cases: &[PreparedCase],
    mode: ExecutionMode,
) -> Result<String, HarnessError> {
    let mut program = String::from(PRELUDE);
    program.push_str(source);
    program.push('\n');
    program.push_str(HELPERS);

    for (index, case) in cases.iter().enumerate() {
        program.push_str(&render_case(problem, index, case)?);
    }

    match mode {
        ExecutionMode::Run => program.push_str(RUN_MAIN),
        ExecutionMode::Submit => {
            let fns: Vec<String> = (0..cases.len()).map(|i| format!("clash_case_{}", i)).collect();
            program.push_str(&render_template(SUBMIT_MAIN, &json!({ "case_fns": fns.join(", ") }))?);
        }
    }
    Ok(program)
}

fn render_case(problem: &ProblemSpec, index: usize, case: &PreparedCase) -> Result<String, HarnessError> {
    let args: Vec<String> = case
        .args
        .iter()
        .enumerate()
        .map(|(i, arg)| format!("        {} arg{} = {};", type_name(arg.kind()), i, literal(arg)))
        .collect();
    let arg_names: Vec<String> = (0..case.args.len()).map(|i| format!("arg{}", i)).collect();
    let invocation = format!("solution.{}({})", problem.entry_point, arg_names.join(", "));

    let call = match problem.comparison {
        Comparison::MutatedArg(target) => {
            format!("        {};\n        const auto& output = arg{};", invocation, target)
        }
        Comparison::Exact | Comparison::SortedArray => format!("        auto output = {};", invocation),
    };
    let check = match problem.comparison {
        Comparison::SortedArray => "clash_harness::sorted(output) == clash_harness::sorted(expected)",
        Comparison::Exact | Comparison::MutatedArg(_) => "output == expected",
    };

    render_template(
        CASE,
        &json!({
            "index": index,
            "input": string_literal(&case.input.to_string()),
            "expected_json": string_literal(&case.expected.to_json().to_string()),
            "args": args.join("\n"),
            "call": call,
            "expected_type": type_name(case.expected.kind()),
            "expected": literal(&case.expected),
            "check": check,
        }),
    )
}

fn type_name(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Int => "int",
        ValueKind::Bool => "bool",
        ValueKind::Str => "std::string",
        ValueKind::IntArray => "std::vector<int>",
    }
}

fn literal(value: &TypedValue) -> String {
    match value {
        TypedValue::Int(n) => int32_literal(*n),
        TypedValue::Bool(b) => b.to_string(),
        TypedValue::Str(s) => format!("std::string({})", string_literal(s)),
        TypedValue::IntArray(items) => {
            let items: Vec<String> = items.iter().map(|n| int32_literal(*n)).collect();
            format!("std::vector<int>{{{}}}", items.join(", "))
        }
    }
}

/// C++ string literal. Control bytes use three-digit octal escapes so a following
/// digit can never extend the escape.
fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '?' => out.push_str("\\?"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => out.push_str(&format!("\\{:03o}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
