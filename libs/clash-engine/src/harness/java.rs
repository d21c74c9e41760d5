use super::{int32_literal, render_template, Comparison, HarnessError, PreparedCase, ProblemSpec, TypedValue, ValueKind};
use clash_common::types::ExecutionMode;
use serde_json::json;

const CLASS_OPEN: &str = r#"
public class Main {
    static String quote(String s) {
        StringBuilder out = new StringBuilder("\"");
        for (int i = 0; i < s.length(); i++) {
            char c = s.charAt(i);
            switch (c) {
                case '"': out.append("\\\""); break;
                case '\\': out.append("\\\\"); break;
                case '\n': out.append("\\n"); break;
                case '\r': out.append("\\r"); break;
                case '\t': out.append("\\t"); break;
                default:
                    if (c < 0x20) {
                        out.append(String.format("\\u%04x", (int) c));
                    } else {
                        out.append(c);
                    }
            }
        }
        return out.append('"').toString();
    }

    static String toJson(int v) { return Integer.toString(v); }
    static String toJson(long v) { return Long.toString(v); }
    static String toJson(boolean v) { return v ? "true" : "false"; }
    static String toJson(String v) { return v == null ? "null" : quote(v); }
    static String toJson(int[] v) {
        if (v == null) return "null";
        StringBuilder out = new StringBuilder("[");
        for (int i = 0; i < v.length; i++) {
            if (i > 0) out.append(',');
            out.append(v[i]);
        }
        return out.append(']').toString();
    }

    static int[] sorted(int[] v) {
        int[] copy = v.clone();
        java.util.Arrays.sort(copy);
        return copy;
    }

    static String errorJson(String input, String expected, Throwable e) {
        return "{\"input\":" + input + ",\"expected\":" + expected + ",\"error\":" + quote(String.valueOf(e)) + ",\"passed\":false}";
    }
"#;

const CASE: &str = r#"
    static String case{{index}}(boolean[] passed) {
        String input = {{input}};
        String expectedJson = {{expected_json}};
        try {
{{args}}
            Solution solution = new Solution();
{{call}}
            {{expected_type}} expected = {{expected}};
            passed[0] = {{check}};
            return "{\"input\":" + input + ",\"output\":" + toJson(output) + ",\"expected\":" + expectedJson + ",\"passed\":" + passed[0] + "}";
        } catch (Throwable e) {
            passed[0] = false;
            return errorJson(input, expectedJson, e);
        }
    }
"#;

const RUN_MAIN: &str = r#"
    public static void main(String[] args) {
        boolean[] passed = {false};
        System.out.println(case0(passed));
    }
}
"#;

const SUBMIT_MAIN: &str = r#"
    public static void main(String[] args) {
        java.util.List<java.util.function.Function<boolean[], String>> cases = java.util.List.of({{case_fns}});
        boolean allPassed = true;
        java.util.List<String> results = new java.util.ArrayList<>();
        for (java.util.function.Function<boolean[], String> runCase : cases) {
            boolean[] passed = {false};
            results.add(runCase.apply(passed));
            if (!passed[0]) {
                allPassed = false;
                break;
            }
        }
        System.out.println("{\"allPassed\":" + allPassed + ",\"results\":[" + String.join(",", results) + "]}");
    }
}
"#;

pub(super) fn render(
    problem: &ProblemSpec,
    source: &str,
    cases: &[PreparedCase],
    mode: ExecutionMode,
) -> Result<String, HarnessError> {
    // only `Main` may be public in the single compilation unit the sandbox builds
    let mut program = source.replace("public class Solution", "class Solution");
    program.push('\n');
    program.push_str(CLASS_OPEN);

    for (index, case) in cases.iter().enumerate() {
        program.push_str(&render_case(problem, index, case)?);
    }

    match mode {
        ExecutionMode::Run => program.push_str(RUN_MAIN),
        ExecutionMode::Submit => {
            let fns: Vec<String> = (0..cases.len()).map(|i| format!("Main::case{}", i)).collect();
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
        .map(|(i, arg)| format!("            {} arg{} = {};", type_name(arg.kind()), i, literal(arg)))
        .collect();
    let arg_names: Vec<String> = (0..case.args.len()).map(|i| format!("arg{}", i)).collect();
    let invocation = format!("solution.{}({})", problem.entry_point, arg_names.join(", "));

    let call = match problem.comparison {
        Comparison::MutatedArg(target) => {
            format!("            {};\n            var output = arg{};", invocation, target)
        }
        Comparison::Exact | Comparison::SortedArray => format!("            var output = {};", invocation),
    };
    let check = match (problem.comparison, case.expected.kind()) {
        (Comparison::SortedArray, _) => "java.util.Arrays.equals(sorted(output), sorted(expected))",
        (_, ValueKind::IntArray) => "java.util.Arrays.equals(output, expected)",
        (_, ValueKind::Str) => "java.util.Objects.equals(output, expected)",
        (_, ValueKind::Int | ValueKind::Bool) => "output == expected",
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
        ValueKind::Bool => "boolean",
        ValueKind::Str => "String",
        ValueKind::IntArray => "int[]",
    }
}

fn literal(value: &TypedValue) -> String {
    match value {
        TypedValue::Int(n) => int32_literal(*n),
        TypedValue::Bool(b) => b.to_string(),
        TypedValue::Str(s) => string_literal(s),
        TypedValue::IntArray(items) => {
            let items: Vec<String> = items.iter().map(|n| int32_literal(*n)).collect();
            format!("new int[]{{{}}}", items.join(", "))
        }
    }
}

/// Java string literal. Control characters use octal escapes: `\u` escapes are
/// translated before lexing and would break the literal.
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
            c if (c as u32) < 0x20 => out.push_str(&format!("\\{:03o}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
