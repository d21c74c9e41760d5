// Problem registry: how each problem's test input becomes call arguments,
// and how the return value is judged.

use super::HarnessError;
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Bool,
    Str,
    IntArray,
}

/// How a harness decides whether a case passed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Return value equals expected
    Exact,
    /// Return value equals expected once both are sorted ascending
    SortedArray,
    /// The entry point mutates argument `n` in place; its final state equals expected
    MutatedArg(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Int(i64),
    Bool(bool),
    Str(String),
    IntArray(Vec<i64>),
}

impl TypedValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            TypedValue::Int(_) => ValueKind::Int,
            TypedValue::Bool(_) => ValueKind::Bool,
            TypedValue::Str(_) => ValueKind::Str,
            TypedValue::IntArray(_) => ValueKind::IntArray,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            TypedValue::Int(n) => Value::from(*n),
            TypedValue::Bool(b) => Value::Bool(*b),
            TypedValue::Str(s) => Value::String(s.clone()),
            TypedValue::IntArray(items) => Value::Array(items.iter().map(|n| Value::from(*n)).collect()),
        }
    }

    pub fn default_of(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Int => TypedValue::Int(0),
            ValueKind::Bool => TypedValue::Bool(false),
            ValueKind::Str => TypedValue::Str(String::new()),
            ValueKind::IntArray => TypedValue::IntArray(Vec::new()),
        }
    }

    /// Best-effort conversion; anything unusable becomes the kind's zero value.
    pub fn coerce(kind: ValueKind, value: &Value) -> Self {
        match kind {
            ValueKind::Int => TypedValue::Int(coerce_int(value).unwrap_or(0)),
            ValueKind::Bool => TypedValue::Bool(match value {
                Value::Bool(b) => *b,
                Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
                Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
                _ => false,
            }),
            ValueKind::Str => TypedValue::Str(match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                // character arrays such as ["(", ")"]
                Value::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
                other => other.to_string(),
            }),
            ValueKind::IntArray => TypedValue::IntArray(match value {
                Value::Array(items) => items.iter().map(|item| coerce_int(item).unwrap_or(0)).collect(),
                Value::Number(_) => coerce_int(value).into_iter().collect(),
                Value::String(s) => match serde_json::from_str::<Value>(s) {
                    Ok(parsed @ Value::Array(_)) => return Self::coerce(kind, &parsed),
                    _ => s
                        .trim_matches(|c| c == '[' || c == ']')
                        .split(',')
                        .filter_map(|part| part.trim().parse::<i64>().ok())
                        .collect(),
                },
                _ => Vec::new(),
            }),
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub kind: ValueKind,
}

impl Param {
    pub fn new(name: &str, kind: ValueKind) -> Self {
        Self { name: name.to_string(), kind }
    }
}

/// Everything a harness needs to know about one problem
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemSpec {
    pub key: String,
    pub title: String,
    /// Function (JavaScript) or `Solution` method (Python, C++, Java) name
    pub entry_point: String,
    pub params: Vec<Param>,
    /// `None` for entry points that only mutate their arguments
    pub returns: Option<ValueKind>,
    pub comparison: Comparison,
}

impl ProblemSpec {
    /// Kind of value `expected` is compared against
    pub fn expected_kind(&self) -> ValueKind {
        match self.comparison {
            Comparison::MutatedArg(index) => self.params.get(index).map_or(ValueKind::Int, |p| p.kind),
            Comparison::Exact | Comparison::SortedArray => self.returns.unwrap_or(ValueKind::Int),
        }
    }

    /// Entry point and parameter names are spliced into generated source, so they
    /// must be plain identifiers.
    pub fn validate(&self) -> Result<(), HarnessError> {
        let invalid = |reason: String| HarnessError::InvalidProblem {
            key: self.key.clone(),
            reason,
        };

        if !is_identifier(&self.entry_point) {
            return Err(invalid(format!("entry point {:?} is not an identifier", self.entry_point)));
        }
        if let Some(param) = self.params.iter().find(|p| !is_identifier(&p.name)) {
            return Err(invalid(format!("parameter {:?} is not an identifier", param.name)));
        }
        match self.comparison {
            Comparison::MutatedArg(index) if index >= self.params.len() => Err(invalid(format!(
                "mutated argument {} out of range for {} parameter(s)",
                index,
                self.params.len()
            ))),
            Comparison::Exact | Comparison::SortedArray if self.returns.is_none() => {
                Err(invalid("a return value is compared but none is declared".to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Reshape a stored test input into one typed argument per parameter.
    ///
    /// Accepts the canonical object form, a bare array, a JSON-encoded string or a bare
    /// scalar. Arguments that cannot be recovered fall back to zero values.
    pub fn build_args(&self, input: &Value) -> Vec<TypedValue> {
        let defaults = || self.params.iter().map(|p| TypedValue::default_of(p.kind)).collect::<Vec<_>>();
        let has_str_param = self.params.iter().any(|p| p.kind == ValueKind::Str);

        match input {
            Value::Object(fields) => self.args_from_object(fields),
            Value::Array(items) => self.args_from_array(items),
            Value::String(raw) if !has_str_param => match serde_json::from_str::<Value>(raw) {
                Ok(parsed @ (Value::Object(_) | Value::Array(_))) => self.build_args(&parsed),
                _ => defaults(),
            },
            Value::Null => defaults(),
            scalar => {
                let mut args = defaults();
                if let Some(first) = self.params.first() {
                    args[0] = TypedValue::coerce(first.kind, scalar);
                }
                args
            }
        }
    }

    pub fn canonical_input(&self, args: &[TypedValue]) -> Value {
        let fields: Map<String, Value> = self
            .params
            .iter()
            .zip(args)
            .map(|(param, arg)| (param.name.clone(), arg.to_json()))
            .collect();
        Value::Object(fields)
    }

    pub fn coerce_expected(&self, expected: &Value) -> TypedValue {
        TypedValue::coerce(self.expected_kind(), expected)
    }

    fn args_from_object(&self, fields: &Map<String, Value>) -> Vec<TypedValue> {
        self.params
            .iter()
            .map(|param| match fields.get(&param.name) {
                Some(value) => TypedValue::coerce(param.kind, value),
                None => TypedValue::default_of(param.kind),
            })
            .collect()
    }

    fn args_from_array(&self, items: &[Value]) -> Vec<TypedValue> {
        let whole = Value::Array(items.to_vec());
        match self.params.as_slice() {
            [] => Vec::new(),
            [only] => {
                // [[1, 2, 3]] is a one-element positional list
                let source = match items {
                    [inner @ Value::Array(_)] if only.kind == ValueKind::IntArray => inner,
                    [inner @ Value::String(_)] if only.kind == ValueKind::Str => inner,
                    _ => &whole,
                };
                vec![TypedValue::coerce(only.kind, source)]
            }
            params => {
                let positional = items.len() == params.len()
                    && (params[0].kind != ValueKind::IntArray || items[0].is_array());
                if positional {
                    params
                        .iter()
                        .zip(items)
                        .map(|(param, value)| TypedValue::coerce(param.kind, value))
                        .collect()
                } else {
                    let mut args: Vec<TypedValue> =
                        params.iter().map(|p| TypedValue::default_of(p.kind)).collect();
                    args[0] = TypedValue::coerce(params[0].kind, &whole);
                    args
                }
            }
        }
    }
}

/// Problem key → harness description
#[derive(Debug, Clone)]
pub struct ProblemRegistry {
    problems: HashMap<String, ProblemSpec>,
}

impl ProblemRegistry {
    pub fn empty() -> Self {
        Self {
            problems: HashMap::new(),
        }
    }

    pub fn builtin() -> Self {
        use ValueKind::*;

        let mut registry = Self::empty();
        registry.insert(ProblemSpec {
            key: "two-sum".to_string(),
            title: "Two Sum".to_string(),
            entry_point: "twoSum".to_string(),
            params: vec![Param::new("nums", IntArray), Param::new("target", Int)],
            returns: Some(IntArray),
            comparison: Comparison::SortedArray,
        });
        registry.insert(ProblemSpec {
            key: "valid-parentheses".to_string(),
            title: "Valid Parentheses".to_string(),
            entry_point: "isValid".to_string(),
            params: vec![Param::new("s", Str)],
            returns: Some(Bool),
            comparison: Comparison::Exact,
        });
        registry.insert(ProblemSpec {
            key: "maximum-subarray".to_string(),
            title: "Maximum Subarray".to_string(),
            entry_point: "maxSubArray".to_string(),
            params: vec![Param::new("nums", IntArray)],
            returns: Some(Int),
            comparison: Comparison::Exact,
        });
        registry.insert(ProblemSpec {
            key: "contains-duplicate".to_string(),
            title: "Contains Duplicate".to_string(),
            entry_point: "containsDuplicate".to_string(),
            params: vec![Param::new("nums", IntArray)],
            returns: Some(Bool),
            comparison: Comparison::Exact,
        });
        registry.insert(ProblemSpec {
            key: "best-time-to-buy-and-sell-stock".to_string(),
            title: "Best Time to Buy and Sell Stock".to_string(),
            entry_point: "maxProfit".to_string(),
            params: vec![Param::new("prices", IntArray)],
            returns: Some(Int),
            comparison: Comparison::Exact,
        });
        registry.insert(ProblemSpec {
            key: "move-zeroes".to_string(),
            title: "Move Zeroes".to_string(),
            entry_point: "moveZeroes".to_string(),
            params: vec![Param::new("nums", IntArray)],
            returns: None,
            comparison: Comparison::MutatedArg(0),
        });
        registry
    }

    /// Replaces any existing problem with the same key
    pub fn register(&mut self, problem: ProblemSpec) -> Result<(), HarnessError> {
        problem.validate()?;
        self.insert(problem);
        Ok(())
    }

    fn insert(&mut self, problem: ProblemSpec) {
        self.problems.insert(problem.key.clone(), problem);
    }

    pub fn get(&self, key: &str) -> Option<&ProblemSpec> {
        self.problems.get(key)
    }

    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.problems.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl Default for ProblemRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
