use std::cmp::Ordering;

use indexmap::IndexMap;
use regex::Regex;

use crate::eval::EvalContext;
use crate::value::Value;

/// Errors raised by the standard operator semantics.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextError {
    UnknownOperator { spelling: String },
    InvalidRegex { pattern: String, message: String },
}

impl std::fmt::Display for ContextError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextError::UnknownOperator { spelling } => {
                write!(f, "Unknown operator '{}'", spelling)
            }
            ContextError::InvalidRegex { pattern, message } => {
                write!(f, "Invalid regular expression '{}': {}", pattern, message)
            }
        }
    }
}

impl std::error::Error for ContextError {}

/// A ready-made evaluation context over a flat table of named values.
///
/// Unknown names resolve to a falsy sentinel rather than failing, so an
/// expression can probe for state that may not exist. Operators delegate
/// to [`standard_operator`]; wrap this type to layer custom ones on top.
#[derive(Debug, Clone, Default)]
pub struct KeyValueContext {
    bindings: IndexMap<String, Value>,
}

impl KeyValueContext {
    pub fn new() -> Self {
        Self {
            bindings: IndexMap::new(),
        }
    }

    /// Insert or replace a binding.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.bindings.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Build a context from a flat JSON object. Strings, numbers, and
    /// booleans map to their value kinds, arrays of scalars become text
    /// lists, and `null` becomes the falsy sentinel. Nested objects are
    /// rejected.
    pub fn from_json(json_str: &str) -> Result<Self, String> {
        let parsed: serde_json::Value =
            serde_json::from_str(json_str).map_err(|e| e.to_string())?;
        let serde_json::Value::Object(fields) = parsed else {
            return Err("state must be a JSON object".to_string());
        };

        let mut context = Self::new();
        for (name, value) in fields {
            let converted = convert_json_value(value)
                .map_err(|e| format!("state key '{}': {}", name, e))?;
            context.set(name, converted);
        }
        Ok(context)
    }
}

fn convert_json_value(value: serde_json::Value) -> Result<Value, String> {
    match value {
        serde_json::Value::Null => Ok(Value::Bool(false)),
        serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
        serde_json::Value::Number(n) => Ok(Value::Number(n.as_f64().unwrap_or(0.0))),
        serde_json::Value::String(s) => Ok(Value::Text(s)),
        serde_json::Value::Array(items) => {
            let mut list = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    serde_json::Value::String(s) => list.push(s),
                    serde_json::Value::Number(n) => list.push(n.to_string()),
                    serde_json::Value::Bool(b) => list.push(b.to_string()),
                    other => return Err(format!("unsupported list element {}", other)),
                }
            }
            Ok(Value::List(list))
        }
        serde_json::Value::Object(_) => Err("nested objects are not supported".to_string()),
    }
}

impl EvalContext for KeyValueContext {
    type Value = Value;
    type Error = ContextError;

    fn resolve_identifier(&self, name: &str) -> Result<Value, ContextError> {
        Ok(self
            .bindings
            .get(name)
            .cloned()
            .unwrap_or(Value::Bool(false)))
    }

    fn apply_operator(
        &self,
        spelling: &str,
        left: Value,
        right: Value,
    ) -> Result<Value, ContextError> {
        standard_operator(spelling, left, right)
    }
}

/// Reference operator semantics over [`Value`] operands. Any context may
/// delegate here and handle only its own extensions.
///
/// `==`/`===` and `!=`/`!==` compare strictly, kind and value both.
/// `>` `>=` `<` `<=` order numbers numerically and text
/// lexicographically; mismatched kinds order as false. `in`/`not in`
/// test list membership. `=~` compiles the right side as a regular
/// expression and tests the left. `&&`/`||` connect already-evaluated
/// operands, so there is no short-circuit. Any other spelling is an
/// [`ContextError::UnknownOperator`].
pub fn standard_operator(
    spelling: &str,
    left: Value,
    right: Value,
) -> Result<Value, ContextError> {
    let result = match spelling {
        "==" | "===" => left == right,
        "!=" | "!==" => left != right,
        ">" | ">=" | "<" | "<=" => ordered(spelling, &left, &right),
        "in" => contains(&right, &left),
        "not in" => !contains(&right, &left),
        "=~" => regex_match(&left, &right)?,
        "&&" => left.is_truthy() && right.is_truthy(),
        "||" => left.is_truthy() || right.is_truthy(),
        _ => {
            return Err(ContextError::UnknownOperator {
                spelling: spelling.to_string(),
            });
        }
    };
    Ok(Value::Bool(result))
}

fn ordered(spelling: &str, left: &Value, right: &Value) -> bool {
    let ordering = match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.partial_cmp(r),
        (Value::Text(l), Value::Text(r)) => Some(l.cmp(r)),
        _ => None,
    };
    let Some(ordering) = ordering else {
        return false;
    };
    match spelling {
        ">" => ordering == Ordering::Greater,
        ">=" => ordering != Ordering::Less,
        "<" => ordering == Ordering::Less,
        "<=" => ordering != Ordering::Greater,
        _ => false,
    }
}

/// Membership compares the needle's display text against list items, so
/// numbers and booleans can sit on the left of `in`.
fn contains(haystack: &Value, needle: &Value) -> bool {
    let Some(items) = haystack.as_list() else {
        return false;
    };
    let needle = needle.to_string();
    items.iter().any(|item| *item == needle)
}

/// The pattern compiles here, at operator application time, never
/// earlier. A list on either side never matches.
fn regex_match(left: &Value, pattern: &Value) -> Result<bool, ContextError> {
    if left.as_list().is_some() || pattern.as_list().is_some() {
        return Ok(false);
    }
    let pattern_text = pattern.to_string();
    let regex = Regex::new(&pattern_text).map_err(|e| ContextError::InvalidRegex {
        pattern: pattern_text.clone(),
        message: e.to_string(),
    })?;
    Ok(regex.is_match(&left.to_string()))
}
