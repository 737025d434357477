use std::fmt;

use crate::eval::Operand;

/// Concrete operand type for key/value contexts: booleans, numbers,
/// text, and lists of text (the right-hand side of membership tests).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Bool(bool_value) = self {
            Some(*bool_value)
        } else {
            None
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        if let Value::Number(numeric_value) = self {
            Some(*numeric_value)
        } else {
            None
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        if let Value::Text(text) = self {
            Some(text.as_str())
        } else {
            None
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        if let Value::List(items) = self {
            Some(items.as_slice())
        } else {
            None
        }
    }

    /// Boolean coercion: `false`, `0`, NaN, and empty text are falsy;
    /// everything else, lists included, is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Text(s) => !s.is_empty(),
            Value::List(_) => true,
        }
    }
}

impl Operand for Value {
    fn from_text(text: &str) -> Self {
        Value::Text(text.to_string())
    }

    fn from_number(value: f64) -> Self {
        Value::Number(value)
    }

    fn from_bool(value: bool) -> Self {
        Value::Bool(value)
    }

    fn truthy(&self) -> bool {
        self.is_truthy()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

impl From<Vec<&str>> for Value {
    fn from(items: Vec<&str>) -> Self {
        Value::List(items.into_iter().map(String::from).collect())
    }
}
