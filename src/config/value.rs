//! Typed configuration values.

use std::fmt;

/// A configuration parameter value.
///
/// The variant of a parameter's default fixes its type: later assignments are
/// checked (and strings coerced) against it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// Human-readable type name used in errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view; integers widen.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Rendering used by config dumps: empty strings are shown quoted so they
    /// stay visible, everything else as [`Display`](fmt::Display).
    pub fn inspect(&self) -> String {
        match self {
            Value::Str(s) if s.is_empty() => "\"\"".to_string(),
            other => other.to_string(),
        }
    }

    /// Converts `self` to the type of `target`, if possible.
    ///
    /// Same-typed values pass through, integers widen to floats, and strings
    /// are parsed. Returns `None` when no conversion applies.
    pub(crate) fn coerce_like(self, target: &Value) -> Option<Value> {
        match (target, self) {
            (Value::Bool(_), v @ Value::Bool(_)) => Some(v),
            (Value::Int(_), v @ Value::Int(_)) => Some(v),
            (Value::Float(_), v @ Value::Float(_)) => Some(v),
            (Value::Str(_), v @ Value::Str(_)) => Some(v),
            (Value::Float(_), Value::Int(i)) => Some(Value::Float(i as f64)),
            (Value::Bool(_), Value::Str(s)) => match s.trim() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            (Value::Int(_), Value::Str(s)) => s.trim().parse().ok().map(Value::Int),
            (Value::Float(_), Value::Str(s)) => s.trim().parse().ok().map(Value::Float),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_coerce_to_default_type() {
        let target = Value::Bool(false);
        assert_eq!(Value::from("true").coerce_like(&target), Some(Value::Bool(true)));
        assert_eq!(Value::from("yes").coerce_like(&target), None);

        let target = Value::Int(0);
        assert_eq!(Value::from(" 42 ").coerce_like(&target), Some(Value::Int(42)));
        assert_eq!(Value::Bool(true).coerce_like(&target), None);

        let target = Value::Float(0.5);
        assert_eq!(Value::Int(3).coerce_like(&target), Some(Value::Float(3.0)));
    }

    #[test]
    fn inspect_quotes_only_empty_strings() {
        assert_eq!(Value::from("").inspect(), "\"\"");
        assert_eq!(Value::from("x").inspect(), "x");
        assert_eq!(Value::Bool(true).inspect(), "true");
    }
}
