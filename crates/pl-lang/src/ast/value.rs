use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::expr::ValueType;

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// Runtime value produced by evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Long(i64),
    Double(f64),
    Str(String),
    Bool(bool),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Null,
}

impl Value {
    /// Runtime type tag; `Null` reports `Any`.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Long(_) => ValueType::Long,
            Value::Double(_) => ValueType::Double,
            Value::Str(_) => ValueType::String,
            Value::Bool(_) => ValueType::Boolean,
            Value::Array(_) => ValueType::Array,
            Value::Map(_) => ValueType::Map,
            Value::Null => ValueType::Any,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Long(n) => Some(*n as f64),
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Equality with Long/Double compared numerically.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Long(a), Value::Double(b)) | (Value::Double(b), Value::Long(a)) => {
                (*a as f64) == *b
            }
            _ => self == other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Long(n) => write!(f, "{n}"),
            Value::Double(n) => write!(f, "{n}"),
            Value::Str(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Value::Null => f.write_str("null"),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Long(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

// ---------------------------------------------------------------------------
// Message & evaluation context
// ---------------------------------------------------------------------------

/// A log message: named fields with heterogeneous values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    pub fields: HashMap<String, Value>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }
}

/// State visible to expressions while a rule runs against one message.
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    pub message: Message,
    pub vars: HashMap<String, Value>,
}

impl EvalContext {
    pub fn new(message: Message) -> Self {
        Self {
            message,
            vars: HashMap::new(),
        }
    }

    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }
}

// ---------------------------------------------------------------------------
// Evaluation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("function `{0}` could not be resolved")]
    UnresolvedFunction(String),
    #[error("function `{0}` has no implementation")]
    NotImplemented(String),
    #[error("expected {expected} value, got {actual}")]
    TypeMismatch {
        expected: ValueType,
        actual: ValueType,
    },
    #[error("cannot compare {left} with {right} using `{op}`")]
    Incomparable {
        op: &'static str,
        left: ValueType,
        right: ValueType,
    },
    #[error("function `{function}`: {message}")]
    Function { function: String, message: String },
}
