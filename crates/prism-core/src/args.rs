//! Operation arguments.
//!
//! Requests carry arguments as loosely typed JSON. They are converted once
//! into [`ArgValue`]s, and each handler pulls out what it needs with the typed
//! accessors on [`ArgMap`], which report problems as [`OperationError`]s.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::OperationError;

/// A single argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Arrays and objects; no handler accepts these, but they are kept so
    /// the error can say what was received
    Composite(Value),
}

impl ArgValue {
    /// Parse a command-line value: JSON if it parses, plain text otherwise.
    pub fn parse_cli(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::from(value),
            Err(_) => Self::Text(raw.to_string()),
        }
    }

    /// Integer view. Whole floats and numeric text are accepted.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
            Self::Text(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite() && f.fract() == 0.0)
                        .map(|f| f as i64)
                })
            }
            _ => None,
        }
    }

    /// Float view. Integers and numeric text are accepted; NaN is not.
    pub fn as_float(&self) -> Option<f64> {
        let value = match self {
            Self::Int(i) => *i as f64,
            Self::Float(f) => *f,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        (!value.is_nan()).then_some(value)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(0) => Some(false),
            Self::Int(1) => Some(true),
            Self::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Value> for ArgValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::Text(s),
            other => Self::Composite(other),
        }
    }
}

impl std::fmt::Display for ArgValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::Composite(v) => write!(f, "{v}"),
        }
    }
}

/// Named arguments of one operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgMap {
    values: BTreeMap<String, ArgValue>,
}

impl ArgMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object. Anything else is not an argument map.
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        Some(Self {
            values: object
                .iter()
                .map(|(k, v)| (k.clone(), ArgValue::from(v.clone())))
                .collect(),
        })
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ArgValue) {
        self.values.insert(name.into(), value);
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, ArgValue::from(value.into()));
        self
    }

    /// Look up an argument; `null` counts as absent.
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name).filter(|v| !matches!(v, ArgValue::Null))
    }

    /// First present argument among `names`.
    pub fn get_any(&self, names: &[&str]) -> Option<&ArgValue> {
        names.iter().find_map(|name| self.get(name))
    }

    /// Fail with every absent name listed at once.
    pub fn require_all(&self, names: &[&str]) -> Result<(), OperationError> {
        let missing: Vec<&str> = names
            .iter()
            .copied()
            .filter(|name| self.get(name).is_none())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(OperationError::MissingArgument(missing.join(", ")))
        }
    }

    pub fn require(&self, name: &str) -> Result<&ArgValue, OperationError> {
        self.get(name)
            .ok_or_else(|| OperationError::MissingArgument(name.to_string()))
    }

    /// Required integer; `invalid` is the message used when it does not parse.
    pub fn require_int(&self, name: &str, invalid: &str) -> Result<i64, OperationError> {
        self.require(name)?
            .as_int()
            .ok_or_else(|| OperationError::invalid(name, invalid))
    }

    /// Required float; `invalid` is the message used when it does not parse.
    pub fn require_float(&self, name: &str, invalid: &str) -> Result<f64, OperationError> {
        self.require(name)?
            .as_float()
            .ok_or_else(|| OperationError::invalid(name, invalid))
    }

    /// Optional text under any of `names`, rendering scalars as text.
    pub fn optional_text(&self, names: &[&str]) -> Option<String> {
        self.get_any(names).and_then(|v| match v {
            ArgValue::Composite(_) => None,
            other => Some(other.to_string()),
        })
    }

    pub fn optional_int(&self, names: &[&str]) -> Result<Option<i64>, OperationError> {
        match self.get_any(names) {
            None => Ok(None),
            Some(v) => v.as_int().map(Some).ok_or_else(|| {
                OperationError::invalid(names[0], format!("'{}' must be an integer: {v}", names[0]))
            }),
        }
    }

    pub fn optional_bool(&self, names: &[&str]) -> Result<Option<bool>, OperationError> {
        match self.get_any(names) {
            None => Ok(None),
            Some(v) => v.as_bool().map(Some).ok_or_else(|| {
                OperationError::invalid(names[0], format!("'{}' must be a boolean: {v}", names[0]))
            }),
        }
    }
}
