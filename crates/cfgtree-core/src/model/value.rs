use serde::{Deserialize, Serialize};

pub use serde_json::Value;

/// Class of values a node may hold
///
/// The class is fixed when the node is constructed; every assignment
/// (programmatic, from a control or from a document) is checked against it.
/// `null` is accepted by every class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass {
    /// Anything, including mappings (private nodes)
    Any,
    /// String, number or bool (free text input)
    Scalar,
    /// String only
    Text,
    /// Whole number
    Integer,
    /// Boolean
    Bool,
    /// Non-negative whole number selecting an item
    Index,
    /// Sequence of values
    List,
}

impl ValueClass {
    /// Human-readable class name used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            ValueClass::Any => "any value",
            ValueClass::Scalar => "scalar",
            ValueClass::Text => "string",
            ValueClass::Integer => "integer",
            ValueClass::Bool => "bool",
            ValueClass::Index => "item index",
            ValueClass::List => "list",
        }
    }

    /// Check whether a value belongs to this class
    pub fn accepts(&self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        match self {
            ValueClass::Any => true,
            ValueClass::Scalar => value.is_string() || value.is_number() || value.is_boolean(),
            ValueClass::Text => value.is_string(),
            ValueClass::Integer => value.is_i64() || value.is_u64(),
            ValueClass::Bool => value.is_boolean(),
            ValueClass::Index => value.is_u64(),
            ValueClass::List => value.is_array(),
        }
    }

    /// True if a mapping is a legal value of this class
    pub fn accepts_mappings(&self) -> bool {
        matches!(self, ValueClass::Any)
    }
}

/// Short description of a value's shape, for error messages
pub fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

/// Text form of a value as a text control would display it
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Format rule a control applies to its own content
///
/// Validators decide whether a control is well-formed; an ill-formed control
/// never writes into its node and makes the whole configuration invalid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Validator {
    /// Whole number within an inclusive range
    Int { min: i64, max: i64 },
    /// Decimal number within an inclusive range with at most `decimals` digits
    /// after the point
    Float { min: f64, max: f64, decimals: u32 },
    /// Any non-empty text
    NotEmpty,
}

impl Validator {
    /// Validate the textual content of a control
    pub fn validate_text(&self, text: &str) -> bool {
        let text = text.trim();
        match self {
            Validator::Int { min, max } => text
                .parse::<i64>()
                .map(|n| n >= *min && n <= *max)
                .unwrap_or(false),
            Validator::Float { min, max, decimals } => {
                let digits = text
                    .split_once('.')
                    .map(|(_, frac)| frac.len())
                    .unwrap_or(0);
                if digits > *decimals as usize {
                    return false;
                }
                text.parse::<f64>()
                    .map(|n| n.is_finite() && n >= *min && n <= *max)
                    .unwrap_or(false)
            }
            Validator::NotEmpty => !text.is_empty(),
        }
    }

    /// Validate a control value; lists are valid when every element is
    pub fn validate(&self, value: &Value) -> bool {
        match value {
            Value::Null => false,
            Value::Array(items) => items.iter().all(|item| self.validate(item)),
            other => self.validate_text(&value_text(other)),
        }
    }
}
