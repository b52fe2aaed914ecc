use serde::{Deserialize, Serialize};

use super::value::{Validator, Value};
use crate::errors::{CfgTreeError, Result};

/// Horizontal alignment of a slider's value label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    #[default]
    Left,
    Right,
    Center,
}

/// What a file dialog picks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    #[default]
    File,
    Dir,
}

/// A single construction option
///
/// Every node kind declares the option names it accepts (see
/// [`NodeKind::accepted_options`](super::kind::NodeKind::accepted_options));
/// construction fails on anything outside that whitelist.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeOption {
    /// Display label (defaults to the key)
    Pretty(String),
    /// Initial value
    Default(Value),
    /// Whether the node is persisted at all
    Save(bool),
    /// Whether a null value is still written to the document
    SaveIfNone(bool),
    Hidden(bool),
    Editable(bool),
    /// Control edits apply to the node without an explicit commit
    Immediate(bool),
    /// Persist the value as wrapped base64 of its YAML form
    Base64(bool),
    ReadOnly(bool),
    Validator(Validator),
    Min(i64),
    Max(i64),
    /// Display multiplier of a slider's position
    Den(f64),
    Format(String),
    ShowValue(bool),
    Suffix(String),
    Align(Align),
    Items(Vec<String>),
    FileType(FileType),
    Height(u32),
}

impl NodeOption {
    /// Every option name, in declaration order
    pub const ALL_NAMES: &'static [&'static str] = &[
        "pretty",
        "default",
        "save",
        "save_if_none",
        "hidden",
        "editable",
        "immediate",
        "base64",
        "readonly",
        "validator",
        "min",
        "max",
        "den",
        "format",
        "show_value",
        "suffix",
        "align",
        "items",
        "file_type",
        "height",
    ];

    /// Option name as used in whitelists and option bags
    pub fn name(&self) -> &'static str {
        match self {
            NodeOption::Pretty(_) => "pretty",
            NodeOption::Default(_) => "default",
            NodeOption::Save(_) => "save",
            NodeOption::SaveIfNone(_) => "save_if_none",
            NodeOption::Hidden(_) => "hidden",
            NodeOption::Editable(_) => "editable",
            NodeOption::Immediate(_) => "immediate",
            NodeOption::Base64(_) => "base64",
            NodeOption::ReadOnly(_) => "readonly",
            NodeOption::Validator(_) => "validator",
            NodeOption::Min(_) => "min",
            NodeOption::Max(_) => "max",
            NodeOption::Den(_) => "den",
            NodeOption::Format(_) => "format",
            NodeOption::ShowValue(_) => "show_value",
            NodeOption::Suffix(_) => "suffix",
            NodeOption::Align(_) => "align",
            NodeOption::Items(_) => "items",
            NodeOption::FileType(_) => "file_type",
            NodeOption::Height(_) => "height",
        }
    }

    /// Parse one entry of an untyped option bag
    ///
    /// `key` is the node key, used for error context only.
    ///
    /// # Errors
    ///
    /// `InvalidOption` for an unknown option name, `InvalidOptionValue` when
    /// the value has the wrong shape.
    pub fn from_pair(key: &str, name: &str, value: &Value) -> Result<Self> {
        let bad = |reason: &str| CfgTreeError::InvalidOptionValue {
            key: key.to_string(),
            option: name.to_string(),
            reason: reason.to_string(),
        };
        let as_bool = || value.as_bool().ok_or_else(|| bad("expected a bool"));
        let as_string = || {
            value
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| bad("expected a string"))
        };
        let as_int = || value.as_i64().ok_or_else(|| bad("expected an integer"));

        let option = match name {
            "pretty" => NodeOption::Pretty(as_string()?),
            "default" => NodeOption::Default(value.clone()),
            "save" => NodeOption::Save(as_bool()?),
            "save_if_none" => NodeOption::SaveIfNone(as_bool()?),
            "hidden" => NodeOption::Hidden(as_bool()?),
            "editable" => NodeOption::Editable(as_bool()?),
            "immediate" => NodeOption::Immediate(as_bool()?),
            "base64" => NodeOption::Base64(as_bool()?),
            "readonly" => NodeOption::ReadOnly(as_bool()?),
            "validator" => NodeOption::Validator(
                serde_json::from_value(value.clone()).map_err(|e| bad(&e.to_string()))?,
            ),
            "min" => NodeOption::Min(as_int()?),
            "max" => NodeOption::Max(as_int()?),
            "den" => NodeOption::Den(value.as_f64().ok_or_else(|| bad("expected a number"))?),
            "format" => NodeOption::Format(as_string()?),
            "show_value" => NodeOption::ShowValue(as_bool()?),
            "suffix" => NodeOption::Suffix(as_string()?),
            "align" => NodeOption::Align(
                serde_json::from_value(value.clone()).map_err(|e| bad(&e.to_string()))?,
            ),
            "items" => NodeOption::Items(
                serde_json::from_value(value.clone())
                    .map_err(|_| bad("expected a list of strings"))?,
            ),
            "file_type" => NodeOption::FileType(
                serde_json::from_value(value.clone()).map_err(|e| bad(&e.to_string()))?,
            ),
            "height" => NodeOption::Height(
                value
                    .as_u64()
                    .and_then(|h| u32::try_from(h).ok())
                    .ok_or_else(|| bad("expected a positive integer"))?,
            ),
            other => {
                return Err(CfgTreeError::InvalidOption {
                    key: key.to_string(),
                    kind: "any".to_string(),
                    option: other.to_string(),
                })
            }
        };
        Ok(option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_names_cover_every_variant() {
        let samples = [
            NodeOption::Pretty(String::new()),
            NodeOption::Default(Value::Null),
            NodeOption::Save(true),
            NodeOption::SaveIfNone(true),
            NodeOption::Hidden(true),
            NodeOption::Editable(true),
            NodeOption::Immediate(true),
            NodeOption::Base64(true),
            NodeOption::ReadOnly(true),
            NodeOption::Validator(Validator::NotEmpty),
            NodeOption::Min(0),
            NodeOption::Max(0),
            NodeOption::Den(1.0),
            NodeOption::Format(String::new()),
            NodeOption::ShowValue(true),
            NodeOption::Suffix(String::new()),
            NodeOption::Align(Align::Left),
            NodeOption::Items(vec![]),
            NodeOption::FileType(FileType::Dir),
            NodeOption::Height(1),
        ];
        let names: Vec<_> = samples.iter().map(NodeOption::name).collect();
        assert_eq!(names, NodeOption::ALL_NAMES);
    }

    #[test]
    fn test_from_pair_parses_typed_values() {
        assert_eq!(
            NodeOption::from_pair("k", "items", &json!(["a", "b"])).unwrap(),
            NodeOption::Items(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(
            NodeOption::from_pair("k", "file_type", &json!("dir")).unwrap(),
            NodeOption::FileType(FileType::Dir)
        );
        assert_eq!(
            NodeOption::from_pair("k", "hidden", &json!(true)).unwrap(),
            NodeOption::Hidden(true)
        );
    }

    #[test]
    fn test_from_pair_rejects_unknown_name() {
        let err = NodeOption::from_pair("k", "colour", &json!("red")).unwrap_err();
        assert!(matches!(err, CfgTreeError::InvalidOption { ref option, .. } if option == "colour"));
    }

    #[test]
    fn test_from_pair_rejects_wrong_shape() {
        let err = NodeOption::from_pair("k", "hidden", &json!("yes")).unwrap_err();
        assert!(matches!(err, CfgTreeError::InvalidOptionValue { .. }));
    }
}
