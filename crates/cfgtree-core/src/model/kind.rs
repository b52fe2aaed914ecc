use serde::{Deserialize, Serialize};

use super::options::{Align, FileType};
use super::value::{Validator, ValueClass};

const COMMON: &[&str] = &[
    "pretty",
    "default",
    "save",
    "save_if_none",
    "hidden",
    "editable",
    "immediate",
    "base64",
];

/// Closed set of node kinds
///
/// New kinds are added here, together with their option whitelist, value
/// class and control description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Root,
    Subsection,
    InputBox,
    Int,
    CheckBox,
    Slider,
    ComboBox,
    FileDialog,
    List,
    FileList,
    EditBox,
    PasswordEdit,
    Private,
}

impl NodeKind {
    /// Stable kind name, as used in schema files and error messages
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Subsection => "subsection",
            NodeKind::InputBox => "input_box",
            NodeKind::Int => "int",
            NodeKind::CheckBox => "check_box",
            NodeKind::Slider => "slider",
            NodeKind::ComboBox => "combo_box",
            NodeKind::FileDialog => "file_dialog",
            NodeKind::List => "list",
            NodeKind::FileList => "file_list",
            NodeKind::EditBox => "edit_box",
            NodeKind::PasswordEdit => "password_edit",
            NodeKind::Private => "private",
        }
    }

    /// True for kinds that own children
    pub fn is_subsection(&self) -> bool {
        matches!(self, NodeKind::Root | NodeKind::Subsection)
    }

    /// True if the kind renders an input control
    pub fn has_control(&self) -> bool {
        !matches!(
            self,
            NodeKind::Root | NodeKind::Subsection | NodeKind::Private
        )
    }

    /// True if the value must never be displayed or logged in clear
    pub fn is_sensitive(&self) -> bool {
        matches!(self, NodeKind::PasswordEdit)
    }

    /// Option names accepted at construction
    pub fn accepted_options(&self) -> &'static [&'static str] {
        match self {
            NodeKind::Root | NodeKind::Subsection => &[
                "pretty",
                "save",
                "save_if_none",
                "hidden",
                "editable",
                "immediate",
            ],
            NodeKind::Private => &["pretty", "default", "save", "save_if_none", "base64"],
            _ => COMMON,
        }
    }

    /// Kind-specific options on top of [`accepted_options`](Self::accepted_options)
    pub fn extra_options(&self) -> &'static [&'static str] {
        match self {
            NodeKind::InputBox => &["validator", "readonly"],
            NodeKind::Int => &["min", "max", "readonly"],
            NodeKind::Slider => &[
                "min",
                "max",
                "den",
                "format",
                "show_value",
                "suffix",
                "align",
            ],
            NodeKind::ComboBox => &["items"],
            NodeKind::FileDialog => &["file_type"],
            NodeKind::List => &["validator", "height"],
            NodeKind::FileList => &["height"],
            NodeKind::EditBox => &["height", "readonly"],
            NodeKind::PasswordEdit => &["readonly"],
            _ => &[],
        }
    }

    /// Check an option name against this kind's whitelist
    pub fn accepts_option(&self, name: &str) -> bool {
        self.accepted_options().contains(&name) || self.extra_options().contains(&name)
    }

    /// Class of values nodes of this kind hold
    pub fn value_class(&self) -> ValueClass {
        match self {
            NodeKind::Root | NodeKind::Subsection | NodeKind::Private => ValueClass::Any,
            NodeKind::InputBox => ValueClass::Scalar,
            NodeKind::Int | NodeKind::Slider => ValueClass::Integer,
            NodeKind::CheckBox => ValueClass::Bool,
            NodeKind::ComboBox => ValueClass::Index,
            NodeKind::FileDialog | NodeKind::EditBox | NodeKind::PasswordEdit => ValueClass::Text,
            NodeKind::List | NodeKind::FileList => ValueClass::List,
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What the rendering collaborator must build for a node
///
/// The core never looks at how a control is drawn; this is the whole
/// description it hands over.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlSpec {
    /// No control (subsections, private nodes)
    None,
    InputBox {
        validator: Option<Validator>,
        read_only: bool,
    },
    CheckBox,
    Slider {
        min: i64,
        max: i64,
        den: f64,
        format: String,
        show_value: bool,
        suffix: String,
        align: Align,
    },
    ComboBox {
        items: Vec<String>,
    },
    FileDialog {
        file_type: FileType,
    },
    List {
        validator: Option<Validator>,
        height: Option<u32>,
    },
    FileList {
        height: Option<u32>,
    },
    EditBox {
        height: Option<u32>,
        read_only: bool,
    },
    Password {
        read_only: bool,
    },
}

impl ControlSpec {
    /// Validator the control applies to its own content, if any
    pub fn validator(&self) -> Option<&Validator> {
        match self {
            ControlSpec::InputBox { validator, .. } | ControlSpec::List { validator, .. } => {
                validator.as_ref()
            }
            _ => None,
        }
    }
}
