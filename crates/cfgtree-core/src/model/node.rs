use cfgtree_core_types::Sensitive;

use super::kind::{ControlSpec, NodeKind};
use super::options::{Align, FileType, NodeOption};
use super::value::{describe, Validator, Value, ValueClass};
use crate::errors::{CfgTreeError, Result};

/// Handle of a node inside a [`Tree`](crate::ops::Tree)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in the tree's arena
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Settings a node passes on to children attached below it
///
/// `Some` means the setting was given explicitly (or was itself inherited);
/// `None` means the node uses its built-in default and passes nothing on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cascade {
    pub save: Option<bool>,
    pub save_if_none: Option<bool>,
    pub hidden: Option<bool>,
    pub editable: Option<bool>,
    pub immediate: Option<bool>,
}

/// The atomic configuration unit
///
/// A node is either a typed leaf or a subsection owning ordered children.
/// Nodes are declared standalone and then attached to a tree, which owns them
/// from then on.
#[derive(Clone)]
pub struct Node {
    key: String,
    kind: NodeKind,
    pretty: String,
    value: Value,
    default: Value,
    hidden: bool,
    editable: bool,
    save: bool,
    save_if_none: bool,
    immediate: bool,
    base64: bool,
    declared_hidden: bool,
    declared_editable: bool,
    extended: bool,
    pending: Option<Value>,
    control: ControlSpec,
    cascade: Cascade,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

/// Kind-specific options collected during construction
#[derive(Default)]
struct KindOptions {
    read_only: bool,
    validator: Option<Validator>,
    min: Option<i64>,
    max: Option<i64>,
    den: Option<f64>,
    format: Option<String>,
    show_value: bool,
    suffix: Option<String>,
    align: Align,
    items: Vec<String>,
    file_type: FileType,
    height: Option<u32>,
}

impl Node {
    /// Construct a node of the given kind
    ///
    /// # Errors
    ///
    /// * `InvalidKey` - key is empty, contains `/` or starts with `$`
    /// * `InvalidOption` - an option outside the kind's whitelist was supplied
    /// * `InvalidOptionValue` - an option value is unusable (e.g. `min > max`,
    ///   or a default outside the kind's value class)
    pub fn new(
        kind: NodeKind,
        key: impl Into<String>,
        options: impl IntoIterator<Item = NodeOption>,
    ) -> Result<Self> {
        let key = key.into();
        validate_key(&key)?;

        let mut node = Node::blank(kind, key);

        let mut extra = KindOptions::default();
        for option in options {
            if !kind.accepts_option(option.name()) {
                return Err(CfgTreeError::InvalidOption {
                    key: node.key.clone(),
                    kind: kind.name().to_string(),
                    option: option.name().to_string(),
                });
            }
            match option {
                NodeOption::Pretty(p) => node.pretty = p,
                NodeOption::Default(v) => node.default = v,
                NodeOption::Save(b) => {
                    node.save = b;
                    node.cascade.save = Some(b);
                }
                NodeOption::SaveIfNone(b) => {
                    node.save_if_none = b;
                    node.cascade.save_if_none = Some(b);
                }
                NodeOption::Hidden(b) => {
                    node.hidden = b;
                    node.cascade.hidden = Some(b);
                }
                NodeOption::Editable(b) => {
                    node.editable = b;
                    node.cascade.editable = Some(b);
                }
                NodeOption::Immediate(b) => {
                    node.immediate = b;
                    node.cascade.immediate = Some(b);
                }
                NodeOption::Base64(b) => node.base64 = b,
                NodeOption::ReadOnly(b) => extra.read_only = b,
                NodeOption::Validator(v) => extra.validator = Some(v),
                NodeOption::Min(n) => extra.min = Some(n),
                NodeOption::Max(n) => extra.max = Some(n),
                NodeOption::Den(d) => extra.den = Some(d),
                NodeOption::Format(f) => extra.format = Some(f),
                NodeOption::ShowValue(b) => extra.show_value = b,
                NodeOption::Suffix(s) => extra.suffix = Some(s),
                NodeOption::Align(a) => extra.align = a,
                NodeOption::Items(items) => extra.items = items,
                NodeOption::FileType(t) => extra.file_type = t,
                NodeOption::Height(h) => extra.height = Some(h),
            }
        }

        node.control = build_control(&node.key, kind, extra)?;
        node.declared_hidden = node.hidden;
        node.declared_editable = node.editable;

        if let Err(err) = node.check_value(&node.default, &node.key) {
            return Err(CfgTreeError::InvalidOptionValue {
                key: node.key.clone(),
                option: "default".to_string(),
                reason: err.to_string(),
            });
        }
        node.value = node.default.clone();

        Ok(node)
    }

    /// Subsection owning ordered children
    ///
    /// # Errors
    ///
    /// See [`Node::new`].
    pub fn subsection(
        key: impl Into<String>,
        options: impl IntoIterator<Item = NodeOption>,
    ) -> Result<Self> {
        Self::new(NodeKind::Subsection, key, options)
    }

    /// Free text / number input
    ///
    /// # Errors
    ///
    /// See [`Node::new`].
    pub fn input_box(
        key: impl Into<String>,
        options: impl IntoIterator<Item = NodeOption>,
    ) -> Result<Self> {
        Self::new(NodeKind::InputBox, key, options)
    }

    /// Integer input bounded by `min`/`max`
    ///
    /// # Errors
    ///
    /// See [`Node::new`].
    pub fn int(
        key: impl Into<String>,
        options: impl IntoIterator<Item = NodeOption>,
    ) -> Result<Self> {
        Self::new(NodeKind::Int, key, options)
    }

    /// Boolean check box
    ///
    /// # Errors
    ///
    /// See [`Node::new`].
    pub fn check_box(
        key: impl Into<String>,
        options: impl IntoIterator<Item = NodeOption>,
    ) -> Result<Self> {
        Self::new(NodeKind::CheckBox, key, options)
    }

    /// Integer slider
    ///
    /// # Errors
    ///
    /// See [`Node::new`].
    pub fn slider(
        key: impl Into<String>,
        options: impl IntoIterator<Item = NodeOption>,
    ) -> Result<Self> {
        Self::new(NodeKind::Slider, key, options)
    }

    /// Selection among fixed items; the value is the item index
    ///
    /// # Errors
    ///
    /// See [`Node::new`].
    pub fn combo_box(
        key: impl Into<String>,
        options: impl IntoIterator<Item = NodeOption>,
    ) -> Result<Self> {
        Self::new(NodeKind::ComboBox, key, options)
    }

    /// File or directory path picker
    ///
    /// # Errors
    ///
    /// See [`Node::new`].
    pub fn file_dialog(
        key: impl Into<String>,
        options: impl IntoIterator<Item = NodeOption>,
    ) -> Result<Self> {
        Self::new(NodeKind::FileDialog, key, options)
    }

    /// Editable list of values
    ///
    /// # Errors
    ///
    /// See [`Node::new`].
    pub fn list(
        key: impl Into<String>,
        options: impl IntoIterator<Item = NodeOption>,
    ) -> Result<Self> {
        Self::new(NodeKind::List, key, options)
    }

    /// Editable list of file paths
    ///
    /// # Errors
    ///
    /// See [`Node::new`].
    pub fn file_list(
        key: impl Into<String>,
        options: impl IntoIterator<Item = NodeOption>,
    ) -> Result<Self> {
        Self::new(NodeKind::FileList, key, options)
    }

    /// Multi-line text
    ///
    /// # Errors
    ///
    /// See [`Node::new`].
    pub fn edit_box(
        key: impl Into<String>,
        options: impl IntoIterator<Item = NodeOption>,
    ) -> Result<Self> {
        Self::new(NodeKind::EditBox, key, options)
    }

    /// Masked text input
    ///
    /// # Errors
    ///
    /// See [`Node::new`].
    pub fn password_edit(
        key: impl Into<String>,
        options: impl IntoIterator<Item = NodeOption>,
    ) -> Result<Self> {
        Self::new(NodeKind::PasswordEdit, key, options)
    }

    /// Persisted value without a control
    ///
    /// # Errors
    ///
    /// See [`Node::new`].
    pub fn private(
        key: impl Into<String>,
        options: impl IntoIterator<Item = NodeOption>,
    ) -> Result<Self> {
        Self::new(NodeKind::Private, key, options)
    }

    fn blank(kind: NodeKind, key: String) -> Self {
        Node {
            pretty: key.clone(),
            key,
            kind,
            value: Value::Null,
            default: Value::Null,
            hidden: false,
            editable: true,
            save: true,
            save_if_none: true,
            immediate: false,
            base64: false,
            declared_hidden: false,
            declared_editable: true,
            extended: false,
            pending: None,
            control: ControlSpec::None,
            cascade: Cascade::default(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Hidden subsection holding library-internal state
    pub(crate) fn internal_section(key: &str) -> Self {
        let mut node = Self::blank(NodeKind::Subsection, key.to_string());
        node.hidden = true;
        node.cascade.hidden = Some(true);
        node
    }

    /// Private node holding library-internal state
    pub(crate) fn internal_value(key: &str, default: Value, save_if_none: bool) -> Self {
        let mut node = Self::blank(NodeKind::Private, key.to_string());
        node.value = default.clone();
        node.default = default;
        node.save_if_none = save_if_none;
        node.cascade.save_if_none = Some(save_if_none);
        node
    }

    pub(crate) fn bare_root() -> Self {
        Self::blank(NodeKind::Root, "root".to_string())
    }

    pub(crate) fn root(options: impl IntoIterator<Item = NodeOption>) -> Result<Self> {
        Self::new(NodeKind::Root, "root", options)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Display label
    pub fn pretty(&self) -> &str {
        &self.pretty
    }

    /// Current value (`Null` means no value)
    pub fn get(&self) -> &Value {
        &self.value
    }

    /// Value declared with the `default` option
    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn is_savable(&self) -> bool {
        self.save
    }

    pub fn is_savable_if_none(&self) -> bool {
        self.save_if_none
    }

    /// Whether control edits apply to the value without a commit
    pub fn uses_immediate_update(&self) -> bool {
        self.immediate
    }

    /// Whether the persisted form is wrapped base64
    pub fn is_base64(&self) -> bool {
        self.base64
    }

    /// Hidden flag the node had once attached, before any runtime override
    pub fn declared_hidden(&self) -> bool {
        self.declared_hidden
    }

    /// Editable flag the node had once attached, before any runtime override
    pub fn declared_editable(&self) -> bool {
        self.declared_editable
    }

    /// Whether the node is persisted in the `$value/$hidden/$editable` form
    ///
    /// True once a document carried override keys for it, or whenever its
    /// hidden/editable flags diverge from the declared ones.
    pub fn is_extended(&self) -> bool {
        self.extended
            || self.hidden != self.declared_hidden
            || self.editable != self.declared_editable
    }

    /// Value buffered by a non-immediate control update, awaiting commit
    pub fn pending(&self) -> Option<&Value> {
        self.pending.as_ref()
    }

    /// Description of the control the renderer should build
    pub fn control_spec(&self) -> &ControlSpec {
        &self.control
    }

    pub fn cascade(&self) -> &Cascade {
        &self.cascade
    }

    pub fn is_subsection(&self) -> bool {
        self.kind.is_subsection()
    }

    pub fn value_class(&self) -> ValueClass {
        self.kind.value_class()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order (empty for leaves)
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Value rendered for logs and outlines; passwords are redacted
    pub fn display_value(&self) -> String {
        display_value(self.kind, &self.value)
    }

    /// Check a value against this node's class
    ///
    /// `path` is used for error context.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if the value does not belong to the node's class, or is
    /// an item index out of range for a combo box.
    pub fn check_value(&self, value: &Value, path: &str) -> Result<()> {
        let class = self.value_class();
        let mismatch = || CfgTreeError::TypeMismatch {
            path: path.to_string(),
            expected: class.name().to_string(),
            found: describe(value).to_string(),
        };
        if !class.accepts(value) {
            return Err(mismatch());
        }
        if let (ControlSpec::ComboBox { items }, Some(index)) = (&self.control, value.as_u64()) {
            if !items.is_empty() && index >= items.len() as u64 {
                return Err(CfgTreeError::TypeMismatch {
                    path: path.to_string(),
                    expected: format!("item index below {}", items.len()),
                    found: index.to_string(),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn assign(&mut self, value: Value) {
        self.value = value;
        self.pending = None;
    }

    pub(crate) fn buffer(&mut self, value: Value) {
        self.pending = Some(value);
    }

    pub(crate) fn take_pending(&mut self) -> Option<Value> {
        self.pending.take()
    }

    pub(crate) fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub(crate) fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    pub(crate) fn mark_extended(&mut self) {
        self.extended = true;
    }

    /// Apply the parent's cascading settings where this node has none of its
    /// own, then freeze the declared hidden/editable flags
    pub(crate) fn inherit(&mut self, parent: &Cascade) {
        fn take(own: &mut Option<bool>, flag: &mut bool, from_parent: Option<bool>) {
            if own.is_none() {
                if let Some(value) = from_parent {
                    *own = Some(value);
                    *flag = value;
                }
            }
        }

        take(&mut self.cascade.save, &mut self.save, parent.save);
        take(
            &mut self.cascade.save_if_none,
            &mut self.save_if_none,
            parent.save_if_none,
        );
        if self.kind != NodeKind::Private {
            take(&mut self.cascade.hidden, &mut self.hidden, parent.hidden);
            take(&mut self.cascade.editable, &mut self.editable, parent.editable);
            take(&mut self.cascade.immediate, &mut self.immediate, parent.immediate);
        }

        self.declared_hidden = self.hidden;
        self.declared_editable = self.editable;
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("value", &self.display_value())
            .field("hidden", &self.hidden)
            .field("editable", &self.editable)
            .field("extended", &self.is_extended())
            .field("children", &self.children)
            .finish()
    }
}

/// Render a value for humans, masking sensitive kinds
pub fn display_value(kind: NodeKind, value: &Value) -> String {
    if kind.is_sensitive() && !value.is_null() {
        return Sensitive::new(value).to_string();
    }
    super::value::value_text(value)
}

fn validate_key(key: &str) -> Result<()> {
    let reason = if key.is_empty() {
        "key cannot be empty"
    } else if key.contains('/') {
        "key cannot contain '/'"
    } else if key.starts_with('$') {
        "key cannot start with '$'"
    } else {
        return Ok(());
    };
    Err(CfgTreeError::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    })
}

fn build_control(key: &str, kind: NodeKind, extra: KindOptions) -> Result<ControlSpec> {
    let check_range = |min: i64, max: i64| {
        if min > max {
            Err(CfgTreeError::InvalidOptionValue {
                key: key.to_string(),
                option: "min".to_string(),
                reason: format!("min {} is greater than max {}", min, max),
            })
        } else {
            Ok(())
        }
    };

    let spec = match kind {
        NodeKind::Root | NodeKind::Subsection | NodeKind::Private => ControlSpec::None,
        NodeKind::InputBox => ControlSpec::InputBox {
            validator: extra.validator,
            read_only: extra.read_only,
        },
        NodeKind::Int => {
            let min = extra.min.unwrap_or(i32::MIN as i64);
            let max = extra.max.unwrap_or(i32::MAX as i64);
            check_range(min, max)?;
            ControlSpec::InputBox {
                validator: Some(Validator::Int { min, max }),
                read_only: extra.read_only,
            }
        }
        NodeKind::CheckBox => ControlSpec::CheckBox,
        NodeKind::Slider => {
            let min = extra.min.unwrap_or(0);
            let max = extra.max.unwrap_or(100);
            check_range(min, max)?;
            ControlSpec::Slider {
                min,
                max,
                den: extra.den.unwrap_or(1.0),
                format: extra.format.unwrap_or_else(|| "{}".to_string()),
                show_value: extra.show_value,
                suffix: extra.suffix.unwrap_or_default(),
                align: extra.align,
            }
        }
        NodeKind::ComboBox => ControlSpec::ComboBox { items: extra.items },
        NodeKind::FileDialog => ControlSpec::FileDialog {
            file_type: extra.file_type,
        },
        NodeKind::List => ControlSpec::List {
            validator: extra.validator,
            height: extra.height,
        },
        NodeKind::FileList => ControlSpec::FileList {
            height: extra.height,
        },
        NodeKind::EditBox => ControlSpec::EditBox {
            height: extra.height,
            read_only: extra.read_only,
        },
        NodeKind::PasswordEdit => ControlSpec::Password {
            read_only: extra.read_only,
        },
    };
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let node = Node::input_box("Name1", [NodeOption::Default(json!(17))]).unwrap();
        assert_eq!(node.key(), "Name1");
        assert_eq!(node.pretty(), "Name1");
        assert_eq!(node.get(), &json!(17));
        assert!(!node.is_hidden());
        assert!(node.is_editable());
        assert!(node.is_savable());
        assert!(node.is_savable_if_none());
        assert!(!node.uses_immediate_update());
        assert!(!node.is_extended());
    }

    #[test]
    fn test_unknown_option_fails_construction() {
        let err = Node::check_box("cb", [NodeOption::Items(vec!["a".to_string()])]).unwrap_err();
        match err {
            CfgTreeError::InvalidOption { key, kind, option } => {
                assert_eq!(key, "cb");
                assert_eq!(kind, "check_box");
                assert_eq!(option, "items");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_int_rejects_explicit_validator() {
        let err = Node::int("n", [NodeOption::Validator(Validator::NotEmpty)]).unwrap_err();
        assert!(matches!(err, CfgTreeError::InvalidOption { .. }));
    }

    #[test]
    fn test_int_derives_validator_from_bounds() {
        let node = Node::int("n", [NodeOption::Min(1), NodeOption::Max(9)]).unwrap();
        assert_eq!(
            node.control_spec().validator(),
            Some(&Validator::Int { min: 1, max: 9 })
        );
    }

    #[test]
    fn test_default_outside_value_class_fails() {
        let err = Node::slider("s", [NodeOption::Default(json!("loud"))]).unwrap_err();
        assert!(matches!(
            err,
            CfgTreeError::InvalidOptionValue { ref option, .. } if option == "default"
        ));
    }

    #[test]
    fn test_slider_min_above_max_fails() {
        let err = Node::slider("s", [NodeOption::Min(10), NodeOption::Max(1)]).unwrap_err();
        assert!(matches!(err, CfgTreeError::InvalidOptionValue { .. }));
    }

    #[test]
    fn test_combo_index_bounds() {
        let node = Node::combo_box(
            "c",
            [NodeOption::Items(vec!["a".into(), "b".into(), "c".into()])],
        )
        .unwrap();
        assert!(node.check_value(&json!(2), "c").is_ok());
        assert!(node.check_value(&json!(3), "c").is_err());
        assert!(node.check_value(&json!("a"), "c").is_err());
    }

    #[test]
    fn test_invalid_keys() {
        assert!(matches!(
            Node::input_box("", []),
            Err(CfgTreeError::InvalidKey { .. })
        ));
        assert!(matches!(
            Node::input_box("a/b", []),
            Err(CfgTreeError::InvalidKey { .. })
        ));
        assert!(matches!(
            Node::input_box("$value", []),
            Err(CfgTreeError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_inherit_fills_only_unset_settings() {
        let mut child = Node::input_box("c", [NodeOption::Hidden(false)]).unwrap();
        let parent = Cascade {
            hidden: Some(true),
            immediate: Some(true),
            save_if_none: Some(false),
            ..Cascade::default()
        };
        child.inherit(&parent);

        assert!(!child.is_hidden(), "explicit child setting wins");
        assert!(child.uses_immediate_update());
        assert!(!child.is_savable_if_none());
        assert_eq!(child.cascade().immediate, Some(true));
        assert!(!child.is_extended());
    }

    #[test]
    fn test_divergence_marks_extended() {
        let mut node = Node::input_box("n", []).unwrap();
        node.inherit(&Cascade::default());
        node.set_hidden(true);
        assert!(node.is_extended());
        node.set_hidden(false);
        assert!(!node.is_extended());
    }

    #[test]
    fn test_password_debug_is_redacted() {
        let node =
            Node::password_edit("pw", [NodeOption::Default(json!("hunter2"))]).unwrap();
        let debug = format!("{:?}", node);
        assert!(!debug.contains("hunter2"));
        assert_eq!(node.display_value(), "***REDACTED***");
    }
}
