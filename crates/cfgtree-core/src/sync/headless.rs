//! Headless controls
//!
//! Reference implementation of the control capability surface without any
//! GUI. Used by the CLI and by tests to drive the sync layer.

use crate::model::{ControlSpec, Node, NodeKind, Validator, Value};

use super::{Control, ControlFactory};

/// In-memory control holding a typed value
#[derive(Debug, Clone)]
pub struct HeadlessControl {
    kind: NodeKind,
    spec: ControlSpec,
    content: Value,
    enabled: bool,
    visible: bool,
}

impl HeadlessControl {
    pub fn new(node: &Node) -> Self {
        Self {
            kind: node.kind(),
            spec: node.control_spec().clone(),
            content: node.get().clone(),
            enabled: true,
            visible: true,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Raw content as last set, before any coercion
    pub fn content(&self) -> &Value {
        &self.content
    }
}

/// Text typed into a numeric input becomes a number once it parses
fn coerce(validator: Option<&Validator>, content: &Value) -> Value {
    let Value::String(text) = content else {
        return content.clone();
    };
    match validator {
        Some(Validator::Int { .. }) => text
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| content.clone()),
        Some(Validator::Float { .. }) => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| content.clone()),
        _ => content.clone(),
    }
}

impl Control for HeadlessControl {
    fn value(&self) -> Value {
        coerce(self.spec.validator(), &self.content)
    }

    fn set_value(&mut self, value: &Value) {
        self.content = value.clone();
    }

    fn is_ok(&self) -> bool {
        match &self.spec {
            ControlSpec::Slider { min, max, .. } => match self.content.as_i64() {
                Some(n) => n >= *min && n <= *max,
                None => self.content.is_null(),
            },
            ControlSpec::ComboBox { items } => match self.content.as_u64() {
                Some(index) => items.is_empty() || index < items.len() as u64,
                None => self.content.is_null(),
            },
            spec => match spec.validator() {
                Some(validator) => validator.validate(&self.content),
                None => self.kind.value_class().accepts(&self.content),
            },
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Factory creating a [`HeadlessControl`] for every node kind with a control
#[derive(Debug, Default)]
pub struct HeadlessFactory {
    created: usize,
}

impl HeadlessFactory {
    /// Number of controls created so far
    pub fn created(&self) -> usize {
        self.created
    }
}

impl ControlFactory for HeadlessFactory {
    fn create_control(&mut self, node: &Node) -> Option<Box<dyn Control>> {
        if !node.kind().has_control() {
            return None;
        }
        self.created += 1;
        Some(Box::new(HeadlessControl::new(node)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeOption;
    use serde_json::json;

    #[test]
    fn test_int_input_coerces_text() {
        let node = Node::int("n", [NodeOption::Min(0), NodeOption::Max(10)]).unwrap();
        let mut control = HeadlessControl::new(&node);
        control.set_value(&json!("7"));
        assert!(control.is_ok());
        assert_eq!(control.value(), json!(7));

        control.set_value(&json!("11"));
        assert!(!control.is_ok());
        control.set_value(&json!("seven"));
        assert!(!control.is_ok());
        assert_eq!(control.value(), json!("seven"));
    }

    #[test]
    fn test_slider_bounds() {
        let node = Node::slider("s", [NodeOption::Min(-10), NodeOption::Max(10)]).unwrap();
        let mut control = HeadlessControl::new(&node);
        assert!(control.is_ok());
        control.set_value(&json!(12));
        assert!(!control.is_ok());
        control.set_value(&json!(-10));
        assert!(control.is_ok());
    }

    #[test]
    fn test_checkbox_rejects_text() {
        let node = Node::check_box("c", []).unwrap();
        let mut control = HeadlessControl::new(&node);
        control.set_value(&json!(true));
        assert!(control.is_ok());
        control.set_value(&json!("true"));
        assert!(!control.is_ok());
    }

    #[test]
    fn test_factory_skips_subsections() {
        let mut factory = HeadlessFactory::default();
        assert!(factory
            .create_control(&Node::subsection("s", []).unwrap())
            .is_none());
        assert!(factory
            .create_control(&Node::private("p", []).unwrap())
            .is_none());
        assert!(factory
            .create_control(&Node::edit_box("e", []).unwrap())
            .is_some());
        assert_eq!(factory.created(), 1);
    }
}
