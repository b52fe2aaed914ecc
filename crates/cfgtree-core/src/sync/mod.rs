//! Sync layer between nodes and their rendered controls.
//!
//! The rendering collaborator supplies controls through [`ControlFactory`];
//! the core only ever talks to them through the [`Control`] capability
//! surface. Rows are laid out in pre-order below the root, one row per node,
//! and a [`ControlId`] is the row index.
//!
//! Edits flow control → node through [`SyncLayer::on_control_changed`]
//! (immediate nodes) or [`SyncLayer::commit`] (everything else). Model
//! changes flow node → control through [`SyncLayer::push_value`], which never
//! re-enters the edit path.

pub mod headless;

use std::collections::HashMap;

use crate::errors::{CfgTreeError, Result};
use crate::model::{Node, NodeId, Value};
use crate::ops::{Tree, UpdateOrigin};

/// Capability surface of a rendered control
pub trait Control {
    /// Current typed content of the control
    fn value(&self) -> Value;

    /// Display a value; must not be reported back as a user edit
    fn set_value(&mut self, value: &Value);

    /// Whether the content satisfies the control's own format rule
    fn is_ok(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);

    fn set_visible(&mut self, visible: bool);

    fn is_enabled(&self) -> bool;

    fn is_visible(&self) -> bool;
}

/// Creates controls for nodes; returns `None` for nodes it does not render
pub trait ControlFactory {
    fn create_control(&mut self, node: &Node) -> Option<Box<dyn Control>>;
}

/// Row position of a node in the rendered tree (pre-order, root excluded)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(pub usize);

impl std::fmt::Display for ControlId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}", self.0)
    }
}

struct Row {
    node: NodeId,
    control: Option<Box<dyn Control>>,
    has_children: bool,
    expanded: bool,
}

/// Bidirectional node ↔ row ↔ control bindings of one editor session
pub struct SyncLayer {
    rows: Vec<Row>,
    by_node: HashMap<NodeId, usize>,
}

impl SyncLayer {
    /// Create one row per node and ask the factory for each leaf's control
    ///
    /// Controls start out showing the node value, with visibility and
    /// editability taken from the node flags.
    pub fn build(tree: &Tree, factory: &mut dyn ControlFactory) -> Result<Self> {
        let mut rows = Vec::new();
        let mut by_node = HashMap::new();

        for id in tree.descendants(tree.root()) {
            let node = tree.node(id)?;
            let control = if node.kind().has_control() {
                factory.create_control(node).map(|mut control| {
                    control.set_value(node.get());
                    control.set_visible(!tree.is_effectively_hidden(id));
                    control.set_enabled(tree.is_effectively_editable(id));
                    control
                })
            } else {
                None
            };
            by_node.insert(id, rows.len());
            rows.push(Row {
                node: id,
                control,
                has_children: !node.children().is_empty(),
                expanded: false,
            });
        }

        tracing::debug!(
            rows = rows.len(),
            controls = rows.iter().filter(|r| r.control.is_some()).count(),
            "sync layer built"
        );
        Ok(Self { rows, by_node })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn control_count(&self) -> usize {
        self.rows.iter().filter(|row| row.control.is_some()).count()
    }

    /// Row of a node
    pub fn control_id(&self, node: NodeId) -> Option<ControlId> {
        self.by_node.get(&node).copied().map(ControlId)
    }

    /// Node shown on a row
    pub fn node_of(&self, id: ControlId) -> Option<NodeId> {
        self.rows.get(id.0).map(|row| row.node)
    }

    /// Control on a row, if the row has one
    pub fn control(&self, id: ControlId) -> Option<&dyn Control> {
        self.rows.get(id.0)?.control.as_deref()
    }

    /// Mutable control on a row, if the row has one
    pub fn control_mut(&mut self, id: ControlId) -> Option<&mut dyn Control> {
        match self.rows.get_mut(id.0)?.control.as_mut() {
            Some(control) => Some(control.as_mut()),
            None => None,
        }
    }

    /// Control bound to a node
    pub fn control_for(&self, node: NodeId) -> Option<&dyn Control> {
        self.control(self.control_id(node)?)
    }

    fn control_for_mut(&mut self, node: NodeId) -> Option<&mut dyn Control> {
        let id = self.control_id(node)?;
        self.control_mut(id)
    }

    /// Value a dependency sees for a node: the live control content when the
    /// control is well-formed, the node value otherwise
    pub fn live_value(&self, tree: &Tree, node: NodeId) -> Value {
        match self.control_for(node) {
            Some(control) if control.is_ok() => control.value(),
            _ => tree
                .node(node)
                .map(|n| n.get().clone())
                .unwrap_or(Value::Null),
        }
    }

    /// Handle a user edit of a control
    ///
    /// An ill-formed control never writes into its node. Otherwise the value
    /// goes through the node's immediate/deferred update. Returns the node
    /// whose value changed, if any.
    ///
    /// # Errors
    ///
    /// * `UnknownControl` - the id is not a row with a control
    /// * `TypeMismatch` - the control produced a value outside the node's class
    pub fn on_control_changed(&self, tree: &mut Tree, id: ControlId) -> Result<Option<NodeId>> {
        let (node, control) = self
            .rows
            .get(id.0)
            .and_then(|row| row.control.as_deref().map(|control| (row.node, control)))
            .ok_or(CfgTreeError::UnknownControl { id: id.0 })?;

        if !control.is_ok() {
            tracing::debug!(control = %id, "control content invalid, node left unchanged");
            return Ok(None);
        }
        let applied = tree.update_value(node, control.value())?;
        Ok(applied.then_some(node))
    }

    /// Pull every well-formed control's content into its node
    ///
    /// Buffered values are dropped afterwards. Returns the nodes whose value
    /// changed.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if a control produced a value outside its node's class.
    pub fn commit(&self, tree: &mut Tree) -> Result<Vec<NodeId>> {
        let mut changed = Vec::new();
        for row in &self.rows {
            let Some(control) = row.control.as_deref() else {
                continue;
            };
            if !control.is_ok() {
                continue;
            }
            let value = control.value();
            if tree.node(row.node)?.get() != &value {
                tree.set_value(row.node, value, UpdateOrigin::Control)?;
                changed.push(row.node);
            }
        }
        tree.discard_pending();
        Ok(changed)
    }

    /// Show a node value in its control without triggering the edit path
    pub fn push_value(&mut self, node: NodeId, value: &Value) {
        if let Some(control) = self.control_for_mut(node) {
            control.set_value(value);
        }
    }

    /// Re-apply visibility to a node's row and every row below it
    pub fn refresh_visibility(&mut self, tree: &Tree, node: NodeId) {
        let mut affected = vec![node];
        affected.extend(tree.descendants(node));
        for id in affected {
            let visible = !tree.is_effectively_hidden(id);
            if let Some(control) = self.control_for_mut(id) {
                control.set_visible(visible);
            }
        }
    }

    pub fn set_enabled(&mut self, node: NodeId, enabled: bool) {
        if let Some(control) = self.control_for_mut(node) {
            control.set_enabled(enabled);
        }
    }

    /// Apply computed enablement to a batch of rows, typically a node and
    /// its descendants
    pub fn refresh_enabled(&mut self, states: impl IntoIterator<Item = (NodeId, bool)>) {
        for (node, enabled) in states {
            self.set_enabled(node, enabled);
        }
    }

    /// True iff every control reports itself well-formed
    pub fn all_ok(&self) -> bool {
        self.rows
            .iter()
            .filter_map(|row| row.control.as_deref())
            .all(|control| control.is_ok())
    }

    /// Nodes that currently have a control
    pub fn bound_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.rows
            .iter()
            .filter(|row| row.control.is_some())
            .map(|row| row.node)
    }

    /// Expand or collapse a row
    ///
    /// # Errors
    ///
    /// Returns `UnknownControl` for a foreign row.
    pub fn set_expanded(&mut self, id: ControlId, expanded: bool) -> Result<()> {
        let row = self
            .rows
            .get_mut(id.0)
            .ok_or(CfgTreeError::UnknownControl { id: id.0 })?;
        row.expanded = expanded;
        Ok(())
    }

    pub fn is_expanded(&self, id: ControlId) -> bool {
        self.rows.get(id.0).is_some_and(|row| row.expanded)
    }

    /// Expanded state as a bitstring, one char per row with children, in
    /// pre-order (`1` expanded, `0` collapsed)
    pub fn collapsed(&self) -> String {
        self.rows
            .iter()
            .filter(|row| row.has_children)
            .map(|row| if row.expanded { '1' } else { '0' })
            .collect()
    }

    /// Apply a bitstring produced by [`SyncLayer::collapsed`]
    ///
    /// A shorter string applies as far as it goes; extra chars are ignored.
    pub fn set_collapsed(&mut self, bits: &str) {
        let mut bits = bits.chars();
        for row in self.rows.iter_mut().filter(|row| row.has_children) {
            match bits.next() {
                Some(bit) => row.expanded = bit == '1',
                None => break,
            }
        }
    }
}

impl std::fmt::Debug for SyncLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncLayer")
            .field("rows", &self.rows.len())
            .field("controls", &self.control_count())
            .finish()
    }
}
