//! `ConfigTree` facade.
//!
//! Owns the node tree, the dependency rules, the optional editor session and
//! the outbox of host events. Every mutation goes through here so that value,
//! visibility and editability changes reach the bound controls and the
//! dependency engine exactly once, in order.
//!
//! ## Internal section
//!
//! A hidden subsection named [`INTERNAL_SECTION`] is created first in every
//! tree. It persists UI state: the expanded-row bitstring and the paths
//! force-hidden or force-disabled at runtime. Those lists are applied after
//! the value pass of a load, so they win over construction-time flags.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use crate::dependency::{DependencyEngine, Predicate};
use crate::errors::{CfgTreeError, Result};
use crate::model::{Node, NodeId, NodeOption, Value};
use crate::ops::{Change, Tree, UpdateOrigin};
use crate::render::{outline, OutlineOptions};
use crate::serializer::{apply_document, to_document};
use crate::sync::{Control, ControlFactory, ControlId, SyncLayer};
use crate::{log_op_end, log_op_error, log_op_start};

/// Key of the reserved internal section
pub const INTERNAL_SECTION: &str = "cfgtree";
/// Expanded-row bitstring
pub const INTERNAL_COLLAPSED: &str = "collapsed";
/// Paths force-hidden at runtime
pub const INTERNAL_HIDDEN: &str = "hidden";
/// Paths force-disabled at runtime
pub const INTERNAL_DISABLED: &str = "disabled";

/// Notification for the host application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigEvent {
    ValueChanged { node: NodeId, origin: UpdateOrigin },
    /// Whether every control of the open editor is well-formed
    ConfigValid(bool),
}

#[derive(Debug, Clone, Copy)]
struct Internal {
    section: NodeId,
    collapsed: NodeId,
    hidden: NodeId,
    disabled: NodeId,
}

impl Internal {
    fn attach(tree: &mut Tree) -> Self {
        let root = tree.root();
        let section = tree.attach(root, Node::internal_section(INTERNAL_SECTION));
        let collapsed = tree.attach(
            section,
            Node::internal_value(INTERNAL_COLLAPSED, Value::String(String::new()), true),
        );
        let hidden = tree.attach(section, Node::internal_value(INTERNAL_HIDDEN, Value::Null, false));
        let disabled =
            tree.attach(section, Node::internal_value(INTERNAL_DISABLED, Value::Null, false));
        Self {
            section,
            collapsed,
            hidden,
            disabled,
        }
    }
}

/// A declared configuration tree with its dependency rules and editor
#[derive(Debug)]
pub struct ConfigTree {
    tree: Tree,
    deps: DependencyEngine,
    dep_state: BTreeMap<NodeId, bool>,
    editor: Option<SyncLayer>,
    events: Vec<ConfigEvent>,
    internal: Internal,
}

impl ConfigTree {
    pub fn new() -> Self {
        Self::from_tree(Tree::new())
    }

    /// Create a tree whose root passes cascading defaults (e.g. `immediate`)
    /// to everything attached below it
    ///
    /// # Errors
    ///
    /// `InvalidOption` if an option is not accepted by the root.
    pub fn with_root_options(options: impl IntoIterator<Item = NodeOption>) -> Result<Self> {
        Ok(Self::from_tree(Tree::with_root_options(options)?))
    }

    fn from_tree(mut tree: Tree) -> Self {
        let internal = Internal::attach(&mut tree);
        tree.take_changes();
        Self {
            tree,
            deps: DependencyEngine::new(),
            dep_state: BTreeMap::new(),
            editor: None,
            events: Vec::new(),
            internal,
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    /// The reserved internal section
    pub fn internal_section(&self) -> NodeId {
        self.internal.section
    }

    // ===== Declaration =====

    /// Attach a node under the root
    ///
    /// # Errors
    ///
    /// See [`Tree::add_child`].
    pub fn add(&mut self, node: Node) -> Result<NodeId> {
        self.tree.add(node)
    }

    /// Attach a node under a subsection
    ///
    /// # Errors
    ///
    /// See [`Tree::add_child`].
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> Result<NodeId> {
        self.tree.add_child(parent, node)
    }

    /// Get-or-create a child by key
    ///
    /// # Errors
    ///
    /// See [`Tree::get_child`].
    pub fn get_child(&mut self, parent: NodeId, key: &str, default: Option<Node>) -> Result<NodeId> {
        self.tree.get_child(parent, key, default)
    }

    /// Register a dependency rule and evaluate it against the current value
    ///
    /// # Errors
    ///
    /// `UnknownNode` if the master or a slave does not belong to this tree.
    pub fn add_dependency(
        &mut self,
        master: NodeId,
        slaves: Vec<NodeId>,
        predicate: Predicate,
    ) -> Result<()> {
        self.tree.node(master)?;
        for &slave in &slaves {
            self.tree.node(slave)?;
        }
        tracing::debug!(
            master = %self.tree.path_of(master),
            slaves = slaves.len(),
            predicate = ?predicate,
            "dependency registered"
        );
        self.deps.add_rule(master, slaves, predicate);
        self.reevaluate(master);
        self.emit_validity();
        Ok(())
    }

    /// Register several dependency rules
    ///
    /// # Errors
    ///
    /// See [`ConfigTree::add_dependency`]; rules before the failing one stay
    /// registered.
    pub fn add_dependencies(
        &mut self,
        rules: impl IntoIterator<Item = (NodeId, Vec<NodeId>, Predicate)>,
    ) -> Result<()> {
        for (master, slaves, predicate) in rules {
            self.add_dependency(master, slaves, predicate)?;
        }
        Ok(())
    }

    pub fn dependencies(&self) -> &DependencyEngine {
        &self.deps
    }

    // ===== Lookup =====

    /// Resolve a `/`-separated path from the root
    ///
    /// # Errors
    ///
    /// See [`Tree::get_node`].
    pub fn get_node(&self, path: &str) -> Result<NodeId> {
        self.tree.get_node(path)
    }

    /// # Errors
    ///
    /// Returns `UnknownNode` for a foreign id.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.tree.node(id)
    }

    /// Current value of the node at `path`
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the path does not resolve.
    pub fn get(&self, path: &str) -> Result<&Value> {
        Ok(self.tree.node(self.tree.get_node(path)?)?.get())
    }

    /// Whether a node's control is enabled: the node and its ancestors are
    /// editable and every dependency rule targeting one of them holds
    pub fn is_enabled(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Ok(node) = self.tree.node(node_id) else {
                return false;
            };
            if !node.is_editable() || !self.dep_state.get(&node_id).copied().unwrap_or(true) {
                return false;
            }
            current = node.parent();
        }
        true
    }

    // ===== Mutation =====

    /// Programmatic assignment; pushed into the bound control, if any
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if the value does not belong to the node's class.
    pub fn set(&mut self, id: NodeId, value: Value) -> Result<()> {
        self.tree.set_value(id, value, UpdateOrigin::Model)?;
        self.dispatch(true)
    }

    /// # Errors
    ///
    /// Returns `UnknownNode` for a foreign id.
    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) -> Result<()> {
        self.tree.set_hidden(id, hidden)?;
        self.dispatch(true)
    }

    /// # Errors
    ///
    /// Returns `UnknownNode` for a foreign id.
    pub fn set_editable(&mut self, id: NodeId, editable: bool) -> Result<()> {
        self.tree.set_editable(id, editable)?;
        self.dispatch(true)
    }

    /// Hide a node and remember the path in the persisted hidden list
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the path does not resolve.
    pub fn force_hide(&mut self, path: &str) -> Result<()> {
        let id = self.tree.get_node(path)?;
        self.remember_path(self.internal.hidden, path)?;
        self.tree.set_hidden(id, true)?;
        self.dispatch(true)
    }

    /// Disable a node and remember the path in the persisted disabled list
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the path does not resolve.
    pub fn force_disable(&mut self, path: &str) -> Result<()> {
        let id = self.tree.get_node(path)?;
        self.remember_path(self.internal.disabled, path)?;
        self.tree.set_editable(id, false)?;
        self.dispatch(true)
    }

    fn remember_path(&mut self, list: NodeId, path: &str) -> Result<()> {
        let mut paths = self.internal_paths(list)?;
        if !paths.iter().any(|p| p == path) {
            paths.push(path.to_string());
            self.tree.set_value(list, Value::from(paths), UpdateOrigin::Model)?;
        }
        Ok(())
    }

    fn internal_paths(&self, list: NodeId) -> Result<Vec<String>> {
        paths_from(self.tree.node(list)?.get(), &self.tree.path_of(list))
    }

    /// Re-evaluate every dependency rule
    pub fn recheck_all(&mut self) {
        let states = self.deps.evaluate_all(&|id| self.value_of(id));
        for (slave, ok) in states {
            self.dep_state.insert(slave, ok);
            self.apply_enabled(slave);
        }
        self.emit_validity();
    }

    fn reevaluate(&mut self, master: NodeId) {
        let states = self.deps.evaluate_for(master, &|id| self.value_of(id));
        for (slave, ok) in states {
            self.dep_state.insert(slave, ok);
            self.apply_enabled(slave);
        }
    }

    /// Value dependencies see: live control content while an editor is open
    fn value_of(&self, id: NodeId) -> Value {
        match &self.editor {
            Some(sync) => sync.live_value(&self.tree, id),
            None => self
                .tree
                .node(id)
                .map(|node| node.get().clone())
                .unwrap_or(Value::Null),
        }
    }

    /// Push enablement to the node's control and every control below it
    fn apply_enabled(&mut self, id: NodeId) {
        if self.editor.is_none() {
            return;
        }
        let mut affected = vec![id];
        affected.extend(self.tree.descendants(id));
        let states: Vec<(NodeId, bool)> = affected
            .into_iter()
            .map(|node| (node, self.is_enabled(node)))
            .collect();
        if let Some(sync) = self.editor.as_mut() {
            sync.refresh_enabled(states);
        }
    }

    /// Route recorded tree changes to the editor, the dependency engine and
    /// the host outbox
    fn dispatch(&mut self, emit_load: bool) -> Result<()> {
        let mut masters = BTreeSet::new();
        for change in self.tree.take_changes() {
            match change {
                Change::Value { node, origin } => {
                    if origin != UpdateOrigin::Control {
                        if let Some(sync) = self.editor.as_mut() {
                            sync.push_value(node, self.tree.node(node)?.get());
                        }
                    }
                    if origin != UpdateOrigin::Load || emit_load {
                        self.events.push(ConfigEvent::ValueChanged { node, origin });
                    }
                    if self.deps.is_master(node) {
                        masters.insert(node);
                    }
                }
                Change::Hidden { node } => {
                    if let Some(sync) = self.editor.as_mut() {
                        sync.refresh_visibility(&self.tree, node);
                    }
                }
                Change::Editable { node } => self.apply_enabled(node),
            }
        }
        for master in masters {
            self.reevaluate(master);
        }
        self.emit_validity();
        Ok(())
    }

    fn emit_validity(&mut self) {
        if let Some(sync) = &self.editor {
            self.events.push(ConfigEvent::ConfigValid(sync.all_ok()));
        }
    }

    /// True iff every control of the open editor is well-formed (always true
    /// without an editor)
    pub fn is_valid(&self) -> bool {
        self.editor.as_ref().map(SyncLayer::all_ok).unwrap_or(true)
    }

    // ===== Documents =====

    /// Flatten the tree into a document mapping
    ///
    /// # Errors
    ///
    /// `Serialization` if a base64 node's value cannot be rendered.
    pub fn to_document(&self) -> Result<Value> {
        to_document(&self.tree)
    }

    /// Apply a persisted document
    ///
    /// Values are applied first, then the internal hidden/disabled lists.
    /// Paths in those lists that no longer resolve are skipped. With `emit`,
    /// loaded values are reported as `ValueChanged` events.
    ///
    /// # Errors
    ///
    /// Document errors (`MalformedDocument`, `TypeMismatch`,
    /// `Base64Decode`); the tree is left unchanged.
    pub fn apply_document(&mut self, document: &Value, emit: bool) -> Result<()> {
        let section = document.get(INTERNAL_SECTION);
        let hidden_paths = internal_list(section, INTERNAL_HIDDEN)?;
        let disabled_paths = internal_list(section, INTERNAL_DISABLED)?;

        apply_document(&mut self.tree, document, UpdateOrigin::Load)?;

        for path in &hidden_paths {
            match self.tree.get_node(path) {
                Ok(id) => self.tree.set_hidden(id, true)?,
                Err(_) => tracing::warn!(path = %path, "stale force-hidden path skipped"),
            }
        }
        for path in &disabled_paths {
            match self.tree.get_node(path) {
                Ok(id) => self.tree.set_editable(id, false)?,
                Err(_) => tracing::warn!(path = %path, "stale force-disabled path skipped"),
            }
        }

        if let Some(sync) = self.editor.as_mut() {
            if let Some(bits) = self.tree.node(self.internal.collapsed)?.get().as_str() {
                sync.set_collapsed(bits);
            }
        }

        self.dispatch(emit)?;
        self.recheck_all();
        Ok(())
    }

    /// Render the document as YAML text
    ///
    /// # Errors
    ///
    /// `Serialization` if the document cannot be rendered.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.to_document()?)?)
    }

    /// Parse YAML text and apply it as a document
    ///
    /// # Errors
    ///
    /// `Serialization` for invalid YAML, otherwise as
    /// [`ConfigTree::apply_document`].
    pub fn load_yaml(&mut self, text: &str, emit: bool) -> Result<()> {
        let document: Value = serde_yaml::from_str(text)?;
        self.apply_document(&document, emit)
    }

    /// Text outline of the tree
    ///
    /// # Errors
    ///
    /// See [`outline`].
    pub fn outline(&self, opts: &OutlineOptions) -> Result<String> {
        outline(self, opts)
    }

    // ===== Editor session =====

    /// Build controls for every row and bind them
    ///
    /// # Errors
    ///
    /// `EditorAlreadyOpen` if a session is open.
    pub fn open_editor(&mut self, factory: &mut dyn ControlFactory) -> Result<()> {
        log_op_start!("open_editor");
        let start = Instant::now();

        self.open_editor_impl(factory).map_err(|e| {
            log_op_error!(
                "open_editor",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "open_editor",
            duration_ms = start.elapsed().as_millis() as u64,
            control_count = self.editor.as_ref().map(SyncLayer::control_count).unwrap_or(0) as u64
        );
        Ok(())
    }

    fn open_editor_impl(&mut self, factory: &mut dyn ControlFactory) -> Result<()> {
        if self.editor.is_some() {
            return Err(CfgTreeError::EditorAlreadyOpen);
        }
        let mut sync = SyncLayer::build(&self.tree, factory)?;
        if let Some(bits) = self.tree.node(self.internal.collapsed)?.get().as_str() {
            sync.set_collapsed(bits);
        }
        let bound: Vec<NodeId> = sync.bound_nodes().collect();
        self.editor = Some(sync);
        for id in bound {
            self.apply_enabled(id);
        }
        self.recheck_all();
        Ok(())
    }

    pub fn is_editing(&self) -> bool {
        self.editor.is_some()
    }

    pub fn editor(&self) -> Option<&SyncLayer> {
        self.editor.as_ref()
    }

    /// Row of a node in the open editor
    pub fn control_id(&self, node: NodeId) -> Option<ControlId> {
        self.editor.as_ref()?.control_id(node)
    }

    /// Control bound to a node in the open editor
    pub fn control(&self, node: NodeId) -> Option<&dyn Control> {
        self.editor.as_ref()?.control_for(node)
    }

    /// Notify that the user edited a control
    ///
    /// Well-formed content goes through the node's immediate or deferred
    /// update; ill-formed content stays in the control only. Rules mastered
    /// by the node are re-evaluated against the live content either way.
    ///
    /// # Errors
    ///
    /// * `EditorNotOpen` - no session is open
    /// * `UnknownControl` - the row has no control
    /// * `TypeMismatch` - the control produced a value outside the node's class
    pub fn control_changed(&mut self, id: ControlId) -> Result<()> {
        let sync = self.editor.as_ref().ok_or(CfgTreeError::EditorNotOpen)?;
        let node = sync
            .node_of(id)
            .ok_or(CfgTreeError::UnknownControl { id: id.0 })?;
        sync.on_control_changed(&mut self.tree, id)?;
        if self.deps.is_master(node) {
            self.reevaluate(node);
        }
        self.dispatch(true)
    }

    /// Put a value into a control as if the user typed it, then report the
    /// edit
    ///
    /// # Errors
    ///
    /// See [`ConfigTree::control_changed`].
    pub fn edit_control(&mut self, id: ControlId, value: Value) -> Result<()> {
        let sync = self.editor.as_mut().ok_or(CfgTreeError::EditorNotOpen)?;
        let control = sync
            .control_mut(id)
            .ok_or(CfgTreeError::UnknownControl { id: id.0 })?;
        control.set_value(&value);
        self.control_changed(id)
    }

    /// Expand or collapse a row of the open editor
    ///
    /// # Errors
    ///
    /// `EditorNotOpen` or `UnknownControl`.
    pub fn set_expanded(&mut self, id: ControlId, expanded: bool) -> Result<()> {
        self.editor
            .as_mut()
            .ok_or(CfgTreeError::EditorNotOpen)?
            .set_expanded(id, expanded)
    }

    /// Pull every well-formed control value into its node without closing
    /// the editor; without an editor, apply buffered values. Returns the
    /// nodes whose value changed.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if a control produced a value outside its node's class.
    pub fn commit_pending(&mut self) -> Result<Vec<NodeId>> {
        let changed = match &self.editor {
            Some(sync) => sync.commit(&mut self.tree)?,
            None => {
                let mut changed = Vec::new();
                for id in self.tree.descendants(self.tree.root()) {
                    if self.tree.commit(id)? {
                        changed.push(id);
                    }
                }
                changed
            }
        };
        self.dispatch(true)?;
        Ok(changed)
    }

    /// Commit every control, store the expanded-row state and close the
    /// editor. Returns the nodes whose value changed.
    ///
    /// # Errors
    ///
    /// `EditorNotOpen`, or a commit error (the editor stays open).
    pub fn accept_editor(&mut self) -> Result<Vec<NodeId>> {
        log_op_start!("accept_editor");
        let start = Instant::now();

        let changed = self.accept_editor_impl().map_err(|e| {
            log_op_error!(
                "accept_editor",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "accept_editor",
            duration_ms = start.elapsed().as_millis() as u64,
            node_count = changed.len() as u64
        );
        Ok(changed)
    }

    fn accept_editor_impl(&mut self) -> Result<Vec<NodeId>> {
        let sync = self.editor.as_ref().ok_or(CfgTreeError::EditorNotOpen)?;
        let changed = sync.commit(&mut self.tree)?;
        let bits = sync.collapsed();
        self.tree
            .set_value(self.internal.collapsed, Value::String(bits), UpdateOrigin::Model)?;
        self.dispatch(true)?;
        self.editor = None;
        self.recheck_all();
        Ok(changed)
    }

    /// Close the editor, abandoning every uncommitted control value
    ///
    /// # Errors
    ///
    /// `EditorNotOpen` if no session is open.
    pub fn reject_editor(&mut self) -> Result<()> {
        if self.editor.take().is_none() {
            return Err(CfgTreeError::EditorNotOpen);
        }
        self.tree.discard_pending();
        self.recheck_all();
        tracing::debug!("editor rejected, pending values discarded");
        Ok(())
    }

    /// Take the host events recorded so far
    pub fn drain_events(&mut self) -> Vec<ConfigEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Default for ConfigTree {
    fn default() -> Self {
        Self::new()
    }
}

fn internal_list(section: Option<&Value>, key: &str) -> Result<Vec<String>> {
    let path = format!("{}/{}", INTERNAL_SECTION, key);
    match section.and_then(|s| s.get(key)) {
        None => Ok(Vec::new()),
        Some(value) => paths_from(value, &path),
    }
}

fn paths_from(value: &Value, path: &str) -> Result<Vec<String>> {
    let malformed = || CfgTreeError::MalformedDocument {
        path: path.to_string(),
        reason: "expected a list of node paths".to_string(),
    };
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(malformed))
            .collect(),
        _ => Err(malformed()),
    }
}
