use crate::errors::{CfgTreeError, Result};
use crate::model::{Node, NodeId, NodeOption, Value};

/// Where a value update came from
///
/// Listeners use the origin to avoid bouncing an update back to its source:
/// a control-originated change is never pushed into the control it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOrigin {
    /// Programmatic `set` by the host application
    Model,
    /// User edit of a bound control
    Control,
    /// Applied from a persisted document
    Load,
}

/// A recorded change, drained by the owner of the tree and dispatched to the
/// sync layer and the dependency engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Value { node: NodeId, origin: UpdateOrigin },
    Hidden { node: NodeId },
    Editable { node: NodeId },
}

/// Arena of nodes anchored at the root subsection
///
/// Nodes are never removed, so a `NodeId` stays valid for the life of the
/// tree. Not thread-safe; designed for single-threaded use.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    changes: Vec<Change>,
}

impl Tree {
    /// Create a tree with a bare root
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::bare_root()],
            changes: Vec::new(),
        }
    }

    /// Create a tree whose root carries cascading defaults
    ///
    /// # Errors
    ///
    /// `InvalidOption` if an option is not accepted by the root.
    pub fn with_root_options(options: impl IntoIterator<Item = NodeOption>) -> Result<Self> {
        Ok(Self {
            nodes: vec![Node::root(options)?],
            changes: Vec::new(),
        })
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Get a node by id
    ///
    /// # Errors
    ///
    /// Returns `UnknownNode` if the id does not belong to this tree.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id.0)
            .ok_or(CfgTreeError::UnknownNode { id: id.0 })
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id.0)
            .ok_or(CfgTreeError::UnknownNode { id: id.0 })
    }

    /// Attach a node under the root
    ///
    /// # Errors
    ///
    /// See [`Tree::add_child`].
    pub fn add(&mut self, node: Node) -> Result<NodeId> {
        self.add_child(self.root(), node)
    }

    /// Append a node to a subsection
    ///
    /// The parent's cascading settings are applied to the child here, once;
    /// later changes on the parent do not flow down.
    ///
    /// # Errors
    ///
    /// * `NotASubsection` - parent is a leaf
    /// * `DuplicateKey` - parent already has a child with the same key
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> Result<NodeId> {
        let parent_node = self.node(parent)?;
        if !parent_node.is_subsection() {
            return Err(CfgTreeError::NotASubsection {
                key: parent_node.key().to_string(),
            });
        }
        if self.find_child(parent, node.key()).is_some() {
            return Err(CfgTreeError::DuplicateKey {
                parent: self.display_path(parent),
                key: node.key().to_string(),
            });
        }

        tracing::debug!(
            parent = %self.display_path(parent),
            key = node.key(),
            kind = node.kind().name(),
            "attached node"
        );
        Ok(self.attach(parent, node))
    }

    /// Attach without checks; `parent` must be a subsection of this tree
    /// with no child of the same key
    pub(crate) fn attach(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        if let Some(parent_node) = self.nodes.get_mut(parent.0) {
            node.inherit(parent_node.cascade());
            parent_node.children.push(id);
        }
        node.parent = Some(parent);
        self.nodes.push(node);
        id
    }

    /// Direct child of `parent` with the given key
    pub fn find_child(&self, parent: NodeId, key: &str) -> Option<NodeId> {
        let parent = self.nodes.get(parent.0)?;
        parent
            .children()
            .iter()
            .copied()
            .find(|child| self.nodes[child.0].key() == key)
    }

    /// Get-or-create a child by key
    ///
    /// Returns the existing child if present. Otherwise the supplied default
    /// node is attached and returned.
    ///
    /// # Errors
    ///
    /// * `NodeNotFound` - no such child and no default supplied
    /// * `InvalidKey` - the default's key differs from `key`
    /// * any error of [`Tree::add_child`]
    pub fn get_child(&mut self, parent: NodeId, key: &str, default: Option<Node>) -> Result<NodeId> {
        if let Some(id) = self.find_child(parent, key) {
            return Ok(id);
        }
        match default {
            Some(node) if node.key() == key => self.add_child(parent, node),
            Some(node) => Err(CfgTreeError::InvalidKey {
                key: node.key().to_string(),
                reason: format!("default node does not match requested key '{}'", key),
            }),
            None => Err(CfgTreeError::NodeNotFound {
                path: join_path(&self.path_of(parent), key),
            }),
        }
    }

    /// Resolve a `/`-separated path from the root
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if any segment fails to match, or if the path
    /// is empty or contains an empty segment.
    pub fn get_node(&self, path: &str) -> Result<NodeId> {
        self.resolve_from(self.root(), path)
    }

    /// Resolve a `/`-separated path relative to a subsection
    ///
    /// # Errors
    ///
    /// See [`Tree::get_node`].
    pub fn resolve_from(&self, start: NodeId, path: &str) -> Result<NodeId> {
        let not_found = || CfgTreeError::NodeNotFound {
            path: path.to_string(),
        };
        if path.is_empty() {
            return Err(not_found());
        }
        let mut current = start;
        for segment in path.split('/') {
            if segment.is_empty() {
                return Err(not_found());
            }
            current = self.find_child(current, segment).ok_or_else(not_found)?;
        }
        Ok(current)
    }

    /// Path of a node from the root; the root itself is the empty path
    pub fn path_of(&self, id: NodeId) -> String {
        let mut keys = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(node) = self.nodes.get(node_id.0) else {
                break;
            };
            if node.parent.is_none() {
                break;
            }
            keys.push(node.key());
            current = node.parent;
        }
        keys.reverse();
        keys.join("/")
    }

    fn display_path(&self, id: NodeId) -> String {
        let path = self.path_of(id);
        if path.is_empty() {
            "root".to_string()
        } else {
            path
        }
    }

    /// Every node below `id` in pre-order (insertion order), `id` excluded
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.nodes.get(id.0) {
            Some(node) => node.children().iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next.0].children().iter().rev().copied());
        }
        out
    }

    /// True if the node or any ancestor is hidden
    pub fn is_effectively_hidden(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            match self.nodes.get(node_id.0) {
                Some(node) if node.is_hidden() => return true,
                Some(node) => current = node.parent,
                None => return false,
            }
        }
        false
    }

    /// True if the node and every ancestor are editable
    pub fn is_effectively_editable(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            match self.nodes.get(node_id.0) {
                Some(node) if !node.is_editable() => return false,
                Some(node) => current = node.parent,
                None => return false,
            }
        }
        true
    }

    /// Assign a value and record the change
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if the value does not belong to the node's class.
    pub fn set_value(&mut self, id: NodeId, value: Value, origin: UpdateOrigin) -> Result<()> {
        let path = self.path_of(id);
        let node = self.node_mut(id)?;
        node.check_value(&value, &path)?;
        node.assign(value);
        tracing::debug!(
            path = %path,
            value = %node.display_value(),
            origin = ?origin,
            "value assigned"
        );
        self.changes.push(Change::Value { node: id, origin });
        Ok(())
    }

    /// Control-originated update
    ///
    /// Applies immediately when the node uses immediate update, otherwise
    /// buffers the value until [`Tree::commit`]. Returns whether the value
    /// was applied.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if the value does not belong to the node's class.
    pub fn update_value(&mut self, id: NodeId, value: Value) -> Result<bool> {
        let path = self.path_of(id);
        let node = self.node_mut(id)?;
        node.check_value(&value, &path)?;
        if node.uses_immediate_update() {
            self.set_value(id, value, UpdateOrigin::Control)?;
            Ok(true)
        } else {
            node.buffer(value);
            Ok(false)
        }
    }

    /// Apply a buffered control value, if any; returns whether one was applied
    ///
    /// # Errors
    ///
    /// Returns `UnknownNode` for a foreign id.
    pub fn commit(&mut self, id: NodeId) -> Result<bool> {
        match self.node_mut(id)?.take_pending() {
            Some(value) => {
                self.set_value(id, value, UpdateOrigin::Control)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drop every buffered control value
    pub fn discard_pending(&mut self) {
        for node in &mut self.nodes {
            node.take_pending();
        }
    }

    /// Set the hidden flag; records a change only if the flag flipped
    ///
    /// # Errors
    ///
    /// Returns `UnknownNode` for a foreign id.
    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) -> Result<()> {
        let node = self.node_mut(id)?;
        if node.is_hidden() != hidden {
            node.set_hidden(hidden);
            self.changes.push(Change::Hidden { node: id });
        }
        Ok(())
    }

    /// Set the editable flag; records a change only if the flag flipped
    ///
    /// # Errors
    ///
    /// Returns `UnknownNode` for a foreign id.
    pub fn set_editable(&mut self, id: NodeId, editable: bool) -> Result<()> {
        let node = self.node_mut(id)?;
        if node.is_editable() != editable {
            node.set_editable(editable);
            self.changes.push(Change::Editable { node: id });
        }
        Ok(())
    }

    pub(crate) fn mark_extended(&mut self, id: NodeId) -> Result<()> {
        self.node_mut(id)?.mark_extended();
        Ok(())
    }

    /// Drain the recorded changes in the order they happened
    pub fn take_changes(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.changes)
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}/{}", parent, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> (Tree, NodeId, NodeId) {
        let mut tree = Tree::new();
        let ss1 = tree.add(Node::subsection("ss1", []).unwrap()).unwrap();
        let name1 = tree
            .add_child(ss1, Node::input_box("Name1", [NodeOption::Default(json!(17))]).unwrap())
            .unwrap();
        (tree, ss1, name1)
    }

    #[test]
    fn test_get_node_resolves_nested_path() {
        let (tree, ss1, name1) = sample();
        assert_eq!(tree.get_node("ss1").unwrap(), ss1);
        assert_eq!(tree.get_node("ss1/Name1").unwrap(), name1);
        assert_eq!(tree.path_of(name1), "ss1/Name1");
    }

    #[test]
    fn test_get_node_never_partially_matches() {
        let (tree, _, _) = sample();
        for path in ["", "ss1/", "/ss1", "ss1//Name1", "ss1/Name2", "ss2/Name1", "ss1/Name1/x"] {
            assert!(
                matches!(tree.get_node(path), Err(CfgTreeError::NodeNotFound { .. })),
                "path {:?} resolved",
                path
            );
        }
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let (mut tree, ss1, _) = sample();
        let err = tree
            .add_child(ss1, Node::input_box("Name1", []).unwrap())
            .unwrap_err();
        assert_eq!(
            err,
            CfgTreeError::DuplicateKey {
                parent: "ss1".to_string(),
                key: "Name1".to_string()
            }
        );
    }

    #[test]
    fn test_children_only_on_subsections() {
        let (mut tree, _, name1) = sample();
        let err = tree
            .add_child(name1, Node::input_box("x", []).unwrap())
            .unwrap_err();
        assert!(matches!(err, CfgTreeError::NotASubsection { .. }));
    }

    #[test]
    fn test_get_child_is_get_or_create() {
        let (mut tree, ss1, name1) = sample();
        let same = tree
            .get_child(ss1, "Name1", Some(Node::input_box("Name1", []).unwrap()))
            .unwrap();
        assert_eq!(same, name1);
        assert_eq!(tree.node(name1).unwrap().get(), &json!(17));

        assert!(tree.get_child(ss1, "Name9", None).is_err());
        let created = tree
            .get_child(ss1, "Name9", Some(Node::input_box("Name9", []).unwrap()))
            .unwrap();
        assert_eq!(tree.get_node("ss1/Name9").unwrap(), created);
        assert_eq!(tree.node(ss1).unwrap().children(), &[name1, created]);
    }

    #[test]
    fn test_cascade_applies_at_attach_time_only() {
        let mut tree = Tree::new();
        let ss3 = tree
            .add(Node::subsection("ss3", [NodeOption::Hidden(true)]).unwrap())
            .unwrap();
        let inner = tree.add_child(ss3, Node::subsection("inner", []).unwrap()).unwrap();
        let deep = tree.add_child(inner, Node::input_box("deep", []).unwrap()).unwrap();
        assert!(tree.node(deep).unwrap().is_hidden());
        assert!(!tree.node(deep).unwrap().is_extended());

        tree.set_hidden(ss3, false).unwrap();
        let late = tree.add_child(ss3, Node::input_box("late", []).unwrap()).unwrap();
        assert!(tree.node(deep).unwrap().is_hidden());
        assert!(tree.node(late).unwrap().is_hidden(), "declared cascade is kept");
    }

    #[test]
    fn test_update_value_buffers_without_immediate() {
        let (mut tree, _, name1) = sample();
        assert!(!tree.update_value(name1, json!(20)).unwrap());
        assert_eq!(tree.node(name1).unwrap().get(), &json!(17));
        assert_eq!(tree.node(name1).unwrap().pending(), Some(&json!(20)));

        assert!(tree.commit(name1).unwrap());
        assert_eq!(tree.node(name1).unwrap().get(), &json!(20));
        assert!(!tree.commit(name1).unwrap());
    }

    #[test]
    fn test_update_value_applies_with_immediate() {
        let mut tree = Tree::with_root_options([NodeOption::Immediate(true)]).unwrap();
        let n = tree.add(Node::int("n", []).unwrap()).unwrap();
        assert!(tree.update_value(n, json!(5)).unwrap());
        assert_eq!(tree.node(n).unwrap().get(), &json!(5));
        assert_eq!(
            tree.take_changes(),
            vec![Change::Value {
                node: n,
                origin: UpdateOrigin::Control
            }]
        );
    }

    #[test]
    fn test_set_value_checks_class() {
        let mut tree = Tree::new();
        let n = tree.add(Node::check_box("flag", []).unwrap()).unwrap();
        let err = tree.set_value(n, json!("yes"), UpdateOrigin::Model).unwrap_err();
        assert!(matches!(err, CfgTreeError::TypeMismatch { ref path, .. } if path == "flag"));
        assert!(tree.take_changes().is_empty());
    }

    #[test]
    fn test_flag_changes_recorded_only_on_flip() {
        let (mut tree, _, name1) = sample();
        tree.set_hidden(name1, false).unwrap();
        assert!(tree.take_changes().is_empty());
        tree.set_editable(name1, false).unwrap();
        assert_eq!(tree.take_changes(), vec![Change::Editable { node: name1 }]);
        assert!(tree.node(name1).unwrap().is_extended());
    }

    #[test]
    fn test_descendants_preorder() {
        let (mut tree, ss1, name1) = sample();
        let ss2 = tree.add(Node::subsection("ss2", []).unwrap()).unwrap();
        let b = tree.add_child(ss2, Node::check_box("b", []).unwrap()).unwrap();
        assert_eq!(tree.descendants(tree.root()), vec![ss1, name1, ss2, b]);
        assert!(!tree.is_effectively_hidden(b));
        tree.set_hidden(ss2, true).unwrap();
        assert!(tree.is_effectively_hidden(b));
    }

    #[test]
    fn test_effectively_editable_follows_ancestors() {
        let (mut tree, ss1, name1) = sample();
        assert!(tree.is_effectively_editable(name1));
        tree.set_editable(ss1, false).unwrap();
        assert!(!tree.is_effectively_editable(name1));
        assert!(tree.node(name1).unwrap().is_editable());
        tree.set_editable(ss1, true).unwrap();
        tree.set_editable(name1, false).unwrap();
        assert!(!tree.is_effectively_editable(name1));
        assert!(tree.is_effectively_editable(ss1));
    }
}
