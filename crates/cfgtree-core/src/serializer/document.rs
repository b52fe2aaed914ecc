use serde_json::Map;

use super::codec::{decode_value, encode_value};
use crate::errors::{CfgTreeError, Result};
use crate::model::{describe, NodeId, Value, ValueClass};
use crate::ops::{Tree, UpdateOrigin};

pub const EXT_VALUE: &str = "$value";
pub const EXT_HIDDEN: &str = "$hidden";
pub const EXT_EDITABLE: &str = "$editable";

const EXT_KEYS: [&str; 3] = [EXT_VALUE, EXT_HIDDEN, EXT_EDITABLE];

/// Flatten the tree into a document mapping
///
/// Non-savable nodes (and everything below a non-savable subsection) are
/// omitted, as are null leaves that are not savable-if-none. An extended
/// null leaf of that kind keeps its flags without a `$value`.
///
/// # Errors
///
/// `Serialization` if a base64 node's value cannot be rendered as YAML.
pub fn to_document(tree: &Tree) -> Result<Value> {
    let mut out = Map::new();
    write_children(tree, tree.root(), &mut out)?;
    Ok(Value::Object(out))
}

fn write_children(tree: &Tree, parent: NodeId, out: &mut Map<String, Value>) -> Result<()> {
    for &child in tree.node(parent)?.children() {
        let node = tree.node(child)?;
        if !node.is_savable() {
            continue;
        }
        if node.is_subsection() {
            let mut inner = Map::new();
            write_children(tree, child, &mut inner)?;
            if node.is_extended() {
                inner.insert(EXT_HIDDEN.to_string(), Value::Bool(node.is_hidden()));
                inner.insert(EXT_EDITABLE.to_string(), Value::Bool(node.is_editable()));
            }
            out.insert(node.key().to_string(), Value::Object(inner));
            continue;
        }

        let value = node.get();
        if value.is_null() && !node.is_savable_if_none() {
            // flags survive without a `$value`, so the default stays on load
            if node.is_extended() {
                let mut ext = Map::new();
                ext.insert(EXT_HIDDEN.to_string(), Value::Bool(node.is_hidden()));
                ext.insert(EXT_EDITABLE.to_string(), Value::Bool(node.is_editable()));
                out.insert(node.key().to_string(), Value::Object(ext));
            }
            continue;
        }
        let stored = if node.is_base64() && !value.is_null() {
            Value::String(encode_value(value)?)
        } else {
            value.clone()
        };
        // a plain value shaped like the extended form must be wrapped to
        // read back unambiguously
        let stored = if node.is_extended() || is_extended_form(&stored) {
            let mut ext = Map::new();
            ext.insert(EXT_VALUE.to_string(), stored);
            ext.insert(EXT_HIDDEN.to_string(), Value::Bool(node.is_hidden()));
            ext.insert(EXT_EDITABLE.to_string(), Value::Bool(node.is_editable()));
            Value::Object(ext)
        } else {
            stored
        };
        out.insert(node.key().to_string(), stored);
    }
    Ok(())
}

fn is_extended_form(value: &Value) -> bool {
    value.as_object().is_some_and(is_extended_map)
}

fn is_extended_map(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.keys().all(|k| EXT_KEYS.contains(&k.as_str()))
}

/// A leaf fragment with its extended overrides separated out
#[derive(Debug, Clone, PartialEq)]
pub struct Extended {
    /// `None` if an extended fragment carries no `$value`
    pub value: Option<Value>,
    pub hidden: Option<bool>,
    pub editable: Option<bool>,
    /// True if the fragment was in extended form
    pub marked: bool,
}

/// Split a leaf fragment into its value and `$hidden/$editable` overrides
///
/// A mapping whose keys are all extended keys is the extended form. Any
/// other mapping is a value only if the class accepts mappings.
///
/// # Errors
///
/// * `TypeMismatch` - a plain mapping for a class that does not take one
/// * `MalformedDocument` - `$hidden`/`$editable` is not a bool
pub fn check_extended(fragment: &Value, class: ValueClass, path: &str) -> Result<Extended> {
    if let Some(map) = fragment.as_object().filter(|map| is_extended_map(map)) {
        return Ok(Extended {
            value: map.get(EXT_VALUE).cloned(),
            hidden: flag(map, EXT_HIDDEN, path)?,
            editable: flag(map, EXT_EDITABLE, path)?,
            marked: true,
        });
    }
    if fragment.is_object() && !class.accepts_mappings() {
        return Err(CfgTreeError::TypeMismatch {
            path: path.to_string(),
            expected: class.name().to_string(),
            found: describe(fragment).to_string(),
        });
    }
    Ok(Extended {
        value: Some(fragment.clone()),
        hidden: None,
        editable: None,
        marked: false,
    })
}

fn flag(map: &Map<String, Value>, key: &str, path: &str) -> Result<Option<bool>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(CfgTreeError::MalformedDocument {
            path: path.to_string(),
            reason: format!("{} must be a bool, found {}", key, describe(other)),
        }),
    }
}

struct Planned {
    node: NodeId,
    value: Option<Value>,
    hidden: Option<bool>,
    editable: Option<bool>,
    marked: bool,
}

/// Apply a document to the tree
///
/// Keys missing from the document leave the in-memory value untouched;
/// unknown keys are ignored. The whole document is checked before anything
/// is applied, so a document error leaves the tree unchanged.
///
/// # Errors
///
/// * `MalformedDocument` - the document or a subsection fragment is not a
///   mapping, or an extended flag is not a bool
/// * `TypeMismatch` - a value outside its node's class
/// * `Base64Decode` - an undecodable base64 leaf
pub fn apply_document(tree: &mut Tree, document: &Value, origin: UpdateOrigin) -> Result<()> {
    let map = match document {
        Value::Object(map) => map,
        Value::Null => return Ok(()),
        other => {
            return Err(CfgTreeError::MalformedDocument {
                path: String::new(),
                reason: format!("expected a mapping at the top level, found {}", describe(other)),
            })
        }
    };

    let mut plan = Vec::new();
    plan_children(tree, tree.root(), map, &mut plan)?;

    for entry in plan {
        if let Some(hidden) = entry.hidden {
            tree.set_hidden(entry.node, hidden)?;
        }
        if let Some(editable) = entry.editable {
            tree.set_editable(entry.node, editable)?;
        }
        if entry.marked {
            tree.mark_extended(entry.node)?;
        }
        if let Some(value) = entry.value {
            tree.set_value(entry.node, value, origin)?;
        }
    }
    Ok(())
}

fn plan_children(
    tree: &Tree,
    parent: NodeId,
    map: &Map<String, Value>,
    plan: &mut Vec<Planned>,
) -> Result<()> {
    let children = tree.node(parent)?.children();
    for key in map.keys() {
        if !EXT_KEYS.contains(&key.as_str()) && tree.find_child(parent, key).is_none() {
            tracing::debug!(parent = %tree.path_of(parent), key = %key, "ignoring unknown document key");
        }
    }

    for &child in children {
        let node = tree.node(child)?;
        let Some(fragment) = map.get(node.key()) else {
            continue;
        };
        let path = tree.path_of(child);

        if node.is_subsection() {
            let Value::Object(inner) = fragment else {
                return Err(CfgTreeError::MalformedDocument {
                    path,
                    reason: format!("expected a mapping, found {}", describe(fragment)),
                });
            };
            plan_children(tree, child, inner, plan)?;
            let hidden = flag(inner, EXT_HIDDEN, &path)?;
            let editable = flag(inner, EXT_EDITABLE, &path)?;
            plan.push(Planned {
                node: child,
                value: None,
                hidden,
                editable,
                marked: hidden.is_some() || editable.is_some(),
            });
            continue;
        }

        let ext = check_extended(fragment, node.value_class(), &path)?;
        let value = match ext.value {
            Some(Value::String(text)) if node.is_base64() => Some(decode_value(&text, &path)?),
            Some(Value::Null) => Some(Value::Null),
            None => None,
            Some(other) if node.is_base64() => {
                return Err(CfgTreeError::MalformedDocument {
                    path,
                    reason: format!("expected base64 text, found {}", describe(&other)),
                })
            }
            Some(other) => Some(other),
        };
        if let Some(value) = &value {
            node.check_value(value, &path)?;
        }
        plan.push(Planned {
            node: child,
            value,
            hidden: ext.hidden,
            editable: ext.editable,
            marked: ext.marked,
        });
    }
    Ok(())
}
