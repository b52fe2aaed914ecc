//! Build a `ConfigTree` from a parsed schema

use std::time::Instant;

use cfgtree_core::{log_op_end, log_op_error, log_op_start};
use cfgtree_core::{ConfigTree, Node, NodeId, NodeOption, Value};

use crate::errors::{core_error, Result};
use crate::schema::format_v0::{SchemaNode, SchemaV0};

const OP: &str = "build_config";

/// Declare every node, then register every dependency
///
/// Option bags are checked against each kind's whitelist; dependency ends are
/// resolved by path. Any failure is a declaration error.
pub fn build_config(schema: &SchemaV0) -> Result<ConfigTree> {
    log_op_start!(OP, node_count = schema.nodes.len() as u64);
    let start = Instant::now();

    let config = build_config_impl(schema).map_err(|e| {
        log_op_error!(OP, e.clone(), duration_ms = start.elapsed().as_millis() as u64);
        e
    })?;

    log_op_end!(
        OP,
        duration_ms = start.elapsed().as_millis() as u64,
        rule_count = config.dependencies().rule_count() as u64
    );
    Ok(config)
}

fn build_config_impl(schema: &SchemaV0) -> Result<ConfigTree> {
    let root_options = options_of("root", &schema.root)?;
    let mut config = ConfigTree::with_root_options(root_options).map_err(|e| core_error(OP, e))?;

    let root = config.root();
    for node in &schema.nodes {
        declare(&mut config, root, node)?;
    }

    for dependency in &schema.dependencies {
        let master = config
            .get_node(&dependency.master)
            .map_err(|e| core_error(OP, e))?;
        let slaves = dependency
            .slaves
            .iter()
            .map(|path| config.get_node(path))
            .collect::<cfgtree_core::Result<Vec<_>>>()
            .map_err(|e| core_error(OP, e))?;
        config
            .add_dependency(master, slaves, dependency.predicate.clone().into())
            .map_err(|e| core_error(OP, e))?;
    }

    // construction-time notifications are of no interest to the host
    config.drain_events();
    Ok(config)
}

fn declare(config: &mut ConfigTree, parent: NodeId, decl: &SchemaNode) -> Result<()> {
    let options = options_of(&decl.key, &decl.options)?;
    let node = Node::new(decl.kind, decl.key.clone(), options).map_err(|e| core_error(OP, e))?;
    let id = config.add_child(parent, node).map_err(|e| core_error(OP, e))?;
    for child in &decl.children {
        declare(config, id, child)?;
    }
    Ok(())
}

fn options_of<'a>(
    key: &str,
    bag: impl IntoIterator<Item = (&'a String, &'a Value)>,
) -> Result<Vec<NodeOption>> {
    bag.into_iter()
        .map(|(name, value)| NodeOption::from_pair(key, name, value))
        .collect::<cfgtree_core::Result<Vec<_>>>()
        .map_err(|e| core_error(OP, e))
}
