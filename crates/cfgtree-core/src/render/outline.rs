use crate::config::ConfigTree;
use crate::errors::Result;
use crate::model::{ControlSpec, Node, NodeId, Value};

/// What the outline includes
#[derive(Debug, Clone, Copy, Default)]
pub struct OutlineOptions {
    /// Include hidden rows (marked `(hidden)`)
    pub show_hidden: bool,
}

/// Render the tree as an indented text outline
///
/// One line per row in display order: subsections by label, leaves as
/// `label: value`. Disabled leaves are marked `(disabled)`; password values
/// are masked.
///
/// # Errors
/// * `UnknownNode` - If the tree is inconsistent
pub fn outline(config: &ConfigTree, opts: &OutlineOptions) -> Result<String> {
    let tree = config.tree();
    let mut output = String::new();
    render_children(config, tree.root(), 0, opts, &mut output)?;
    Ok(output)
}

fn render_children(
    config: &ConfigTree,
    parent: NodeId,
    depth: usize,
    opts: &OutlineOptions,
    output: &mut String,
) -> Result<()> {
    let tree = config.tree();
    for &child in tree.node(parent)?.children() {
        let node = tree.node(child)?;
        let hidden = node.is_hidden();
        if hidden && !opts.show_hidden {
            continue;
        }

        output.push_str(&"  ".repeat(depth));
        output.push_str(node.pretty());
        if !node.is_subsection() {
            output.push_str(": ");
            output.push_str(&leaf_text(node));
            if node.kind().has_control() && !config.is_enabled(child) {
                output.push_str(" (disabled)");
            }
        }
        if hidden {
            output.push_str(" (hidden)");
        }
        output.push('\n');

        if node.is_subsection() {
            render_children(config, child, depth + 1, opts, output)?;
        }
    }
    Ok(())
}

fn leaf_text(node: &Node) -> String {
    match (node.control_spec(), node.get()) {
        (ControlSpec::ComboBox { items }, Value::Number(n)) => n
            .as_u64()
            .and_then(|i| items.get(i as usize))
            .cloned()
            .unwrap_or_else(|| node.display_value()),
        _ => node.display_value(),
    }
}
