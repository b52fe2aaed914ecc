//! Get and set commands
//!
//! Usage:
//!   cfgtree get --schema <FILE> --config <FILE> <PATH>
//!   cfgtree set --schema <FILE> --config <FILE> <PATH> <VALUE>

use cfgtree_core::{ConfigTree, Value};
use cfgtree_store::{save_file, SaveOptions};
use clap::Args;

use super::{open_tree, TreeArgs};

#[derive(Debug, Args)]
pub struct GetArgs {
    #[command(flatten)]
    pub tree: TreeArgs,

    /// Slash-separated node path, e.g. `network/port`
    pub path: String,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    #[command(flatten)]
    pub tree: TreeArgs,

    /// Slash-separated node path
    pub path: String,

    /// New value, parsed as YAML (`8080`, `true`, `"text"`, `[a, b]`, `null`)
    pub value: String,
}

pub fn execute_get(args: GetArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = open_tree(&args.tree)?;
    println!("{}", render_value(&config, &args.path)?);
    Ok(())
}

/// Leaves print their display text; subsections print their saved fragment
fn render_value(config: &ConfigTree, path: &str) -> Result<String, Box<dyn std::error::Error>> {
    let id = config.get_node(path)?;
    let node = config.node(id)?;
    if !node.is_subsection() {
        return Ok(node.display_value());
    }
    let document = config.to_document()?;
    let fragment = path
        .split('/')
        .try_fold(&document, |doc, key| doc.get(key))
        .cloned()
        .unwrap_or(Value::Null);
    Ok(serde_yaml::to_string(&fragment)?.trim_end().to_string())
}

pub fn execute_set(args: SetArgs) -> Result<(), Box<dyn std::error::Error>> {
    let target = args
        .tree
        .config
        .clone()
        .ok_or("set needs --config to know where to save")?;
    let mut config = open_tree(&args.tree)?;

    let id = config.get_node(&args.path)?;
    let value: Value = serde_yaml::from_str(&args.value)?;
    config.set(id, value)?;

    save_file(
        &config,
        &target,
        SaveOptions {
            encoded: args.tree.encoded,
        },
    )?;
    println!("✓ {} = {}", args.path, config.node(id)?.display_value());
    Ok(())
}
