pub mod codec;
pub mod show;
pub mod value;

use std::path::{Path, PathBuf};

use cfgtree_core::ConfigTree;
use cfgtree_store::{build_config, load_file, parse_schema_file, LoadOptions};
use clap::Args;

/// Schema and config file shared by the tree commands
#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Schema file declaring the tree (schema format v0)
    #[arg(short, long)]
    pub schema: PathBuf,

    /// Config file holding the values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// The config file is a single base64 blob
    #[arg(short, long)]
    pub encoded: bool,
}

/// Build the declared tree and load the config file into it, if present
pub fn open_tree(args: &TreeArgs) -> Result<ConfigTree, Box<dyn std::error::Error>> {
    let schema = parse_schema_file(&args.schema)?;
    let mut config = build_config(&schema)?;
    if let Some(path) = &args.config {
        let loaded = load_file(
            &mut config,
            path,
            LoadOptions {
                encoded: args.encoded,
                emit: false,
            },
        )?;
        if !loaded {
            tracing::info!(file = %path.display(), "config file not found, using defaults");
        }
    }
    Ok(config)
}

/// Write to `output`, or to stdout when none is given
pub fn emit(output: Option<&Path>, text: &str) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            println!("✓ Written to {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}
