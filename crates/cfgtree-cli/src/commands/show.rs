//! Show command
//!
//! Usage: cfgtree show --schema <FILE> [--config <FILE>] [--encoded] [--all]

use cfgtree_core::render::OutlineOptions;
use clap::Args;

use super::{open_tree, TreeArgs};

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub tree: TreeArgs,

    /// Include hidden rows
    #[arg(short, long)]
    pub all: bool,
}

pub fn execute(args: ShowArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = open_tree(&args.tree)?;
    let outline = config.outline(&OutlineOptions {
        show_hidden: args.all,
    })?;
    print!("{}", outline);
    Ok(())
}
