//! cfgtree CLI
//!
//! Headless host for declarative configuration trees: inspect and edit a
//! config file against its schema without a GUI.

use cfgtree_core::logging_facility::{init, Profile};
use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "cfgtree")]
#[command(about = "cfgtree - Declarative configuration trees", long_about = None)]
struct Cli {
    /// Log operations to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the tree outline with current values
    Show(commands::show::ShowArgs),
    /// Print the value stored at a path
    Get(commands::value::GetArgs),
    /// Assign a value at a path and save the config file
    Set(commands::value::SetArgs),
    /// Wrap a plain config file as a single base64 blob
    Encode(commands::codec::CodecArgs),
    /// Unwrap an encoded config file
    Decode(commands::codec::CodecArgs),
}

fn main() {
    let cli = Cli::parse();
    if cli.verbose {
        init(Profile::Development);
    }

    let result = match cli.command {
        Commands::Show(args) => commands::show::execute(args),
        Commands::Get(args) => commands::value::execute_get(args),
        Commands::Set(args) => commands::value::execute_set(args),
        Commands::Encode(args) => commands::codec::execute_encode(args),
        Commands::Decode(args) => commands::codec::execute_decode(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
