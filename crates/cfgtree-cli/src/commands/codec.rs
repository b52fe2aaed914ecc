//! Encode and decode commands
//!
//! Usage: cfgtree encode|decode <INPUT> [--output <FILE>]

use std::fs;
use std::path::PathBuf;

use cfgtree_core::serializer::{decode_document, encode_document};
use clap::Args;

use super::emit;

#[derive(Debug, Args)]
pub struct CodecArgs {
    /// Config file to convert
    pub input: PathBuf,

    /// Output file path (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn execute_encode(args: CodecArgs) -> Result<(), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(&args.input)?;
    // reject files that would not load back
    serde_yaml::from_str::<serde_json::Value>(&text)?;
    emit(args.output.as_deref(), &format!("{}\n", encode_document(&text)))
}

pub fn execute_decode(args: CodecArgs) -> Result<(), Box<dyn std::error::Error>> {
    let blob = fs::read_to_string(&args.input)?;
    emit(args.output.as_deref(), &decode_document(&blob)?)
}
