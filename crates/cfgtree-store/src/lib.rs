//! cfgtree store - file persistence for configuration trees
//!
//! Provides:
//! - Plain and whole-document-encoded YAML config files
//! - Atomic writes (temp file + rename)
//! - Schema Format v0 parser and builder for declaring trees in YAML

pub mod atomic;
pub mod errors;
pub mod file;
pub mod schema;

// Re-export key types
pub use errors::Result;
pub use file::{load_file, save_file, LoadOptions, SaveOptions};
pub use schema::{build_config, parse_schema_file, parse_schema_str, SchemaV0};
