//! Declarative tree schemas
//!
//! Provides:
//! - Schema Format v0 (YAML)
//! - Parser with structural validation
//! - Builder producing a ready `ConfigTree`

pub mod builder;
pub mod format_v0;
pub mod parser;

pub use builder::build_config;
pub use format_v0::{SchemaDependency, SchemaNode, SchemaPredicate, SchemaV0};
pub use parser::{parse_schema_file, parse_schema_str};
