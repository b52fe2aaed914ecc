//! cfgtree core - declarative configuration trees
//!
//! This crate provides:
//! - Typed nodes with per-kind option whitelists and value classes
//! - The node tree with path lookup and attach-time cascading
//! - The dependency engine (master/slave rules, AND across rules)
//! - The serializer (document mapping, per-node base64, extended metadata)
//! - The sync layer binding nodes to rendered controls
//! - The `ConfigTree` facade tying them together

pub mod config;
pub mod dependency;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod ops;
pub mod render;
pub mod serializer;
pub mod sync;

pub use cfgtree_core_types::schema;

// Re-export commonly used types
pub use config::{ConfigEvent, ConfigTree, INTERNAL_SECTION};
pub use dependency::{DependencyEngine, Predicate};
pub use errors::{CfgTreeError, ExError, ExErrorKind, Result};
pub use model::{Node, NodeId, NodeKind, NodeOption, Validator, Value};
pub use ops::{Tree, UpdateOrigin};
pub use sync::{Control, ControlFactory, ControlId};
