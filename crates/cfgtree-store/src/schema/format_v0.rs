//! Schema Format v0
//!
//! Defines the YAML structure declaring a configuration tree

use std::collections::BTreeMap;

use cfgtree_core::{NodeKind, Predicate, Value};
use serde::{Deserialize, Serialize};

/// Top-level schema file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaV0 {
    /// Schema version (must be 0 for this format)
    pub schema_version: u32,

    /// Cascading defaults given to the root
    #[serde(default)]
    pub root: BTreeMap<String, Value>,

    /// Top-level nodes, in display order
    #[serde(default)]
    pub nodes: Vec<SchemaNode>,

    #[serde(default)]
    pub dependencies: Vec<SchemaDependency>,
}

/// Node declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaNode {
    pub kind: NodeKind,

    pub key: String,

    /// Option bag, checked against the kind's whitelist when built
    #[serde(default)]
    pub options: BTreeMap<String, Value>,

    /// Children (subsections only)
    #[serde(default)]
    pub children: Vec<SchemaNode>,
}

/// Dependency rule between nodes addressed by path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDependency {
    pub master: String,
    pub slaves: Vec<String>,
    /// `{ not_equal: 12 }` or a bare `not_empty`
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub predicate: SchemaPredicate,
}

/// Serializable subset of [`Predicate`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaPredicate {
    Equal(Value),
    NotEqual(Value),
    Greater(f64),
    Smaller(f64),
    NotEmpty,
}

impl From<SchemaPredicate> for Predicate {
    fn from(predicate: SchemaPredicate) -> Self {
        match predicate {
            SchemaPredicate::Equal(v) => Predicate::Equal(v),
            SchemaPredicate::NotEqual(v) => Predicate::NotEqual(v),
            SchemaPredicate::Greater(x) => Predicate::Greater(x),
            SchemaPredicate::Smaller(x) => Predicate::Smaller(x),
            SchemaPredicate::NotEmpty => Predicate::NotEmpty,
        }
    }
}
