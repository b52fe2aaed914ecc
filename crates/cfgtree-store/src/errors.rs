//! Error handling for cfgtree-store
//!
//! Wraps cfgtree-core ExError with store-specific helpers

use cfgtree_core::errors::{CfgTreeError, ExError, ExErrorKind};
use thiserror::Error;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Structural problems in a schema file, caught before any node is built
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Unsupported schema_version: {found}. Expected 0")]
    UnsupportedVersion { found: u32 },

    #[error("Duplicate key '{key}' under '{parent}'")]
    DuplicateKey { parent: String, key: String },

    #[error("Node '{path}' of kind {kind} cannot have children")]
    ChildrenOnLeaf { path: String, kind: String },

    #[error("Node '{path}' cannot be declared with kind root")]
    RootKind { path: String },

    #[error("Dependency {index} has no slaves")]
    NoSlaves { index: usize },
}

impl From<SchemaError> for ExError {
    fn from(err: SchemaError) -> Self {
        let kind = match err {
            SchemaError::DuplicateKey { .. } => ExErrorKind::DuplicateKey,
            _ => ExErrorKind::InvalidInput,
        };
        ExError::new(kind)
            .with_op("schema_parse")
            .with_message(err.to_string())
    }
}

/// Create a schema validation error
pub fn schema_validation(reason: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op("schema_parse")
        .with_message(reason.to_string())
}

/// Attach operation context to a core error
pub fn core_error(operation: &str, err: CfgTreeError) -> ExError {
    ExError::from(err).with_op(operation.to_string())
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}
