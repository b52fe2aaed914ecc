//! Schema parser with validation
//!
//! Parses YAML and validates the schema version and the node structure.
//! Options and dependency paths are checked when the tree is built.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use cfgtree_core::NodeKind;

use crate::errors::{io_error, schema_validation, Result, SchemaError};
use crate::schema::format_v0::{SchemaNode, SchemaV0};

/// Parse a schema file from a path
pub fn parse_schema_file(path: &Path) -> Result<SchemaV0> {
    let content = fs::read_to_string(path).map_err(|e| io_error("read_schema", e))?;
    parse_schema_str(&content)
}

/// Parse a schema from a string
pub fn parse_schema_str(content: &str) -> Result<SchemaV0> {
    let schema: SchemaV0 = serde_yaml::from_str(content)
        .map_err(|e| schema_validation(&format!("YAML parse error: {}", e)))?;

    validate_schema(&schema)?;

    Ok(schema)
}

fn validate_schema(schema: &SchemaV0) -> Result<()> {
    if schema.schema_version != 0 {
        return Err(SchemaError::UnsupportedVersion {
            found: schema.schema_version,
        }
        .into());
    }

    validate_siblings("", &schema.nodes)?;

    for (index, dependency) in schema.dependencies.iter().enumerate() {
        if dependency.slaves.is_empty() {
            return Err(SchemaError::NoSlaves { index }.into());
        }
    }
    Ok(())
}

fn validate_siblings(parent: &str, nodes: &[SchemaNode]) -> Result<()> {
    let mut keys = HashSet::new();
    for node in nodes {
        let path = if parent.is_empty() {
            node.key.clone()
        } else {
            format!("{}/{}", parent, node.key)
        };
        if !keys.insert(node.key.as_str()) {
            return Err(SchemaError::DuplicateKey {
                parent: (if parent.is_empty() { "root" } else { parent }).to_string(),
                key: node.key.clone(),
            }
            .into());
        }
        if node.kind == NodeKind::Root {
            return Err(SchemaError::RootKind { path }.into());
        }
        if !node.children.is_empty() && !node.kind.is_subsection() {
            return Err(SchemaError::ChildrenOnLeaf {
                path,
                kind: node.kind.name().to_string(),
            }
            .into());
        }
        validate_siblings(&path, &node.children)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgtree_core::ExErrorKind;
    use tempfile::NamedTempFile;

    #[test]
    fn test_rejects_other_versions() {
        let err = parse_schema_str("schema_version: 1\n").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);
        assert!(err.message().contains("schema_version"));
    }

    #[test]
    fn test_rejects_duplicate_siblings() {
        let yaml = r#"
schema_version: 0
nodes:
  - kind: subsection
    key: ss1
    children:
      - { kind: check_box, key: a }
      - { kind: int, key: a }
"#;
        let err = parse_schema_str(yaml).unwrap_err();
        assert_eq!(err.code(), "ERR_DUPLICATE_KEY");
        assert!(err.message().contains("ss1"));
    }

    #[test]
    fn test_same_key_in_different_sections_is_fine() {
        let yaml = r#"
schema_version: 0
nodes:
  - kind: subsection
    key: a
    children: [{ kind: check_box, key: x }]
  - kind: subsection
    key: b
    children: [{ kind: check_box, key: x }]
"#;
        assert!(parse_schema_str(yaml).is_ok());
    }

    #[test]
    fn test_rejects_children_on_leaf() {
        let yaml = r#"
schema_version: 0
nodes:
  - kind: input_box
    key: name
    children: [{ kind: check_box, key: x }]
"#;
        let err = parse_schema_str(yaml).unwrap_err();
        assert!(err.message().contains("cannot have children"));
    }

    #[test]
    fn test_rejects_dependency_without_slaves() {
        let yaml = r#"
schema_version: 0
nodes: [{ kind: check_box, key: x }]
dependencies:
  - { master: x, slaves: [], predicate: not_empty }
"#;
        assert!(parse_schema_str(yaml).is_err());
    }

    #[test]
    fn test_parse_from_file() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "schema_version: 0\nnodes: []\n").unwrap();
        let schema = parse_schema_file(file.path()).unwrap();
        assert!(schema.nodes.is_empty());

        let err = parse_schema_file(Path::new("/nonexistent/schema.yaml")).unwrap_err();
        assert_eq!(err.code(), "ERR_IO");
    }
}
