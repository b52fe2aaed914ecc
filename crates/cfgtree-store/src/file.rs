//! Config file persistence
//!
//! A config file holds the YAML document of a [`ConfigTree`], optionally
//! wrapped as one opaque base64 blob ("encoded" mode).

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;

use cfgtree_core::serializer::{decode_document, encode_document};
use cfgtree_core::{log_op_end, log_op_error, log_op_start, ConfigTree};

use crate::atomic::atomic_write;
use crate::errors::{core_error, io_error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Write the whole document as a single base64 blob
    pub encoded: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// The file holds a single base64 blob
    pub encoded: bool,
    /// Report loaded values as `ValueChanged` events
    pub emit: bool,
}

/// Render the file content for a tree
pub fn render_document(config: &ConfigTree, encoded: bool) -> Result<String> {
    let yaml = config.to_yaml().map_err(|e| core_error("save", e))?;
    if encoded {
        Ok(format!("{}\n", encode_document(&yaml)))
    } else {
        Ok(yaml)
    }
}

/// Apply file content to a tree
///
/// On error the tree is left unchanged.
pub fn apply_text(config: &mut ConfigTree, text: &str, opts: LoadOptions) -> Result<()> {
    let yaml = if opts.encoded {
        decode_document(text).map_err(|e| core_error("load", e))?
    } else {
        text.to_string()
    };
    config
        .load_yaml(&yaml, opts.emit)
        .map_err(|e| core_error("load", e))
}

/// Save a tree to `path`, replacing the file atomically
pub fn save_file(config: &ConfigTree, path: &Path, opts: SaveOptions) -> Result<()> {
    log_op_start!("save", file = %path.display(), encoded = opts.encoded);
    let start = Instant::now();

    render_document(config, opts.encoded)
        .and_then(|content| atomic_write(path, content.as_bytes()))
        .map_err(|e| {
            log_op_error!(
                "save",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

    log_op_end!("save", duration_ms = start.elapsed().as_millis() as u64);
    Ok(())
}

/// Load `path` into a tree
///
/// Returns `false` without touching the tree when the file does not exist.
pub fn load_file(config: &mut ConfigTree, path: &Path, opts: LoadOptions) -> Result<bool> {
    log_op_start!("load", file = %path.display(), encoded = opts.encoded);
    let start = Instant::now();

    let loaded = load_file_impl(config, path, opts).map_err(|e| {
        log_op_error!(
            "load",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "load",
        duration_ms = start.elapsed().as_millis() as u64,
        loaded = loaded
    );
    Ok(loaded)
}

fn load_file_impl(config: &mut ConfigTree, path: &Path, opts: LoadOptions) -> Result<bool> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(file = %path.display(), "config file missing, keeping defaults");
            return Ok(false);
        }
        Err(e) => return Err(io_error("read_config", e)),
    };
    apply_text(config, &text, opts)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgtree_core::{Node, NodeOption};
    use serde_json::json;
    use tempfile::TempDir;

    fn tree() -> ConfigTree {
        let mut config = ConfigTree::new();
        let ss = config.add(Node::subsection("ss", []).unwrap()).unwrap();
        config
            .add_child(ss, Node::input_box("name", [NodeOption::Default(json!("x"))]).unwrap())
            .unwrap();
        config
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let mut config = tree();
        let loaded = load_file(&mut config, &dir.path().join("absent.yaml"), LoadOptions::default())
            .unwrap();
        assert!(!loaded);
        assert_eq!(config.get("ss/name").unwrap(), &json!("x"));
    }

    #[test]
    fn test_encoded_file_is_one_blob() {
        let config = tree();
        let text = render_document(&config, true).unwrap();
        assert_eq!(text.trim_end().lines().count(), 1);
        assert!(!text.contains("name"));

        let mut fresh = tree();
        apply_text(
            &mut fresh,
            &text,
            LoadOptions {
                encoded: true,
                emit: false,
            },
        )
        .unwrap();
        assert_eq!(fresh.get("ss/name").unwrap(), &json!("x"));
    }

    #[test]
    fn test_plain_text_read_as_encoded_fails() {
        let mut config = tree();
        let err = apply_text(
            &mut config,
            "ss:\n  name: y\n",
            LoadOptions {
                encoded: true,
                emit: false,
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), "ERR_DECODE");
        assert_eq!(err.op(), Some("load"));
    }
}
