//! CLI integration tests
//!
//! Run the binary against a schema and config file in a temp directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const SCHEMA: &str = r#"
schema_version: 0
nodes:
  - kind: subsection
    key: network
    options: { pretty: Network }
    children:
      - { kind: int, key: port, options: { default: 8080, min: 1, max: 65535 } }
      - { kind: check_box, key: tls, options: { default: false } }
      - { kind: file_dialog, key: cert, options: { pretty: Certificate } }
      - { kind: password_edit, key: secret, options: { default: hunter2 } }
  - kind: subsection
    key: internal
    options: { hidden: true }
    children:
      - { kind: input_box, key: build, options: { default: dev } }
dependencies:
  - master: network/tls
    slaves: [network/cert]
    predicate: { equal: true }
"#;

fn setup(temp_dir: &TempDir) -> (PathBuf, PathBuf) {
    let schema = temp_dir.path().join("schema.yaml");
    fs::write(&schema, SCHEMA).unwrap();
    (schema, temp_dir.path().join("config.yaml"))
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cfgtree-cli"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("Failed to execute CLI")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_show_uses_defaults_without_config() {
    let temp_dir = TempDir::new().unwrap();
    let (schema, config) = setup(&temp_dir);

    let output = run(
        temp_dir.path(),
        &["show", "--schema", schema.to_str().unwrap(), "--config", config.to_str().unwrap()],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        stdout(&output),
        "Network\n  port: 8080\n  tls: false\n  Certificate:  (disabled)\n  secret: ***REDACTED***\n"
    );
}

#[test]
fn test_show_all_includes_hidden_sections() {
    let temp_dir = TempDir::new().unwrap();
    let (schema, _) = setup(&temp_dir);

    let output = run(temp_dir.path(), &["show", "--schema", schema.to_str().unwrap(), "--all"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("internal (hidden)\n"));
    assert!(text.contains("  build: dev (hidden)\n"));
}

#[test]
fn test_set_then_get() {
    let temp_dir = TempDir::new().unwrap();
    let (schema, config) = setup(&temp_dir);
    let schema = schema.to_str().unwrap();
    let config = config.to_str().unwrap();

    let output = run(
        temp_dir.path(),
        &["set", "--schema", schema, "--config", config, "network/port", "9090"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let output = run(
        temp_dir.path(),
        &["get", "--schema", schema, "--config", config, "network/port"],
    );
    assert_eq!(stdout(&output), "9090\n");

    let saved = fs::read_to_string(config).unwrap();
    assert!(saved.contains("port: 9090"));
}

#[test]
fn test_set_enables_dependent_field() {
    let temp_dir = TempDir::new().unwrap();
    let (schema, config) = setup(&temp_dir);
    let schema = schema.to_str().unwrap();
    let config = config.to_str().unwrap();

    run(
        temp_dir.path(),
        &["set", "--schema", schema, "--config", config, "network/tls", "true"],
    );
    let output = run(temp_dir.path(), &["show", "--schema", schema, "--config", config]);
    let text = stdout(&output);
    assert!(text.contains("  tls: true\n"));
    assert!(text.contains("  Certificate: \n"));
}

#[test]
fn test_set_rejects_wrong_type() {
    let temp_dir = TempDir::new().unwrap();
    let (schema, config) = setup(&temp_dir);

    let output = run(
        temp_dir.path(),
        &[
            "set",
            "--schema",
            schema.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
            "network/tls",
            "sometimes",
        ],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Type mismatch"));
    assert!(!config.exists());
}

#[test]
fn test_encode_decode_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let plain = temp_dir.path().join("plain.yaml");
    let blob = temp_dir.path().join("blob.dat");
    let back = temp_dir.path().join("back.yaml");
    fs::write(&plain, "network:\n  port: 7000\n").unwrap();

    let output = run(
        temp_dir.path(),
        &["encode", plain.to_str().unwrap(), "-o", blob.to_str().unwrap()],
    );
    assert!(output.status.success());
    assert_eq!(fs::read_to_string(&blob).unwrap().lines().count(), 1);

    let output = run(
        temp_dir.path(),
        &["decode", blob.to_str().unwrap(), "-o", back.to_str().unwrap()],
    );
    assert!(output.status.success());
    assert_eq!(fs::read_to_string(&back).unwrap(), "network:\n  port: 7000\n");
}

#[test]
fn test_get_unknown_path_fails() {
    let temp_dir = TempDir::new().unwrap();
    let (schema, _) = setup(&temp_dir);

    let output = run(
        temp_dir.path(),
        &["get", "--schema", schema.to_str().unwrap(), "network/missing"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("network/missing"));
}
