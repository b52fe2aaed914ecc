use cfgtree_core::ConfigTree;
use cfgtree_store::{build_config, parse_schema_str};

/// Two sections, one hidden, with a slider gating a text field
pub const DEMO_SCHEMA: &str = r#"
schema_version: 0
nodes:
  - kind: subsection
    key: ss1
    children:
      - { kind: input_box, key: Name1, options: { default: 17 } }
      - { kind: input_box, key: Name2, options: { default: John2 } }
      - kind: slider
        key: cab13
        options: { pretty: Slider, min: -300, max: 300, default: -200 }
      - kind: password_edit
        key: token
        options: { default: s3cret, base64: true }
  - kind: subsection
    key: ss3
    options: { hidden: true }
    children:
      - { kind: input_box, key: Name3, options: { default: John3 } }
dependencies:
  - master: ss1/cab13
    slaves: [ss1/Name2]
    predicate: { not_equal: 12 }
"#;

#[allow(dead_code)]
pub fn demo_config() -> ConfigTree {
    build_config(&parse_schema_str(DEMO_SCHEMA).unwrap()).unwrap()
}
