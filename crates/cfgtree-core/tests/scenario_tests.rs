#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use cfgtree_core::ConfigEvent;
use common::demo;
use serde_json::json;

#[test]
fn test_scenario_save_then_load_into_fresh_tree() {
    let saved = demo();
    let yaml = saved.config.to_yaml().unwrap();

    let mut fresh = demo();
    fresh.config.load_yaml(&yaml, false).unwrap();

    assert_eq!(fresh.config.get("ss1/Name1").unwrap(), &json!(17));
    assert_eq!(fresh.config.get("ss3/Name3").unwrap(), &json!("John3"));
    assert!(fresh.config.node(fresh.ss3).unwrap().is_hidden());
    assert!(fresh.config.node(fresh.name3).unwrap().is_hidden());
}

#[test]
fn test_scenario_modified_values_survive_round_trip() {
    let mut saved = demo();
    saved.config.set(saved.name1, json!(42)).unwrap();
    saved.config.set(saved.mode, json!(2)).unwrap();
    saved.config.set(saved.name3, json!("Jane")).unwrap();
    let yaml = saved.config.to_yaml().unwrap();

    let mut fresh = demo();
    fresh.config.load_yaml(&yaml, false).unwrap();
    assert_eq!(fresh.config.get("ss1/Name1").unwrap(), &json!(42));
    assert_eq!(fresh.config.get("ss1/mode").unwrap(), &json!(2));
    assert_eq!(fresh.config.get("ss3/Name3").unwrap(), &json!("Jane"));
}

#[test]
fn test_scenario_plain_document_shape() {
    let d = demo();
    let doc = d.config.to_document().unwrap();
    assert_eq!(
        doc,
        json!({
            "cfgtree": {"collapsed": ""},
            "ss1": {
                "Name1": 17,
                "Name2": "John2",
                "cab13": -200,
                "age": 30,
                "flag": true,
                "mode": 0
            },
            "ss3": {"Name3": "John3"}
        })
    );
}

#[test]
fn test_scenario_dependency_on_slider() {
    let mut d = demo();
    assert!(d.config.is_enabled(d.name2));

    d.config.set(d.cab13, json!(12)).unwrap();
    assert!(!d.config.is_enabled(d.name2));

    for other in [11, 13, -200, 0] {
        d.config.set(d.cab13, json!(other)).unwrap();
        assert!(d.config.is_enabled(d.name2), "cab13 = {}", other);
    }
}

#[test]
fn test_load_emits_value_events_only_on_request() {
    let yaml = demo().config.to_yaml().unwrap();

    let mut quiet = demo();
    quiet.config.load_yaml(&yaml, false).unwrap();
    assert!(!quiet
        .config
        .drain_events()
        .iter()
        .any(|e| matches!(e, ConfigEvent::ValueChanged { .. })));

    let mut loud = demo();
    loud.config.load_yaml(&yaml, true).unwrap();
    assert!(loud.config.drain_events().contains(&ConfigEvent::ValueChanged {
        node: loud.name1,
        origin: cfgtree_core::UpdateOrigin::Load,
    }));
}

#[test]
fn test_loaded_master_value_drives_dependency() {
    let mut d = demo();
    d.config
        .load_yaml("ss1:\n  cab13: 12\n", false)
        .unwrap();
    assert!(!d.config.is_enabled(d.name2));
    assert_eq!(d.config.get("ss1/Name1").unwrap(), &json!(17));
}
