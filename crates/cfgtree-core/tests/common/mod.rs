use cfgtree_core::{ConfigTree, Node, NodeId, NodeOption, Predicate, Validator};
use serde_json::json;

/// Handles into the demo tree
#[allow(dead_code)]
pub struct Demo {
    pub config: ConfigTree,
    pub ss1: NodeId,
    pub name1: NodeId,
    pub name2: NodeId,
    pub cab13: NodeId,
    pub age: NodeId,
    pub flag: NodeId,
    pub mode: NodeId,
    pub ss3: NodeId,
    pub name3: NodeId,
}

/// Build the demo tree
///
/// ```text
/// ss1
///   Name1   input  17
///   Name2   input  "John2"   enabled iff cab13 != 12
///   cab13   slider -200
///   age     int    30        0..=120
///   flag    check  true
///   mode    combo  0         a|b|c
/// ss3 (hidden)
///   Name3   input  "John3"
/// ```
#[allow(dead_code)]
pub fn demo() -> Demo {
    demo_with(ConfigTree::new())
}

/// Demo tree where every control edit applies immediately
#[allow(dead_code)]
pub fn immediate_demo() -> Demo {
    demo_with(ConfigTree::with_root_options([NodeOption::Immediate(true)]).unwrap())
}

fn demo_with(mut config: ConfigTree) -> Demo {
    let ss1 = config.add(Node::subsection("ss1", []).unwrap()).unwrap();
    let name1 = config
        .add_child(ss1, Node::input_box("Name1", [NodeOption::Default(json!(17))]).unwrap())
        .unwrap();
    let name2 = config
        .add_child(
            ss1,
            Node::input_box(
                "Name2",
                [
                    NodeOption::Default(json!("John2")),
                    NodeOption::Validator(Validator::NotEmpty),
                ],
            )
            .unwrap(),
        )
        .unwrap();
    let cab13 = config
        .add_child(
            ss1,
            Node::slider(
                "cab13",
                [
                    NodeOption::Pretty("Slider".into()),
                    NodeOption::Min(-300),
                    NodeOption::Max(300),
                    NodeOption::Default(json!(-200)),
                    NodeOption::ShowValue(true),
                ],
            )
            .unwrap(),
        )
        .unwrap();
    let age = config
        .add_child(
            ss1,
            Node::int(
                "age",
                [
                    NodeOption::Default(json!(30)),
                    NodeOption::Min(0),
                    NodeOption::Max(120),
                ],
            )
            .unwrap(),
        )
        .unwrap();
    let flag = config
        .add_child(ss1, Node::check_box("flag", [NodeOption::Default(json!(true))]).unwrap())
        .unwrap();
    let mode = config
        .add_child(
            ss1,
            Node::combo_box(
                "mode",
                [
                    NodeOption::Items(vec!["a".into(), "b".into(), "c".into()]),
                    NodeOption::Default(json!(0)),
                ],
            )
            .unwrap(),
        )
        .unwrap();
    let ss3 = config
        .add(Node::subsection("ss3", [NodeOption::Hidden(true)]).unwrap())
        .unwrap();
    let name3 = config
        .add_child(ss3, Node::input_box("Name3", [NodeOption::Default(json!("John3"))]).unwrap())
        .unwrap();

    config
        .add_dependency(cab13, vec![name2], Predicate::NotEqual(json!(12)))
        .unwrap();
    config.drain_events();

    Demo {
        config,
        ss1,
        name1,
        name2,
        cab13,
        age,
        flag,
        mode,
        ss3,
        name3,
    }
}
