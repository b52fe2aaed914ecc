//! Dependency engine.
//!
//! Rules are `(master, slaves, predicate)`. A slave's dependency state is the
//! result of applying every predicate whose rule targets it to the live value
//! of that rule's master.
//!
//! ## Conflict policy
//!
//! A slave targeted by several rules is enabled only if **all** of them hold
//! (logical AND). Results are recomputed from live values on every trigger,
//! so they never depend on the order in which masters changed.
//!
//! The engine is stateless between evaluations; callers decide where master
//! values come from (node values, or live control values while an editor is
//! open) by supplying a lookup.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::model::{NodeId, Value};

/// Custom predicate function
pub type PredicateFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Condition on a master's value
#[derive(Clone)]
pub enum Predicate {
    /// Value equals the operand (numbers compare loosely)
    Equal(Value),
    /// Value differs from the operand (numbers compare loosely)
    NotEqual(Value),
    /// Numeric value strictly greater than the operand
    Greater(f64),
    /// Numeric value strictly smaller than the operand
    Smaller(f64),
    /// Value is not null, not an empty string and not an empty collection
    NotEmpty,
    Custom(PredicateFn),
}

impl Predicate {
    /// Build a custom predicate from a closure
    pub fn custom(f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Predicate::Custom(Arc::new(f))
    }

    /// Apply the predicate to a value
    pub fn evaluate(&self, value: &Value) -> bool {
        match self {
            Predicate::Equal(operand) => loose_eq(value, operand),
            Predicate::NotEqual(operand) => !loose_eq(value, operand),
            Predicate::Greater(operand) => as_number(value).is_some_and(|n| n > *operand),
            Predicate::Smaller(operand) => as_number(value).is_some_and(|n| n < *operand),
            Predicate::NotEmpty => !is_empty(value),
            Predicate::Custom(f) => f(value),
        }
    }
}

impl std::fmt::Debug for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Predicate::Equal(v) => f.debug_tuple("Equal").field(v).finish(),
            Predicate::NotEqual(v) => f.debug_tuple("NotEqual").field(v).finish(),
            Predicate::Greater(x) => f.debug_tuple("Greater").field(x).finish(),
            Predicate::Smaller(x) => f.debug_tuple("Smaller").field(x).finish(),
            Predicate::NotEmpty => f.write_str("NotEmpty"),
            Predicate::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Numeric view of a value; numeric strings count as numbers
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// One dependency rule
#[derive(Debug, Clone)]
pub struct Rule {
    pub master: NodeId,
    pub slaves: Vec<NodeId>,
    pub predicate: Predicate,
}

/// Owned mapping from master node to its rules
#[derive(Debug, Clone, Default)]
pub struct DependencyEngine {
    rules: BTreeMap<NodeId, Vec<Rule>>,
}

impl DependencyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule; a master may carry any number of rules
    pub fn add_rule(&mut self, master: NodeId, slaves: Vec<NodeId>, predicate: Predicate) {
        self.rules.entry(master).or_default().push(Rule {
            master,
            slaves,
            predicate,
        });
    }

    pub fn rule_count(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn is_master(&self, node: NodeId) -> bool {
        self.rules.contains_key(&node)
    }

    /// Rules registered on a master, in registration order
    pub fn rules_for(&self, master: NodeId) -> &[Rule] {
        self.rules.get(&master).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every node targeted by at least one rule
    pub fn slaves(&self) -> BTreeSet<NodeId> {
        self.rules
            .values()
            .flatten()
            .flat_map(|rule| rule.slaves.iter().copied())
            .collect()
    }

    /// Dependency state of one slave: AND over every rule targeting it
    ///
    /// A node no rule targets is unconstrained (`true`).
    pub fn evaluate_slave(&self, slave: NodeId, value_of: &dyn Fn(NodeId) -> Value) -> bool {
        self.rules
            .values()
            .flatten()
            .filter(|rule| rule.slaves.contains(&slave))
            .all(|rule| rule.predicate.evaluate(&value_of(rule.master)))
    }

    /// Re-evaluate every slave reachable from a master's rules
    pub fn evaluate_for(
        &self,
        master: NodeId,
        value_of: &dyn Fn(NodeId) -> Value,
    ) -> BTreeMap<NodeId, bool> {
        let slaves: BTreeSet<NodeId> = self
            .rules_for(master)
            .iter()
            .flat_map(|rule| rule.slaves.iter().copied())
            .collect();
        let states: BTreeMap<NodeId, bool> = slaves
            .into_iter()
            .map(|slave| (slave, self.evaluate_slave(slave, value_of)))
            .collect();
        tracing::debug!(master = %master, slaves = states.len(), "dependencies evaluated");
        states
    }

    /// Re-evaluate every slave of every rule
    pub fn evaluate_all(&self, value_of: &dyn Fn(NodeId) -> Value) -> BTreeMap<NodeId, bool> {
        self.slaves()
            .into_iter()
            .map(|slave| (slave, self.evaluate_slave(slave, value_of)))
            .collect()
    }
}
