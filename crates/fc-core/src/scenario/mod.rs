//! Scenario AST and the fluent builder surface.
//!
//! A scenario is an immutable ordered node list: quantifiers
//! (`forall`/`exists`), `given`/`when` setup steps, and one terminal
//! `then` property. Construction validates name uniqueness and node
//! placement; the runner compiles the list into an
//! [`ExecutableScenario`] for the explorer.

pub mod runner;

use std::collections::BTreeMap;
use std::sync::Arc;

use fc_common::{ArbitrarySize, Error, FluentResult, Result, Value};
use fc_config::StrategyConfig;

use crate::arbitrary::Arbitrary;

/// Typed view over one test's name -> value bindings.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    map: BTreeMap<String, Value>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.map.get(name)
    }

    /// Integer binding; panics on a missing name or wrong type, which the
    /// predicate boundary reports as a predicate error.
    pub fn int(&self, name: &str) -> i64 {
        match self.map.get(name).and_then(Value::as_int) {
            Some(v) => v,
            None => panic!("binding {name:?} is not an integer"),
        }
    }

    pub fn real(&self, name: &str) -> f64 {
        match self.map.get(name).and_then(Value::as_real) {
            Some(v) => v,
            None => panic!("binding {name:?} is not a real"),
        }
    }

    pub fn boolean(&self, name: &str) -> bool {
        match self.map.get(name).and_then(Value::as_bool) {
            Some(v) => v,
            None => panic!("binding {name:?} is not a boolean"),
        }
    }

    pub fn string(&self, name: &str) -> &str {
        match self.map.get(name).and_then(Value::as_str) {
            Some(v) => v,
            None => panic!("binding {name:?} is not a string"),
        }
    }

    pub fn list(&self, name: &str) -> &[Value] {
        match self.map.get(name).and_then(Value::as_list) {
            Some(v) => v,
            None => panic!("binding {name:?} is not a list"),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.map.insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.map.remove(name)
    }

    pub fn as_map(&self) -> &BTreeMap<String, Value> {
        &self.map
    }
}

/// Verdict of one property evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyOutcome {
    Pass,
    Fail,
    /// Precondition violated; the test is discarded, not failed.
    Discard,
}

/// Conversion for `then` closures: plain `bool` or an explicit outcome.
pub trait IntoPropertyOutcome {
    fn into_outcome(self) -> PropertyOutcome;
}

impl IntoPropertyOutcome for bool {
    fn into_outcome(self) -> PropertyOutcome {
        if self {
            PropertyOutcome::Pass
        } else {
            PropertyOutcome::Fail
        }
    }
}

impl IntoPropertyOutcome for PropertyOutcome {
    fn into_outcome(self) -> PropertyOutcome {
        self
    }
}

pub type PropertyFn = Arc<dyn Fn(&Bindings) -> PropertyOutcome + Send + Sync>;
pub type FactoryFn = Arc<dyn Fn(&Bindings) -> Value + Send + Sync>;
pub type ActionFn = Arc<dyn Fn(&mut Bindings) + Send + Sync>;
pub type ClassifyFn = Arc<dyn Fn(&Bindings) -> bool + Send + Sync>;
pub type LabelFn = Arc<dyn Fn(&Bindings) -> String + Send + Sync>;
pub type CollectFn = Arc<dyn Fn(&Bindings) -> Value + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantifierKind {
    Forall,
    Exists,
}

/// How a `given` binding is produced.
#[derive(Clone)]
pub enum GivenSource {
    Constant(Value),
    Factory(FactoryFn),
}

/// One node of the scenario list, in encounter order.
#[derive(Clone)]
pub enum ScenarioNode {
    Forall { name: String, arb: Arbitrary },
    Exists { name: String, arb: Arbitrary },
    Given { name: String, source: GivenSource },
    When { action: ActionFn },
    Then { property: PropertyFn },
}

/// Immutable validated node list.
#[derive(Clone)]
pub struct Scenario {
    nodes: Vec<ScenarioNode>,
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

impl Scenario {
    pub fn nodes(&self) -> &[ScenarioNode] {
        &self.nodes
    }

    /// Quantifiers in declaration order.
    pub fn quantifiers(&self) -> Vec<(&str, QuantifierKind, &Arbitrary)> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                ScenarioNode::Forall { name, arb } => {
                    Some((name.as_str(), QuantifierKind::Forall, arb))
                }
                ScenarioNode::Exists { name, arb } => {
                    Some((name.as_str(), QuantifierKind::Exists, arb))
                }
                _ => None,
            })
            .collect()
    }

    pub fn has_existential(&self) -> bool {
        self.nodes
            .iter()
            .any(|n| matches!(n, ScenarioNode::Exists { .. }))
    }

    /// Product of quantifier sizes; estimated as soon as any quantifier
    /// size is.
    pub fn search_space_size(&self) -> ArbitrarySize {
        self.quantifiers()
            .iter()
            .map(|(_, _, arb)| arb.size())
            .fold(ArbitrarySize::exact(1), |acc, s| acc.product(&s))
    }
}

/// A coverage floor registered with `cover`.
#[derive(Clone)]
pub struct CoverSpec {
    pub required: f64,
    pub predicate: ClassifyFn,
    pub label: String,
}

/// A coverage table registered with `cover_table`.
#[derive(Clone)]
pub struct CoverTableSpec {
    pub name: String,
    pub floors: Vec<(String, f64)>,
    pub categorizer: LabelFn,
}

/// Observation hooks shared by explorer and aggregator.
#[derive(Clone, Default)]
pub struct Hooks {
    pub classifiers: Vec<(ClassifyFn, String)>,
    pub labelers: Vec<LabelFn>,
    pub collectors: Vec<CollectFn>,
    pub covers: Vec<CoverSpec>,
    pub cover_tables: Vec<CoverTableSpec>,
}

impl Hooks {
    pub fn has_coverage(&self) -> bool {
        !self.covers.is_empty() || !self.cover_tables.is_empty()
    }
}

/// One compiled quantifier with its slot index.
#[derive(Clone)]
pub struct Quantifier {
    pub name: String,
    pub kind: QuantifierKind,
    pub arb: Arbitrary,
    pub slot: usize,
}

/// Setup steps executed once per test tuple, in declaration order.
#[derive(Clone)]
pub enum SetupStep {
    Given { name: String, source: GivenSource },
    When { action: ActionFn },
}

/// A scenario compiled for the explorer: quantifiers grouped into
/// alternating forall/exists runs, setup steps, property, and hooks.
#[derive(Clone)]
pub struct ExecutableScenario {
    pub quantifiers: Vec<Quantifier>,
    /// Runs of consecutive same-kind quantifiers, outermost first. A run
    /// of foralls draws jointly (one tuple per test); a run of exists
    /// searches jointly for a witness.
    pub groups: Vec<QuantifierGroup>,
    pub setup: Vec<SetupStep>,
    pub property: PropertyFn,
    pub hooks: Hooks,
}

impl std::fmt::Debug for ExecutableScenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutableScenario")
            .field("quantifiers", &self.quantifiers.len())
            .field("groups", &self.groups.len())
            .field("setup", &self.setup.len())
            .finish()
    }
}

#[derive(Clone)]
pub struct QuantifierGroup {
    pub kind: QuantifierKind,
    /// Indices into `quantifiers`.
    pub members: Vec<usize>,
}

impl Scenario {
    /// Compile into the explorer's representation. Fails when no `then`
    /// was declared.
    pub fn compile(&self) -> Result<ExecutableScenario> {
        let mut quantifiers = Vec::new();
        let mut setup = Vec::new();
        let mut property: Option<PropertyFn> = None;
        for node in &self.nodes {
            match node {
                ScenarioNode::Forall { name, arb } => quantifiers.push(Quantifier {
                    name: name.clone(),
                    kind: QuantifierKind::Forall,
                    arb: arb.clone(),
                    slot: quantifiers.len(),
                }),
                ScenarioNode::Exists { name, arb } => quantifiers.push(Quantifier {
                    name: name.clone(),
                    kind: QuantifierKind::Exists,
                    arb: arb.clone(),
                    slot: quantifiers.len(),
                }),
                ScenarioNode::Given { name, source } => setup.push(SetupStep::Given {
                    name: name.clone(),
                    source: source.clone(),
                }),
                ScenarioNode::When { action } => setup.push(SetupStep::When {
                    action: action.clone(),
                }),
                ScenarioNode::Then { property: p } => property = Some(p.clone()),
            }
        }
        let property = property.ok_or(Error::MissingProperty)?;

        let mut groups: Vec<QuantifierGroup> = Vec::new();
        for q in &quantifiers {
            match groups.last_mut() {
                Some(g) if g.kind == q.kind => g.members.push(q.slot),
                _ => groups.push(QuantifierGroup {
                    kind: q.kind,
                    members: vec![q.slot],
                }),
            }
        }

        Ok(ExecutableScenario {
            quantifiers,
            groups,
            setup,
            property,
            hooks: Hooks::default(),
        })
    }
}

/// Entry point: an empty scenario builder.
pub fn fluent_check() -> FluentCheck {
    FluentCheck::new()
}

/// Fluent scenario builder.
#[derive(Clone, Default)]
pub struct FluentCheck {
    nodes: Vec<ScenarioNode>,
    config: StrategyConfig,
    hooks: Hooks,
    names: std::collections::HashSet<String>,
    build_error: Option<u32>,
    build_error_name: Option<String>,
}

impl FluentCheck {
    pub fn new() -> Self {
        Self::default()
    }

    fn claim_name(&mut self, name: &str) {
        if !self.names.insert(name.to_string()) && self.build_error.is_none() {
            self.build_error = Some(11);
            self.build_error_name = Some(name.to_string());
        }
    }

    /// Universal quantifier over an arbitrary.
    pub fn forall(mut self, name: &str, arb: Arbitrary) -> Self {
        self.claim_name(name);
        self.nodes.push(ScenarioNode::Forall {
            name: name.to_string(),
            arb,
        });
        self
    }

    /// Existential quantifier over an arbitrary.
    pub fn exists(mut self, name: &str, arb: Arbitrary) -> Self {
        self.claim_name(name);
        self.nodes.push(ScenarioNode::Exists {
            name: name.to_string(),
            arb,
        });
        self
    }

    /// Constant binding available to the property and later steps.
    pub fn given(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.claim_name(name);
        self.nodes.push(ScenarioNode::Given {
            name: name.to_string(),
            source: GivenSource::Constant(value.into()),
        });
        self
    }

    /// Factory binding, recomputed once per test tuple.
    pub fn given_with(
        mut self,
        name: &str,
        factory: impl Fn(&Bindings) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.claim_name(name);
        self.nodes.push(ScenarioNode::Given {
            name: name.to_string(),
            source: GivenSource::Factory(Arc::new(factory)),
        });
        self
    }

    /// Side-effecting step run once per test tuple, in declaration order.
    pub fn when(mut self, action: impl Fn(&mut Bindings) + Send + Sync + 'static) -> Self {
        self.nodes.push(ScenarioNode::When {
            action: Arc::new(action),
        });
        self
    }

    /// The property under test. Terminal; at most one.
    pub fn then<O: IntoPropertyOutcome>(
        mut self,
        property: impl Fn(&Bindings) -> O + Send + Sync + 'static,
    ) -> Self {
        if self
            .nodes
            .iter()
            .any(|n| matches!(n, ScenarioNode::Then { .. }))
            && self.build_error.is_none()
        {
            self.build_error = Some(13);
        }
        self.nodes.push(ScenarioNode::Then {
            property: Arc::new(move |b| property(b).into_outcome()),
        });
        self
    }

    /// Replace the strategy configuration.
    pub fn config(mut self, config: StrategyConfig) -> Self {
        self.config = config;
        self
    }

    /// Count tests where `pred` holds under `label`.
    pub fn classify(
        mut self,
        pred: impl Fn(&Bindings) -> bool + Send + Sync + 'static,
        label: &str,
    ) -> Self {
        self.hooks
            .classifiers
            .push((Arc::new(pred), label.to_string()));
        self
    }

    /// Label every test with the returned string.
    pub fn label(mut self, f: impl Fn(&Bindings) -> String + Send + Sync + 'static) -> Self {
        self.hooks.labelers.push(Arc::new(f));
        self
    }

    /// Collect a value per test; occurrences are counted by rendering.
    pub fn collect(mut self, f: impl Fn(&Bindings) -> Value + Send + Sync + 'static) -> Self {
        self.hooks.collectors.push(Arc::new(f));
        self
    }

    /// Require at least `pct` percent of tests to satisfy `pred`.
    pub fn cover(
        mut self,
        pct: f64,
        pred: impl Fn(&Bindings) -> bool + Send + Sync + 'static,
        label: &str,
    ) -> Self {
        self.hooks.covers.push(CoverSpec {
            required: pct,
            predicate: Arc::new(pred),
            label: label.to_string(),
        });
        self
    }

    /// Require per-category floors, categorized by `categorizer`.
    pub fn cover_table(
        mut self,
        name: &str,
        table: Vec<(&str, f64)>,
        categorizer: impl Fn(&Bindings) -> String + Send + Sync + 'static,
    ) -> Self {
        self.hooks.cover_tables.push(CoverTableSpec {
            name: name.to_string(),
            floors: table
                .into_iter()
                .map(|(label, pct)| (label.to_string(), pct))
                .collect(),
            categorizer: Arc::new(categorizer),
        });
        self
    }

    /// Freeze the node list.
    pub fn build_scenario(&self) -> Result<Scenario> {
        match (self.build_error, &self.build_error_name) {
            (Some(11), Some(name)) => {
                return Err(Error::DuplicateName { name: name.clone() })
            }
            (Some(13), _) => {
                return Err(Error::SchemaValidation(
                    "scenario declares more than one then()".into(),
                ))
            }
            _ => {}
        }
        Ok(Scenario {
            nodes: self.nodes.clone(),
        })
    }

    /// Explore with the configured strategy.
    pub fn check(&self) -> Result<FluentResult> {
        runner::run(self, self.config.clone(), runner::RunMode::Default)
    }

    /// Explore with Bayesian confidence stopping at `level`.
    pub fn check_with_confidence(&self, level: f64) -> Result<FluentResult> {
        let config = self.config.clone().with_confidence(level);
        runner::run(self, config, runner::RunMode::Confidence)
    }

    /// Explore until every coverage floor is decided.
    pub fn check_coverage(&self) -> Result<FluentResult> {
        runner::run(self, self.config.clone(), runner::RunMode::Coverage)
    }

    pub(crate) fn strategy(&self) -> &StrategyConfig {
        &self.config
    }

    pub(crate) fn hooks(&self) -> &Hooks {
        &self.hooks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitrary::{boolean, integer};

    #[test]
    fn quantifiers_and_search_space() {
        let scenario = fluent_check()
            .forall("a", integer(0, 9))
            .exists("b", boolean())
            .then(|_| true)
            .build_scenario()
            .unwrap();
        let qs = scenario.quantifiers();
        assert_eq!(qs.len(), 2);
        assert_eq!(qs[0].1, QuantifierKind::Forall);
        assert_eq!(qs[1].1, QuantifierKind::Exists);
        assert!(scenario.has_existential());
        assert_eq!(scenario.search_space_size().value, 20);
    }

    #[test]
    fn duplicate_names_fail_fast() {
        let err = fluent_check()
            .forall("x", integer(0, 1))
            .exists("x", boolean())
            .then(|_| true)
            .build_scenario()
            .unwrap_err();
        assert_eq!(err.code(), 11);
    }

    #[test]
    fn two_thens_are_rejected() {
        let err = fluent_check()
            .forall("x", integer(0, 1))
            .then(|_| true)
            .then(|_| true)
            .build_scenario()
            .unwrap_err();
        assert_eq!(err.code(), 10);
    }

    #[test]
    fn compile_requires_a_property() {
        let scenario = fluent_check()
            .forall("x", integer(0, 1))
            .build_scenario()
            .unwrap();
        let err = scenario.compile().unwrap_err();
        assert_eq!(err.code(), 13);
    }

    #[test]
    fn groups_split_on_kind_changes() {
        let scenario = fluent_check()
            .forall("a", integer(0, 1))
            .forall("b", integer(0, 1))
            .exists("c", integer(0, 1))
            .forall("d", integer(0, 1))
            .then(|_| true)
            .build_scenario()
            .unwrap();
        let exec = scenario.compile().unwrap();
        let shapes: Vec<(QuantifierKind, usize)> = exec
            .groups
            .iter()
            .map(|g| (g.kind, g.members.len()))
            .collect();
        assert_eq!(
            shapes,
            vec![
                (QuantifierKind::Forall, 2),
                (QuantifierKind::Exists, 1),
                (QuantifierKind::Forall, 1),
            ]
        );
    }

    #[test]
    fn bindings_typed_getters() {
        let mut b = Bindings::new();
        b.insert("n", Value::Int(4));
        b.insert("s", Value::Str("hi".into()));
        assert_eq!(b.int("n"), 4);
        assert_eq!(b.string("s"), "hi");
        assert_eq!(b.real("n"), 4.0);
    }
}
