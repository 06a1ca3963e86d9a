//! The explorer: a nested-loop walk over quantifier groups with
//! pluggable stopping.
//!
//! Consecutive same-kind quantifiers draw jointly: a forall run
//! contributes one tuple per test, an exists run searches its joint
//! space for a witness. Each completed test feeds the label, coverage,
//! and posterior machinery; stopping conditions, the wall clock, and the
//! cancellation flag are consulted every
//! `confidence_check_interval` tests.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, trace};

use fc_common::Pick;
use fc_config::StrategyConfig;
use fc_math::BetaPosterior;

use crate::arbitrary::{Arbitrary, PickContext, PosteriorSession};
use crate::sample::rng::{LowBiasedSource, RandomSource, StdSource};
use crate::sample::{BiasedSampler, Sampler, UniformSampler};
use crate::scenario::{
    Bindings, ExecutableScenario, PropertyOutcome, QuantifierKind, SetupStep,
};
use crate::shrink::ShrinkOracle;
use crate::stats::{ArbitraryCollector, CoverageTable, LabelTable};

/// Stopping budget, lifted out of the strategy config.
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    pub max_tests: u64,
    pub max_time_ms: Option<u64>,
    pub check_interval: u64,
}

impl From<&StrategyConfig> for Budget {
    fn from(config: &StrategyConfig) -> Self {
        Self {
            max_tests: config.max_iterations,
            max_time_ms: config.max_time_ms,
            check_interval: config.confidence_check_interval.max(1),
        }
    }
}

/// Which rule decides when the walk stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoppingMode {
    /// Stop at `sample_size` tests (honoring any `min_confidence` floor).
    Fixed,
    /// Stop once the pass-rate posterior clears the target confidence.
    Confidence,
    /// Stop once every coverage floor is proven satisfied or one is
    /// proven infeasible.
    Coverage,
}

/// Terminal state of an exploration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Passed,
    Failed,
    Exhausted,
    CoverageFailed { label: String },
}

/// Everything the runner needs to assemble a result.
pub struct Exploration {
    pub outcome: RunOutcome,
    /// Counterexample (forall bindings) or witness (exists bindings).
    pub example: BTreeMap<String, Pick>,
    pub tests_run: u64,
    pub tests_passed: u64,
    pub tests_discarded: u64,
    /// Predicate-level failures (the confidence posterior's beta count).
    pub tests_failed: u64,
    pub confidence: Option<f64>,
    pub credible_interval: Option<[f64; 2]>,
    pub labels: LabelTable,
    pub coverage: CoverageTable,
    pub arbitrary_stats: Option<Vec<(String, ArbitraryCollector)>>,
    pub elapsed_ms: u64,
}

/// Cooperative cancellation handle; flipped from outside, observed at
/// check boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Result of evaluating one test (one outermost-group assignment).
#[derive(Debug, Clone, PartialEq, Eq)]
enum TestEval {
    Pass,
    Fail { threw: Option<String> },
    Discard,
    /// An arbitrary produced no pick (empty space, exhausted filter,
    /// uniqueness guard).
    NoPick,
    /// An inner existential search found no witness.
    NoWitness,
}

pub struct Explorer<'a> {
    exec: &'a ExecutableScenario,
    config: &'a StrategyConfig,
    mode: StoppingMode,
    budget: Budget,
    rng: StdSource,
    session: PosteriorSession,
    samplers: Vec<Box<dyn Sampler>>,
    current_picks: Vec<Option<Pick>>,
    labels: LabelTable,
    coverage: CoverageTable,
    collectors: Option<Vec<ArbitraryCollector>>,
    cancel: Option<CancelToken>,
    tests_run: u64,
    tests_passed: u64,
    tests_discarded: u64,
    tests_failed: u64,
    /// Witness search budget for each non-top existential group.
    exists_tries: u64,
    /// Set while re-verifying shrink candidates; suppresses all
    /// statistics and sampler state.
    verifying: bool,
}

impl<'a> Explorer<'a> {
    pub fn new(
        exec: &'a ExecutableScenario,
        config: &'a StrategyConfig,
        mode: StoppingMode,
        seed: u64,
        cancel: Option<CancelToken>,
    ) -> Self {
        let samplers: Vec<Box<dyn Sampler>> = exec
            .quantifiers
            .iter()
            .map(|_| -> Box<dyn Sampler> {
                if config.bias {
                    Box::new(BiasedSampler::new())
                } else {
                    Box::new(UniformSampler)
                }
            })
            .collect();

        let collectors = config.detailed_statistics.then(|| {
            exec.quantifiers
                .iter()
                .map(|q| ArbitraryCollector::new(&q.arb.corner_cases()))
                .collect()
        });

        let mut coverage = CoverageTable::default();
        for spec in &exec.hooks.covers {
            coverage.add_floor(spec.label.clone(), spec.required);
        }
        for table in &exec.hooks.cover_tables {
            for (category, pct) in &table.floors {
                coverage.add_floor(format!("{}:{}", table.name, category), *pct);
            }
        }

        Self {
            exec,
            config,
            mode,
            budget: Budget::from(config),
            rng: StdSource::from_seed(seed),
            session: PosteriorSession::new(),
            samplers,
            current_picks: vec![None; exec.quantifiers.len()],
            labels: LabelTable::default(),
            coverage,
            collectors,
            cancel,
            tests_run: 0,
            tests_passed: 0,
            tests_discarded: 0,
            tests_failed: 0,
            exists_tries: config.sample_size.max(1),
            verifying: false,
        }
    }

    fn top_is_existential(&self) -> bool {
        matches!(
            self.exec.groups.first().map(|g| g.kind),
            Some(QuantifierKind::Exists)
        )
    }

    fn pass_posterior(&self) -> BetaPosterior {
        BetaPosterior::from_counts(self.tests_passed, self.tests_failed)
    }

    fn current_confidence(&self) -> f64 {
        1.0 - self.pass_posterior().cdf(self.config.pass_rate_threshold)
    }

    fn wilson_level(&self) -> f64 {
        self.config.confidence.unwrap_or(0.95)
    }

    /// Walk the space until a stopping rule fires.
    pub fn explore(&mut self) -> Exploration {
        let start = Instant::now();
        let top_exists = self.top_is_existential();
        let mut outcome: Option<RunOutcome> = None;
        let mut example: BTreeMap<String, Pick> = BTreeMap::new();

        debug!(
            quantifiers = self.exec.quantifiers.len(),
            mode = ?self.mode,
            max_tests = self.budget.max_tests,
            "exploration started"
        );

        while outcome.is_none() {
            if self.tests_run >= self.budget.max_tests {
                outcome = Some(if top_exists {
                    RunOutcome::Exhausted
                } else {
                    self.close_out_coverage().unwrap_or(RunOutcome::Exhausted)
                });
                break;
            }
            if self.mode == StoppingMode::Fixed
                && self.tests_run >= self.config.sample_size
                && self.min_confidence_met()
            {
                outcome = Some(if top_exists {
                    RunOutcome::Exhausted
                } else {
                    RunOutcome::Passed
                });
                break;
            }

            let eval = self.run_one_test();
            self.tests_run += 1;
            match eval {
                TestEval::Pass => {
                    self.tests_passed += 1;
                    if top_exists {
                        example = self.capture_example(QuantifierKind::Exists);
                        outcome = Some(RunOutcome::Passed);
                    }
                }
                TestEval::Fail { threw } => {
                    self.tests_failed += 1;
                    if let Some(message) = &threw {
                        debug!(error = %message, "predicate threw; treating as failure");
                    }
                    example = self.capture_example(QuantifierKind::Forall);
                    outcome = Some(RunOutcome::Failed);
                }
                TestEval::NoWitness => {
                    if top_exists {
                        // Not a witness; keep searching.
                        self.tests_failed += 1;
                    } else {
                        example = self.capture_example(QuantifierKind::Forall);
                        outcome = Some(RunOutcome::Failed);
                    }
                }
                TestEval::Discard | TestEval::NoPick => {
                    self.tests_discarded += 1;
                }
            }

            if outcome.is_none() && self.tests_run % self.budget.check_interval == 0 {
                outcome = self.check_boundary(start, top_exists);
            }
        }

        let outcome = outcome.unwrap_or(RunOutcome::Exhausted);
        debug!(
            ?outcome,
            tests_run = self.tests_run,
            tests_passed = self.tests_passed,
            tests_discarded = self.tests_discarded,
            "exploration finished"
        );

        let report_confidence = self.mode == StoppingMode::Confidence
            || self.config.min_confidence.is_some()
            || self.config.wants_statistics();
        let (confidence, credible_interval) = if report_confidence {
            let posterior = self.pass_posterior();
            (
                Some(self.current_confidence()),
                Some({
                    let (lo, hi) =
                        posterior.credible_interval(self.config.credible_interval_width);
                    [lo, hi]
                }),
            )
        } else {
            (None, None)
        };

        Exploration {
            outcome,
            example,
            tests_run: self.tests_run,
            tests_passed: self.tests_passed,
            tests_discarded: self.tests_discarded,
            tests_failed: self.tests_failed,
            confidence,
            credible_interval,
            labels: std::mem::take(&mut self.labels),
            coverage: std::mem::take(&mut self.coverage),
            arbitrary_stats: self.collectors.take().map(|cs| {
                self.exec
                    .quantifiers
                    .iter()
                    .map(|q| q.name.clone())
                    .zip(cs)
                    .collect()
            }),
            elapsed_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn min_confidence_met(&self) -> bool {
        match self.config.min_confidence {
            Some(floor) => self.current_confidence() >= floor,
            None => true,
        }
    }

    /// Interval-boundary checks: stopping rule, wall clock, cancellation.
    fn check_boundary(&mut self, start: Instant, top_exists: bool) -> Option<RunOutcome> {
        if let Some(token) = &self.cancel {
            if token.is_cancelled() {
                return Some(RunOutcome::Exhausted);
            }
        }
        if let Some(max_ms) = self.budget.max_time_ms {
            if start.elapsed().as_millis() as u64 >= max_ms {
                return Some(RunOutcome::Exhausted);
            }
        }
        match self.mode {
            StoppingMode::Fixed => None,
            StoppingMode::Confidence => {
                let confidence = self.current_confidence();
                trace!(confidence, tests_run = self.tests_run, "confidence check");
                if let Some(target) = self.config.confidence {
                    if confidence >= target {
                        return Some(if top_exists {
                            RunOutcome::Exhausted
                        } else {
                            RunOutcome::Passed
                        });
                    }
                }
                None
            }
            StoppingMode::Coverage => {
                let level = self.wilson_level();
                if self.coverage.all_satisfied(level) {
                    return Some(RunOutcome::Passed);
                }
                if let Some(label) = self.coverage.first_infeasible(level) {
                    return Some(RunOutcome::CoverageFailed {
                        label: label.to_string(),
                    });
                }
                None
            }
        }
    }

    /// Budget ran out in coverage mode: settle floors on the evidence so
    /// far.
    fn close_out_coverage(&self) -> Option<RunOutcome> {
        if self.mode != StoppingMode::Coverage {
            return None;
        }
        let level = self.wilson_level();
        if self.coverage.all_satisfied(level) {
            return Some(RunOutcome::Passed);
        }
        let label = self
            .coverage
            .results(level)
            .into_iter()
            .find(|r| !r.satisfied)
            .map(|r| r.label)?;
        Some(RunOutcome::CoverageFailed { label })
    }

    fn capture_example(&self, kind: QuantifierKind) -> BTreeMap<String, Pick> {
        self.exec
            .quantifiers
            .iter()
            .filter(|q| q.kind == kind)
            .filter_map(|q| {
                self.current_picks[q.slot]
                    .clone()
                    .map(|p| (q.name.clone(), p))
            })
            .collect()
    }

    fn run_one_test(&mut self) -> TestEval {
        let mut bindings = Bindings::new();
        self.eval_group(0, true, &mut bindings, &BTreeMap::new())
    }

    fn draw_for(&mut self, slot: usize, overrides: &BTreeMap<usize, Pick>) -> Option<Pick> {
        if let Some(pinned) = overrides.get(&slot) {
            self.current_picks[slot] = Some(pinned.clone());
            return Some(pinned.clone());
        }
        let arb = &self.exec.quantifiers[slot].arb;
        let pick = if self.verifying {
            let mut ctx = PickContext::new(&mut self.rng, &mut self.session, slot);
            arb.pick(&mut ctx)
        } else {
            let mut ctx = PickContext::new(&mut self.rng, &mut self.session, slot);
            self.samplers[slot].draw(arb, &mut ctx)
        }?;
        if !self.verifying {
            if let Some(collectors) = &mut self.collectors {
                collectors[slot].record(&pick);
            }
        }
        self.current_picks[slot] = Some(pick.clone());
        Some(pick)
    }

    fn eval_group(
        &mut self,
        gi: usize,
        top: bool,
        bindings: &mut Bindings,
        overrides: &BTreeMap<usize, Pick>,
    ) -> TestEval {
        let Some(group) = self.exec.groups.get(gi) else {
            return self.eval_body(bindings);
        };
        let members = group.members.clone();
        match group.kind {
            QuantifierKind::Forall => {
                for &slot in &members {
                    let Some(pick) = self.draw_for(slot, overrides) else {
                        return TestEval::NoPick;
                    };
                    let name = self.exec.quantifiers[slot].name.clone();
                    bindings.insert(name, pick.value);
                }
                self.eval_group(gi + 1, false, bindings, overrides)
            }
            QuantifierKind::Exists => {
                let tries = if top { 1 } else { self.exists_tries };
                let mut saw_discard = false;
                for _ in 0..tries {
                    let mut drew_all = true;
                    for &slot in &members {
                        match self.draw_for(slot, overrides) {
                            Some(pick) => {
                                let name = self.exec.quantifiers[slot].name.clone();
                                bindings.insert(name, pick.value);
                            }
                            None => {
                                drew_all = false;
                                break;
                            }
                        }
                    }
                    if !drew_all {
                        // The candidate space dried up.
                        return if top { TestEval::NoPick } else { TestEval::NoWitness };
                    }
                    match self.eval_group(gi + 1, false, bindings, overrides) {
                        TestEval::Pass => return TestEval::Pass,
                        TestEval::Discard => saw_discard = true,
                        TestEval::Fail { .. } | TestEval::NoWitness | TestEval::NoPick => {}
                    }
                }
                if top && saw_discard {
                    TestEval::Discard
                } else {
                    TestEval::NoWitness
                }
            }
        }
    }

    /// Resolve givens, run whens, evaluate the property, tear down in
    /// reverse order on every exit path.
    fn eval_body(&mut self, bindings: &mut Bindings) -> TestEval {
        let mut acquired: Vec<String> = Vec::new();
        let mut eval = None;

        for step in &self.exec.setup {
            match step {
                SetupStep::Given { name, source } => {
                    let produced = match source {
                        crate::scenario::GivenSource::Constant(v) => Ok(v.clone()),
                        crate::scenario::GivenSource::Factory(f) => {
                            catch_unwind(AssertUnwindSafe(|| f(bindings)))
                                .map_err(panic_message)
                        }
                    };
                    match produced {
                        Ok(value) => {
                            bindings.insert(name.clone(), value);
                            acquired.push(name.clone());
                        }
                        Err(message) => {
                            eval = Some(TestEval::Fail {
                                threw: Some(message),
                            });
                            break;
                        }
                    }
                }
                SetupStep::When { action } => {
                    if let Err(payload) = catch_unwind(AssertUnwindSafe(|| action(bindings))) {
                        eval = Some(TestEval::Fail {
                            threw: Some(panic_message(payload)),
                        });
                        break;
                    }
                }
            }
        }

        let eval = eval.unwrap_or_else(|| {
            let property = &self.exec.property;
            match catch_unwind(AssertUnwindSafe(|| property(bindings))) {
                Ok(PropertyOutcome::Pass) => TestEval::Pass,
                Ok(PropertyOutcome::Fail) => TestEval::Fail { threw: None },
                Ok(PropertyOutcome::Discard) => TestEval::Discard,
                Err(payload) => TestEval::Fail {
                    threw: Some(panic_message(payload)),
                },
            }
        });

        if eval == TestEval::Pass && !self.verifying {
            self.record_observations(bindings);
        }

        // Reverse-order teardown on all exit paths.
        for name in acquired.iter().rev() {
            bindings.remove(name);
        }

        eval
    }

    /// Label and coverage accumulation after a passing evaluation.
    fn record_observations(&mut self, bindings: &Bindings) {
        let hooks = &self.exec.hooks;
        if hooks.classifiers.is_empty()
            && hooks.labelers.is_empty()
            && hooks.collectors.is_empty()
            && !hooks.has_coverage()
        {
            return;
        }

        self.labels.bump_total();
        for (pred, label) in &hooks.classifiers {
            if pred(bindings) {
                self.labels.record(label);
            }
        }
        for labeler in &hooks.labelers {
            let label = labeler(bindings);
            self.labels.record(&label);
        }
        for collector in &hooks.collectors {
            let value = collector(bindings);
            self.labels.record(&value.to_string());
        }

        if hooks.has_coverage() {
            let mut hits = Vec::with_capacity(self.coverage.floor_count());
            for spec in &hooks.covers {
                hits.push((spec.predicate)(bindings));
            }
            for table in &hooks.cover_tables {
                let category = (table.categorizer)(bindings);
                for (label, _) in &table.floors {
                    hits.push(*label == category);
                }
            }
            self.coverage.record(&hits);
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "predicate panicked".to_string()
    }
}

impl ShrinkOracle for Explorer<'_> {
    fn falsifies(&mut self, overrides: &BTreeMap<usize, Pick>) -> bool {
        self.verifying = true;
        let mut bindings = Bindings::new();
        let eval = self.eval_group(0, true, &mut bindings, overrides);
        self.verifying = false;
        matches!(eval, TestEval::Fail { .. } | TestEval::NoWitness)
    }

    fn sample_candidates(&mut self, arb: &Arbitrary, slot: usize, n: usize) -> Vec<Pick> {
        let mut out = Vec::with_capacity(n);
        let mut biased = LowBiasedSource::new(&mut self.rng);
        let mut ctx = PickContext::new(&mut biased, &mut self.session, slot);
        for _ in 0..n {
            match arb.pick(&mut ctx) {
                Some(p) => out.push(p),
                None => break,
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitrary::integer;
    use crate::scenario::fluent_check;

    fn compile(builder: &crate::scenario::FluentCheck) -> ExecutableScenario {
        let scenario = builder.build_scenario().unwrap();
        let mut exec = scenario.compile().unwrap();
        exec.hooks = builder.hooks().clone();
        exec
    }

    #[test]
    fn passing_forall_runs_to_sample_size() {
        let builder = fluent_check()
            .forall("a", integer(-100, 100))
            .forall("b", integer(-100, 100))
            .then(|b| b.int("a") + b.int("b") == b.int("b") + b.int("a"));
        let exec = compile(&builder);
        let config = StrategyConfig::default().with_sample_size(200);
        let mut explorer = Explorer::new(&exec, &config, StoppingMode::Fixed, 42, None);
        let out = explorer.explore();
        assert_eq!(out.outcome, RunOutcome::Passed);
        assert_eq!(out.tests_run, 200);
        assert_eq!(out.tests_passed, 200);
        assert_eq!(out.tests_discarded, 0);
    }

    #[test]
    fn failing_forall_stops_with_counterexample() {
        let builder = fluent_check()
            .forall("x", integer(-100, 100))
            .then(|b| b.int("x").abs() < 50);
        let exec = compile(&builder);
        let config = StrategyConfig::default().with_sample_size(10_000);
        let mut explorer = Explorer::new(&exec, &config, StoppingMode::Fixed, 7, None);
        let out = explorer.explore();
        assert_eq!(out.outcome, RunOutcome::Failed);
        let x = out.example["x"].value.as_int().unwrap();
        assert!(x.abs() >= 50);
    }

    #[test]
    fn exists_finds_witness_and_stops() {
        let builder = fluent_check()
            .exists("x", integer(0, 50))
            .then(|b| b.int("x") % 7 == 0 && b.int("x") > 0);
        let exec = compile(&builder);
        let config = StrategyConfig::default().with_sample_size(500);
        let mut explorer = Explorer::new(&exec, &config, StoppingMode::Fixed, 11, None);
        let out = explorer.explore();
        assert_eq!(out.outcome, RunOutcome::Passed);
        let x = out.example["x"].value.as_int().unwrap();
        assert_eq!(x % 7, 0);
    }

    #[test]
    fn exists_without_witness_exhausts() {
        let builder = fluent_check()
            .exists("x", integer(1, 9))
            .then(|b| b.int("x") > 100);
        let exec = compile(&builder);
        let config = StrategyConfig::default().with_sample_size(50);
        let mut explorer = Explorer::new(&exec, &config, StoppingMode::Fixed, 13, None);
        let out = explorer.explore();
        assert_eq!(out.outcome, RunOutcome::Exhausted);
    }

    #[test]
    fn forall_exists_reports_outer_counterexample() {
        // For x = 0 there is no y in (0, 10] with y < x.
        let builder = fluent_check()
            .forall("x", integer(0, 10))
            .exists("y", integer(1, 10))
            .then(|b| b.int("y") < b.int("x"));
        let exec = compile(&builder);
        let config = StrategyConfig::default().with_sample_size(200);
        let mut explorer = Explorer::new(&exec, &config, StoppingMode::Fixed, 17, None);
        let out = explorer.explore();
        assert_eq!(out.outcome, RunOutcome::Failed);
        assert!(out.example.contains_key("x"));
        assert!(!out.example.contains_key("y"));
        // Small x values admit no witness; the counterexample is one of
        // them (bias emits corner 0 or 1 first).
        assert!(out.example["x"].value.as_int().unwrap() <= 1);
    }

    #[test]
    fn discards_are_counted_not_failed() {
        let builder = fluent_check()
            .forall("x", integer(0, 9))
            .then(|b| {
                if b.int("x") % 2 == 0 {
                    PropertyOutcome::Discard
                } else {
                    PropertyOutcome::Pass
                }
            });
        let exec = compile(&builder);
        let config = StrategyConfig::default().with_sample_size(100);
        let mut explorer = Explorer::new(&exec, &config, StoppingMode::Fixed, 19, None);
        let out = explorer.explore();
        assert_eq!(out.outcome, RunOutcome::Passed);
        assert!(out.tests_discarded > 0);
        assert_eq!(out.tests_run, 100);
        assert_eq!(
            out.tests_passed + out.tests_discarded,
            out.tests_run
        );
    }

    #[test]
    fn predicate_panic_is_a_counterexample() {
        let builder = fluent_check()
            .forall("x", integer(0, 100))
            .then(|b| {
                if b.int("x") > 90 {
                    panic!("boom at {}", b.int("x"));
                }
                true
            });
        let exec = compile(&builder);
        let config = StrategyConfig::default().with_sample_size(5000);
        let mut explorer = Explorer::new(&exec, &config, StoppingMode::Fixed, 23, None);
        let out = explorer.explore();
        assert_eq!(out.outcome, RunOutcome::Failed);
        assert!(out.example["x"].value.as_int().unwrap() > 90);
    }

    #[test]
    fn confidence_mode_stops_early_on_all_passes() {
        let builder = fluent_check()
            .forall("x", integer(-1000, 1000))
            .then(|b| b.int("x") * b.int("x") >= 0);
        let exec = compile(&builder);
        let config = StrategyConfig::default()
            .with_confidence(0.99)
            .with_pass_rate_threshold(0.95)
            .with_max_iterations(100_000);
        let mut explorer = Explorer::new(&exec, &config, StoppingMode::Confidence, 29, None);
        let out = explorer.explore();
        assert_eq!(out.outcome, RunOutcome::Passed);
        assert!(out.tests_run < 100_000, "ran {} tests", out.tests_run);
        assert!(out.confidence.unwrap() >= 0.99);
    }

    #[test]
    fn coverage_infeasible_names_the_label() {
        let builder = fluent_check()
            .forall("n", integer(0, 10))
            .cover(50.0, |b| b.int("n") > 100, "big")
            .then(|_| true);
        let exec = compile(&builder);
        let config = StrategyConfig::default().with_max_iterations(10_000);
        let mut explorer = Explorer::new(&exec, &config, StoppingMode::Coverage, 31, None);
        let out = explorer.explore();
        assert_eq!(
            out.outcome,
            RunOutcome::CoverageFailed {
                label: "big".to_string()
            }
        );
    }

    #[test]
    fn coverage_satisfiable_passes() {
        let builder = fluent_check()
            .forall("n", integer(0, 9))
            .cover(30.0, |b| b.int("n") < 5, "small")
            .then(|_| true);
        let exec = compile(&builder);
        let config = StrategyConfig::default().with_max_iterations(50_000);
        let mut explorer = Explorer::new(&exec, &config, StoppingMode::Coverage, 37, None);
        let out = explorer.explore();
        assert_eq!(out.outcome, RunOutcome::Passed);
    }

    #[test]
    fn cancellation_is_observed_at_the_boundary() {
        let token = CancelToken::new();
        token.cancel();
        let builder = fluent_check()
            .forall("x", integer(0, 10))
            .then(|_| true);
        let exec = compile(&builder);
        let config = StrategyConfig::default()
            .with_sample_size(100_000)
            .with_max_iterations(100_000);
        let mut explorer = Explorer::new(
            &exec,
            &config,
            StoppingMode::Fixed,
            41,
            Some(token),
        );
        let out = explorer.explore();
        assert_eq!(out.outcome, RunOutcome::Exhausted);
        assert!(out.tests_run <= StrategyConfig::default().confidence_check_interval);
    }

    #[test]
    fn filter_exhaustion_discards_instead_of_looping() {
        let builder = fluent_check()
            .forall(
                "x",
                integer(0, 99).filter(|v| v.as_int().unwrap_or(0) > 200),
            )
            .then(|_| true);
        let exec = compile(&builder);
        let config = StrategyConfig::default().with_sample_size(100);
        let mut explorer = Explorer::new(&exec, &config, StoppingMode::Fixed, 43, None);
        let out = explorer.explore();
        assert_eq!(out.outcome, RunOutcome::Passed);
        assert_eq!(out.tests_passed, 0);
        assert!(out.tests_discarded > 0);
    }
}
