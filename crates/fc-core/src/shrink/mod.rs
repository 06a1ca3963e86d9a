//! The shrinker: budgeted search for a minimal falsifying example.
//!
//! Works one quantifier at a time: ask the arbitrary for a narrower
//! space around the current counterexample value, sample candidates from
//! it (low-biased, so smaller values come up more), order them
//! simplest-first, and accept the first candidate under which the full
//! property still falsifies. The reported counterexample is therefore
//! always a re-verified witness of failure.

use std::collections::BTreeMap;

use tracing::debug;

use fc_common::{Pick, ShrinkingStats, Value};
use fc_config::ShrinkStrategyKind;

use crate::arbitrary::Arbitrary;

/// Candidates sampled per shrink step.
pub const CANDIDATES_PER_STEP: usize = 100;

/// What the shrinker needs from the run: falsification re-checks with
/// some quantifiers pinned, and candidate sampling from narrowed spaces.
pub trait ShrinkOracle {
    /// Re-run the property with the given slot -> pick overrides; true
    /// when it still falsifies (a thrown predicate counts).
    fn falsifies(&mut self, overrides: &BTreeMap<usize, Pick>) -> bool;

    /// Sample up to `n` candidates from a narrowed arbitrary.
    fn sample_candidates(&mut self, arb: &Arbitrary, slot: usize, n: usize) -> Vec<Pick>;
}

/// Attempt/round budget.
#[derive(Debug, Clone, Copy)]
pub struct ShrinkBudget {
    pub max_attempts: u64,
    pub max_rounds: u64,
}

/// One shrinkable quantifier position.
#[derive(Clone)]
pub struct ShrinkTarget {
    pub slot: usize,
    pub name: String,
    pub arb: Arbitrary,
}

/// Structural simplicity metric; candidates are tried simplest-first.
pub fn structural_metric(value: &Value) -> f64 {
    match value {
        Value::None => 0.0,
        Value::Bool(b) => *b as u8 as f64,
        Value::Int(n) => n.unsigned_abs() as f64,
        Value::Real(x) => x.abs(),
        Value::Str(s) => s.chars().count() as f64,
        Value::List(items) => {
            items.len() as f64 + items.iter().map(structural_metric).sum::<f64>()
        }
        Value::Map(entries) => entries.values().map(structural_metric).sum::<f64>(),
    }
}

pub struct Shrinker {
    strategy: ShrinkStrategyKind,
    budget: ShrinkBudget,
}

/// Result of one per-quantifier step.
enum StepResult {
    Improved(Pick),
    NoProgress,
    BudgetExhausted,
}

impl Shrinker {
    pub fn new(strategy: ShrinkStrategyKind, budget: ShrinkBudget) -> Self {
        Self { strategy, budget }
    }

    /// Shrink the counterexample; returns the (possibly unchanged)
    /// minimal example and the effort spent.
    pub fn run(
        &self,
        oracle: &mut dyn ShrinkOracle,
        targets: &[ShrinkTarget],
        initial: BTreeMap<usize, Pick>,
    ) -> (BTreeMap<usize, Pick>, ShrinkingStats) {
        let mut current = initial;
        let mut stats = ShrinkingStats::default();
        if targets.is_empty() {
            return (current, stats);
        }

        match self.strategy {
            ShrinkStrategyKind::SequentialExhaustive => {
                self.run_sequential(oracle, targets, &mut current, &mut stats)
            }
            ShrinkStrategyKind::RoundRobin => {
                self.run_round_robin(oracle, targets, &mut current, &mut stats)
            }
        }
        (current, stats)
    }

    fn run_sequential(
        &self,
        oracle: &mut dyn ShrinkOracle,
        targets: &[ShrinkTarget],
        current: &mut BTreeMap<usize, Pick>,
        stats: &mut ShrinkingStats,
    ) {
        for _ in 0..self.budget.max_rounds {
            let mut round_improved = false;
            for target in targets {
                // Exhaust progress on this quantifier before advancing.
                loop {
                    match self.step(oracle, target, current, stats) {
                        StepResult::Improved(pick) => {
                            round_improved = true;
                            current.insert(target.slot, pick);
                        }
                        StepResult::NoProgress => break,
                        StepResult::BudgetExhausted => return,
                    }
                }
            }
            stats.rounds_completed += 1;
            if !round_improved {
                break;
            }
        }
    }

    fn run_round_robin(
        &self,
        oracle: &mut dyn ShrinkOracle,
        targets: &[ShrinkTarget],
        current: &mut BTreeMap<usize, Pick>,
        stats: &mut ShrinkingStats,
    ) {
        for _ in 0..self.budget.max_rounds {
            let mut round_improved = false;
            for target in targets {
                match self.step(oracle, target, current, stats) {
                    StepResult::Improved(pick) => {
                        round_improved = true;
                        current.insert(target.slot, pick);
                    }
                    StepResult::NoProgress => {}
                    StepResult::BudgetExhausted => return,
                }
            }
            stats.rounds_completed += 1;
            if !round_improved {
                break;
            }
        }
    }

    /// One attempt at finding a smaller falsifying value for `target`.
    fn step(
        &self,
        oracle: &mut dyn ShrinkOracle,
        target: &ShrinkTarget,
        current: &BTreeMap<usize, Pick>,
        stats: &mut ShrinkingStats,
    ) -> StepResult {
        if stats.candidates_tested >= self.budget.max_attempts {
            return StepResult::BudgetExhausted;
        }
        let Some(current_pick) = current.get(&target.slot) else {
            // Partial scenario cannot be rebuilt for this quantifier.
            return StepResult::NoProgress;
        };
        let narrowed = target.arb.shrink(current_pick);
        if matches!(narrowed, Arbitrary::Empty) {
            return StepResult::NoProgress;
        }

        let remaining = (self.budget.max_attempts - stats.candidates_tested) as usize;
        let want = CANDIDATES_PER_STEP.min(remaining);
        // Corner cases seed the candidate set (they carry the narrowed
        // space's endpoints), then random low-biased fill.
        let mut candidates = narrowed.corner_cases();
        candidates.extend(oracle.sample_candidates(&narrowed, target.slot, want));
        // Only candidates the parent space provably admits.
        candidates.retain(|c| target.arb.can_generate(c));
        candidates.sort_by(|a, b| {
            structural_metric(&a.value).total_cmp(&structural_metric(&b.value))
        });
        candidates.dedup();

        let current_metric = structural_metric(&current_pick.value);
        for candidate in candidates {
            if structural_metric(&candidate.value) >= current_metric {
                continue;
            }
            if stats.candidates_tested >= self.budget.max_attempts {
                return StepResult::BudgetExhausted;
            }
            stats.candidates_tested += 1;
            let mut overrides = current.clone();
            overrides.insert(target.slot, candidate.clone());
            if oracle.falsifies(&overrides) {
                stats.improvements_made += 1;
                debug!(
                    quantifier = %target.name,
                    value = %candidate.value,
                    "shrink accepted"
                );
                return StepResult::Improved(candidate);
            }
        }
        StepResult::NoProgress
    }
}
