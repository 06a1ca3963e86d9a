//! The runner: explorer + shrinker + statistics, assembled into a
//! [`FluentResult`].

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::info;

use fc_common::{Error, FluentResult, FluentStatistics, Pick, Result, Value};
use fc_config::{validate_strategy, StrategyConfig};

use crate::explore::{CancelToken, Exploration, Explorer, RunOutcome, StoppingMode};
use crate::sample::rng::entropy_seed;
use crate::scenario::{FluentCheck, QuantifierKind};
use crate::shrink::{ShrinkBudget, ShrinkTarget, Shrinker};

/// Which terminal started the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// `check()`: fixed stopping, or confidence stopping when the config
    /// carries a confidence target.
    Default,
    /// `check_with_confidence(level)`.
    Confidence,
    /// `check_coverage()`.
    Coverage,
}

/// Execute a built scenario under the given strategy.
pub fn run(builder: &FluentCheck, config: StrategyConfig, mode: RunMode) -> Result<FluentResult> {
    run_with_cancel(builder, config, mode, None)
}

/// Like [`run`], with a cooperative cancellation token observed at check
/// boundaries.
pub fn run_with_cancel(
    builder: &FluentCheck,
    config: StrategyConfig,
    mode: RunMode,
    cancel: Option<CancelToken>,
) -> Result<FluentResult> {
    validate_strategy(&config).map_err(|e| Error::SchemaValidation(e.to_string()))?;
    let scenario = builder.build_scenario()?;
    let mut exec = scenario.compile()?;
    exec.hooks = builder.hooks().clone();

    let seed = config.seed.unwrap_or_else(entropy_seed);
    let stopping = match mode {
        RunMode::Default => {
            if config.confidence.is_some() {
                StoppingMode::Confidence
            } else {
                StoppingMode::Fixed
            }
        }
        RunMode::Confidence => StoppingMode::Confidence,
        RunMode::Coverage => StoppingMode::Coverage,
    };

    let start = Instant::now();
    let mut explorer = Explorer::new(&exec, &config, stopping, seed, cancel);
    let mut exploration = explorer.explore();

    let shrinking_stats = if exploration.outcome == RunOutcome::Failed
        && config.shrinking_enabled
        && !exploration.example.is_empty()
    {
        let targets: Vec<ShrinkTarget> = exec
            .quantifiers
            .iter()
            .filter(|q| {
                q.kind == QuantifierKind::Forall && exploration.example.contains_key(&q.name)
            })
            .map(|q| ShrinkTarget {
                slot: q.slot,
                name: q.name.clone(),
                arb: q.arb.clone(),
            })
            .collect();
        let initial: BTreeMap<usize, Pick> = targets
            .iter()
            .filter_map(|t| {
                exploration
                    .example
                    .get(&t.name)
                    .map(|p| (t.slot, p.clone()))
            })
            .collect();
        let shrinker = Shrinker::new(
            config.shrink_strategy,
            ShrinkBudget {
                max_attempts: config.shrink_attempts,
                max_rounds: config.shrink_rounds,
            },
        );
        let (best, stats) = shrinker.run(&mut explorer, &targets, initial);
        for target in &targets {
            if let Some(pick) = best.get(&target.slot) {
                exploration.example.insert(target.name.clone(), pick.clone());
            }
        }
        Some(stats)
    } else {
        None
    };
    drop(explorer);

    let result = assemble(&config, &exploration, shrinking_stats, seed, start, &exec);
    info!(
        satisfiable = result.satisfiable,
        tests_run = result.statistics.tests_run,
        seed,
        "check finished"
    );
    Ok(result)
}

fn assemble(
    config: &StrategyConfig,
    exploration: &Exploration,
    shrinking_stats: Option<fc_common::ShrinkingStats>,
    seed: u64,
    start: Instant,
    exec: &crate::scenario::ExecutableScenario,
) -> FluentResult {
    let top_exists = matches!(
        exec.groups.first().map(|g| g.kind),
        Some(QuantifierKind::Exists)
    );

    let (satisfiable, message) = match &exploration.outcome {
        RunOutcome::Passed => (true, None),
        RunOutcome::Failed => (false, None),
        // Budget ran out: vacuously fine for universal properties, a
        // missing witness for existential ones.
        RunOutcome::Exhausted => (!top_exists, None),
        RunOutcome::CoverageFailed { label } => (
            false,
            Some(format!("coverage floor not met for label {label:?}")),
        ),
    };

    let example = Value::Map(
        exploration
            .example
            .iter()
            .map(|(name, pick)| (name.clone(), pick.value.clone()))
            .collect(),
    );

    let wilson_level = config.confidence.unwrap_or(0.95);
    let has_labels = !exploration.labels.is_empty();
    let has_coverage = exec.hooks.has_coverage();

    let statistics = FluentStatistics {
        tests_run: exploration.tests_run,
        tests_passed: exploration.tests_passed,
        tests_discarded: exploration.tests_discarded,
        execution_time_ms: start.elapsed().as_millis() as u64,
        confidence: exploration.confidence,
        credible_interval: exploration.credible_interval,
        labels: has_labels.then(|| exploration.labels.counts().clone()),
        label_percentages: has_labels.then(|| exploration.labels.percentages()),
        coverage_results: has_coverage.then(|| exploration.coverage.results(wilson_level)),
        arbitrary_stats: exploration.arbitrary_stats.as_ref().map(|collectors| {
            collectors
                .iter()
                .map(|(name, c)| (name.clone(), c.summarize()))
                .collect()
        }),
        shrinking_stats,
    };

    FluentResult {
        satisfiable,
        example,
        seed,
        statistics,
        message,
    }
}
