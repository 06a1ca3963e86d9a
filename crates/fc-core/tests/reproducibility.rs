//! Reproducibility: same seed, same arbitraries, same predicate must
//! give bit-identical picks, stopping points, and statistics.

use fc_core::prelude::*;

fn run_once(seed: u64) -> FluentResult {
    fluent_check()
        .forall("x", integer(-1000, 1000))
        .forall("xs", array(integer(0, 9), 0, 6))
        .classify(|b| b.int("x") >= 0, "non-negative")
        .then(|b| b.int("x").abs() < 900 || b.list("xs").len() < 4)
        .config(
            StrategyConfig::default()
                .with_sample_size(2000)
                .with_statistics(true)
                .with_random_generator(seed),
        )
        .check()
        .unwrap()
}

#[test]
fn same_seed_same_everything() {
    let a = run_once(12345);
    let b = run_once(12345);

    assert_eq!(a.satisfiable, b.satisfiable);
    assert_eq!(a.example, b.example);
    assert_eq!(a.seed, b.seed);
    assert_eq!(a.statistics.tests_run, b.statistics.tests_run);
    assert_eq!(a.statistics.tests_passed, b.statistics.tests_passed);
    assert_eq!(a.statistics.tests_discarded, b.statistics.tests_discarded);
    assert_eq!(a.statistics.labels, b.statistics.labels);
    assert_eq!(a.statistics.shrinking_stats, b.statistics.shrinking_stats);
}

#[test]
fn different_seeds_usually_differ() {
    // Not a guarantee, but two seeds agreeing on a 2000-test failing run
    // including the shrink path would mean the seed is being ignored.
    let a = run_once(1);
    let b = run_once(2);
    let same_example = a.example == b.example;
    let same_counts = a.statistics.tests_run == b.statistics.tests_run;
    assert!(
        !(same_example && same_counts && a.statistics.labels == b.statistics.labels),
        "two different seeds produced identical runs"
    );
}

#[test]
fn filter_warmup_is_independent_of_user_seed() {
    // The filter posterior warms from a fixed internal stream, so the
    // exhaustion decision for an impossible filter happens at the same
    // pick count for any user seed.
    fn discards(seed: u64) -> u64 {
        fluent_check()
            .forall(
                "x",
                integer(0, 99).filter(|v| v.as_int().unwrap_or(0) > 500),
            )
            .then(|_| true)
            .config(
                StrategyConfig::default()
                    .with_sample_size(50)
                    .with_random_generator(seed),
            )
            .check()
            .unwrap()
            .statistics
            .tests_discarded
    }
    assert_eq!(discards(111), discards(999));
}

#[test]
fn reported_seed_allows_replay_of_unseeded_runs() {
    let first = fluent_check()
        .forall("x", integer(-100, 100))
        .then(|b| b.int("x").abs() < 90)
        .config(StrategyConfig::default().with_sample_size(5000))
        .check()
        .unwrap();

    // Replay with the reported seed.
    let replay = fluent_check()
        .forall("x", integer(-100, 100))
        .then(|b| b.int("x").abs() < 90)
        .config(
            StrategyConfig::default()
                .with_sample_size(5000)
                .with_random_generator(first.seed),
        )
        .check()
        .unwrap();

    assert_eq!(first.satisfiable, replay.satisfiable);
    assert_eq!(first.example, replay.example);
    assert_eq!(first.statistics.tests_run, replay.statistics.tests_run);
}
