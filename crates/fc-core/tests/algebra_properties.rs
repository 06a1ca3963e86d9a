//! Property-based tests over the arbitrary algebra itself.

use proptest::prelude::*;

use fc_core::arbitrary::{
    array, boolean, integer, set, tuple, union, Arbitrary, PickContext, PosteriorSession,
};
use fc_core::sample::rng::StdSource;
use fc_math::{LOWER_QUANTILE, UPPER_QUANTILE};

/// A small zoo of composed arbitraries for generic invariants.
fn zoo() -> Vec<Arbitrary> {
    vec![
        integer(-100, 100),
        boolean(),
        array(integer(0, 9), 0, 5),
        set(vec![1i64, 2, 3, 4, 5], 1, 3),
        tuple(vec![integer(-5, 5), boolean()]),
        union(vec![integer(0, 9), integer(100, 109)]),
        integer(0, 100).filter(|v| v.as_int().unwrap_or(0) % 3 == 0),
        integer(0, 50).map_with_inverse(
            |v| fc_common::Value::Int(v.as_int().unwrap_or(0) * 2),
            |v| fc_common::Value::Int(v.as_int().unwrap_or(0) / 2),
        ),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Invariant: every pick satisfies membership.
    #[test]
    fn picks_are_members(seed in 0u64..10_000) {
        let mut rng = StdSource::from_seed(seed);
        let mut session = PosteriorSession::new();
        for arb in zoo() {
            let mut ctx = PickContext::new(&mut rng, &mut session, 0);
            for _ in 0..20 {
                if let Some(pick) = arb.pick(&mut ctx) {
                    prop_assert!(
                        arb.can_generate(&pick),
                        "{arb:?} rejected its own pick {:?}",
                        pick.value
                    );
                }
            }
        }
    }

    /// Invariant: every shrink-candidate satisfies the parent's
    /// membership.
    #[test]
    fn shrink_candidates_are_members(seed in 0u64..10_000) {
        let mut rng = StdSource::from_seed(seed);
        let mut session = PosteriorSession::new();
        for arb in zoo() {
            let initial = {
                let mut ctx = PickContext::new(&mut rng, &mut session, 0);
                arb.pick(&mut ctx)
            };
            let Some(initial) = initial else { continue };
            let narrowed = arb.shrink(&initial);
            let mut ctx = PickContext::new(&mut rng, &mut session, 0);
            for _ in 0..20 {
                if let Some(candidate) = narrowed.pick(&mut ctx) {
                    prop_assert!(
                        arb.can_generate(&candidate),
                        "{arb:?} rejected shrink candidate {:?} (initial {:?})",
                        candidate.value,
                        initial.value
                    );
                }
            }
        }
    }

    /// Invariant: size credible interval brackets the point estimate.
    #[test]
    fn size_interval_brackets_value(seed in 0u64..10_000) {
        let mut rng = StdSource::from_seed(seed);
        let mut session = PosteriorSession::new();
        for arb in zoo() {
            {
                let mut ctx = PickContext::new(&mut rng, &mut session, 0);
                for _ in 0..10 {
                    arb.pick(&mut ctx);
                }
            }
            let size = arb.size_in(&session, 0);
            prop_assert!(size.lo <= size.value && size.value <= size.hi, "{arb:?}: {size:?}");
            if size.exact {
                prop_assert!(size.lo == size.value && size.value == size.hi);
            }
        }
    }
}

#[test]
fn union_branch_frequency_converges_to_size_ratio() {
    // integer(0,9) has size 10, boolean size 2: expect 10/12 of picks
    // from the first branch.
    let arb = union(vec![integer(0, 9), boolean()]);
    let mut rng = StdSource::from_seed(2024);
    let mut session = PosteriorSession::new();
    let mut ctx = PickContext::new(&mut rng, &mut session, 0);
    let mut ints = 0u32;
    let n = 6000;
    for _ in 0..n {
        let p = arb.pick(&mut ctx).unwrap();
        if p.value.as_int().is_some() {
            ints += 1;
        }
    }
    let observed = ints as f64 / n as f64;
    let expected = 10.0 / 12.0;
    assert!(
        (observed - expected).abs() < 0.03,
        "branch frequency {observed} too far from {expected}"
    );
}

#[test]
fn filtered_posterior_interval_covers_true_rate() {
    // One-third acceptance; after a warmed run the 90% credible interval
    // should cover it.
    let arb = integer(0, 89).filter(|v| v.as_int().unwrap_or(0) < 30);
    let token = match &arb {
        Arbitrary::Filtered { token, .. } => *token,
        _ => unreachable!(),
    };
    let mut rng = StdSource::from_seed(77);
    let mut session = PosteriorSession::new();
    {
        let mut ctx = PickContext::new(&mut rng, &mut session, 0);
        for _ in 0..60 {
            arb.pick(&mut ctx);
        }
    }
    let posterior = session.posterior(0, token);
    let lo = posterior.quantile(LOWER_QUANTILE);
    let hi = posterior.quantile(UPPER_QUANTILE);
    let truth = 30.0 / 90.0;
    assert!(
        lo < truth && truth < hi,
        "true rate {truth} outside credible interval [{lo}, {hi}]"
    );
}

#[test]
fn integer_picks_are_roughly_uniform() {
    let arb = integer(0, 9);
    let mut rng = StdSource::from_seed(31415);
    let mut session = PosteriorSession::new();
    let mut ctx = PickContext::new(&mut rng, &mut session, 0);
    let mut counts = [0u32; 10];
    let n = 10_000;
    for _ in 0..n {
        let v = arb.pick(&mut ctx).unwrap().value.as_int().unwrap();
        counts[v as usize] += 1;
    }
    for (digit, &count) in counts.iter().enumerate() {
        let share = count as f64 / n as f64;
        assert!(
            (share - 0.1).abs() < 0.02,
            "digit {digit} drawn with frequency {share}"
        );
    }
}

#[test]
fn mapped_pick_keeps_the_preimage() {
    let arb = integer(0, 50).map(|v| fc_common::Value::Int(v.as_int().unwrap_or(0) * 10));
    let mut rng = StdSource::from_seed(99);
    let mut session = PosteriorSession::new();
    let mut ctx = PickContext::new(&mut rng, &mut session, 0);
    for _ in 0..50 {
        let p = arb.pick(&mut ctx).unwrap();
        let mapped = p.value.as_int().unwrap();
        let original = p.original.as_int().unwrap();
        assert_eq!(mapped, original * 10);
    }
}

#[test]
fn deep_equality_and_hash_compose() {
    let a = tuple(vec![array(integer(0, 5), 0, 3), boolean()]);
    let b = tuple(vec![array(integer(0, 5), 0, 3), boolean()]);
    assert_eq!(a, b);
    assert_eq!(a.structural_hash(), b.structural_hash());
    let c = tuple(vec![array(integer(0, 6), 0, 3), boolean()]);
    assert_ne!(a, c);
}
