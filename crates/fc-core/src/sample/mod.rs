//! Sampling strategies over arbitraries.
//!
//! A [`Sampler`] turns an arbitrary into a pick stream for one
//! quantifier position. Variants:
//! - [`UniformSampler`]: plain `pick` calls;
//! - [`BiasedSampler`]: corner cases first, then random fill;
//! - [`DedupingSampler`]: wraps another sampler with a seen-set and a
//!   progress guard;
//! - [`CachedSampler`]: memoizes whole sample vectors by arbitrary
//!   identity, trading per-position independence for work saved.

pub mod rng;

use std::collections::{HashMap, HashSet};

use fc_common::Pick;

use crate::arbitrary::{Arbitrary, PickContext};

/// Consecutive duplicate draws tolerated before a deduping sampler
/// returns early.
pub const DEDUP_PROGRESS_GUARD: usize = 50;

/// A pick stream for one quantifier position.
pub trait Sampler {
    /// Draw the next pick, or None when the space has nothing more to
    /// offer.
    fn draw(&mut self, arb: &Arbitrary, ctx: &mut PickContext<'_>) -> Option<Pick>;

    /// Draw up to `n` picks.
    fn sample(&mut self, arb: &Arbitrary, n: usize, ctx: &mut PickContext<'_>) -> Vec<Pick> {
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            match self.draw(arb, ctx) {
                Some(p) => out.push(p),
                None => break,
            }
        }
        out
    }

    /// Reset any per-run stream position (corner queues, seen-sets).
    fn reset(&mut self) {}
}

/// Plain random sampling.
#[derive(Debug, Default)]
pub struct UniformSampler;

impl Sampler for UniformSampler {
    fn draw(&mut self, arb: &Arbitrary, ctx: &mut PickContext<'_>) -> Option<Pick> {
        arb.pick(ctx)
    }
}

/// Corner cases first, then random fill.
#[derive(Debug, Default)]
pub struct BiasedSampler {
    queue: Option<Vec<Pick>>,
    emitted: usize,
}

impl BiasedSampler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sampler for BiasedSampler {
    fn draw(&mut self, arb: &Arbitrary, ctx: &mut PickContext<'_>) -> Option<Pick> {
        let queue = self
            .queue
            .get_or_insert_with(|| arb.corner_cases());
        if self.emitted < queue.len() {
            let pick = queue[self.emitted].clone();
            self.emitted += 1;
            return Some(pick);
        }
        arb.pick(ctx)
    }

    fn reset(&mut self) {
        self.queue = None;
        self.emitted = 0;
    }
}

/// Dedup wrapper: skips values already seen, giving up after
/// [`DEDUP_PROGRESS_GUARD`] consecutive duplicates.
pub struct DedupingSampler<S: Sampler> {
    inner: S,
    seen: HashSet<u64>,
    guard: usize,
}

impl<S: Sampler> DedupingSampler<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            seen: HashSet::new(),
            guard: DEDUP_PROGRESS_GUARD,
        }
    }
}

impl<S: Sampler> Sampler for DedupingSampler<S> {
    fn draw(&mut self, arb: &Arbitrary, ctx: &mut PickContext<'_>) -> Option<Pick> {
        for _ in 0..self.guard {
            let pick = self.inner.draw(arb, ctx)?;
            if self.seen.insert(pick.value.canonical_hash()) {
                return Some(pick);
            }
        }
        None
    }

    fn reset(&mut self) {
        self.inner.reset();
        self.seen.clear();
    }
}

/// Memoizing wrapper: `sample` results are replayed for arbitraries
/// already sampled anywhere in the scenario. Positions sharing an
/// arbitrary then see identical streams, which is the documented cost of
/// the saved work.
pub struct CachedSampler<S: Sampler> {
    inner: S,
    cache: HashMap<u64, Vec<Pick>>,
}

impl<S: Sampler> CachedSampler<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: HashMap::new(),
        }
    }
}

impl<S: Sampler> Sampler for CachedSampler<S> {
    fn draw(&mut self, arb: &Arbitrary, ctx: &mut PickContext<'_>) -> Option<Pick> {
        self.inner.draw(arb, ctx)
    }

    fn sample(&mut self, arb: &Arbitrary, n: usize, ctx: &mut PickContext<'_>) -> Vec<Pick> {
        let key = arb.structural_hash();
        if let Some(hit) = self.cache.get(&key) {
            if hit.len() >= n {
                return hit[..n].to_vec();
            }
        }
        let fresh = self.inner.sample(arb, n, ctx);
        self.cache.insert(key, fresh.clone());
        fresh
    }

    fn reset(&mut self) {
        self.inner.reset();
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::rng::StdSource;
    use super::*;
    use crate::arbitrary::{boolean, integer, PosteriorSession};

    fn parts() -> (StdSource, PosteriorSession) {
        (StdSource::from_seed(17), PosteriorSession::new())
    }

    #[test]
    fn biased_sampler_emits_corners_first() {
        let arb = integer(-100, 100);
        let corners = arb.corner_cases();
        let (mut rng, mut session) = parts();
        let mut ctx = PickContext::new(&mut rng, &mut session, 0);
        let mut sampler = BiasedSampler::new();
        let drawn = sampler.sample(&arb, corners.len() + 5, &mut ctx);
        assert_eq!(&drawn[..corners.len()], &corners[..]);
    }

    #[test]
    fn deduping_sampler_yields_distinct_values() {
        let arb = integer(0, 5);
        let (mut rng, mut session) = parts();
        let mut ctx = PickContext::new(&mut rng, &mut session, 0);
        let mut sampler = DedupingSampler::new(UniformSampler);
        let drawn = sampler.sample(&arb, 6, &mut ctx);
        let distinct: HashSet<u64> =
            drawn.iter().map(|p| p.value.canonical_hash()).collect();
        assert_eq!(distinct.len(), drawn.len());
    }

    #[test]
    fn deduping_sampler_terminates_on_tiny_space() {
        let arb = boolean();
        let (mut rng, mut session) = parts();
        let mut ctx = PickContext::new(&mut rng, &mut session, 0);
        let mut sampler = DedupingSampler::new(UniformSampler);
        let drawn = sampler.sample(&arb, 100, &mut ctx);
        assert_eq!(drawn.len(), 2);
    }

    #[test]
    fn cached_sampler_replays_per_arbitrary() {
        let arb = integer(0, 1_000_000);
        let (mut rng, mut session) = parts();
        let mut ctx = PickContext::new(&mut rng, &mut session, 0);
        let mut sampler = CachedSampler::new(UniformSampler);
        let first = sampler.sample(&arb, 10, &mut ctx);
        let second = sampler.sample(&arb, 10, &mut ctx);
        assert_eq!(first, second);
        // A structurally different arbitrary gets a fresh stream.
        let other = sampler.sample(&integer(0, 999_999), 10, &mut ctx);
        assert_ne!(first, other);
    }

    #[test]
    fn uniform_sampler_stops_on_empty_space() {
        let (mut rng, mut session) = parts();
        let mut ctx = PickContext::new(&mut rng, &mut session, 0);
        let mut sampler = UniformSampler;
        assert!(sampler.sample(&Arbitrary::Empty, 5, &mut ctx).is_empty());
    }
}
