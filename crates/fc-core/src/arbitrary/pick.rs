//! Drawing values: the `pick` operation and run-local generation state.
//!
//! Arbitraries are immutable; everything a run learns while generating
//! (filter acceptance posteriors, uniqueness seen-sets, exhaustion flags)
//! lives in a [`PosteriorSession`] keyed by `(quantifier slot, instance
//! token)`. Sharing one filtered arbitrary across two scenario positions
//! therefore keeps two independent posteriors.

use std::collections::{HashMap, HashSet};

use fc_common::{Pick, Value};
use fc_math::{BetaPosterior, UPPER_QUANTILE};

use crate::sample::rng::{RandomSource, StdSource};

use super::Arbitrary;

/// Deterministic pre-samples fed to a fresh filter posterior before any
/// termination decision may consult it.
pub const FILTER_WARMUP_SAMPLES: usize = 10;
/// Rejection cap per pick call; the pick loop must exit regardless of the
/// generator stream.
pub const FILTER_MAX_ATTEMPTS: usize = 100;
/// Consecutive duplicate draws tolerated by uniqueness before giving up.
pub const UNIQUE_GUARD: usize = 50;
/// Seed of the internal warm-up stream. Fixed so reproducibility does not
/// depend on the user seed.
const WARMUP_SEED: u64 = 0x5eed_f11_7e12_u64;

/// Per-filter run state.
#[derive(Debug, Clone)]
pub(crate) struct FilterState {
    pub posterior: BetaPosterior,
    pub exhausted: bool,
}

impl FilterState {
    fn fresh() -> Self {
        Self {
            posterior: BetaPosterior::filter_prior(),
            exhausted: false,
        }
    }
}

/// Run-owned generation state for every stateful combinator.
#[derive(Debug, Default)]
pub struct PosteriorSession {
    pub(crate) filters: HashMap<(usize, u64), FilterState>,
    unique_seen: HashMap<(usize, u64), HashSet<u64>>,
}

impl PosteriorSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current posterior for a filter instance at a slot; the optimistic
    /// prior if the filter has not generated there yet.
    pub fn posterior(&self, slot: usize, token: u64) -> BetaPosterior {
        self.filters
            .get(&(slot, token))
            .map(|s| s.posterior)
            .unwrap_or_else(BetaPosterior::filter_prior)
    }

    /// Whether a filter instance has been declared exhausted at a slot.
    pub fn is_exhausted(&self, slot: usize, token: u64) -> bool {
        self.filters
            .get(&(slot, token))
            .map(|s| s.exhausted)
            .unwrap_or(false)
    }

    /// Forget uniqueness seen-sets (posteriors survive; they describe the
    /// arbitrary, not the sample run).
    pub fn clear_unique(&mut self) {
        self.unique_seen.clear();
    }
}

/// Everything a pick call needs: the entropy stream, the session, and the
/// quantifier slot the value is being drawn for.
pub struct PickContext<'a> {
    pub rng: &'a mut dyn RandomSource,
    pub session: &'a mut PosteriorSession,
    pub slot: usize,
}

impl<'a> PickContext<'a> {
    pub fn new(rng: &'a mut dyn RandomSource, session: &'a mut PosteriorSession, slot: usize) -> Self {
        Self { rng, session, slot }
    }
}

/// Uniform index in [0, n); n = 0 yields None.
pub(crate) fn uniform_index(rng: &mut dyn RandomSource, n: u64) -> Option<u64> {
    if n == 0 {
        return None;
    }
    let idx = (rng.next_f64() * n as f64) as u64;
    Some(idx.min(n - 1))
}

impl Arbitrary {
    /// Draw one pick. Returns None when the space is empty, a filter is
    /// exhausted, or a uniqueness guard trips; the explorer maps None to
    /// a discarded test.
    pub fn pick(&self, ctx: &mut PickContext<'_>) -> Option<Pick> {
        match self {
            Arbitrary::Empty => None,
            Arbitrary::Constant(v) => Some(Pick::leaf(v.clone())),
            Arbitrary::Boolean => Some(Pick::leaf(Value::Bool(ctx.rng.next_f64() < 0.5))),
            Arbitrary::Integer { min, max } => {
                let width = (*max as i128 - *min as i128 + 1) as u64;
                let offset = uniform_index(ctx.rng, width)?;
                let value = (*min as i128 + offset as i128) as i64;
                Some(Pick::leaf(Value::Int(value)))
            }
            Arbitrary::Real { min, max } => {
                let u = ctx.rng.next_f64();
                Some(Pick::leaf(Value::Real(min + u * (max - min))))
            }
            Arbitrary::Array {
                inner,
                min_len,
                max_len,
            } => {
                let span = (*max_len - *min_len) as u64 + 1;
                let len = *min_len + uniform_index(ctx.rng, span)? as usize;
                let mut values = Vec::with_capacity(len);
                let mut originals = Vec::with_capacity(len);
                for _ in 0..len {
                    let item = inner.pick(ctx)?;
                    values.push(item.value);
                    originals.push(item.original);
                }
                Some(Pick::new(Value::List(values), Value::List(originals)))
            }
            Arbitrary::Set {
                elements,
                min_len,
                max_len,
            } => {
                let span = (*max_len - *min_len) as u64 + 1;
                let k = *min_len + uniform_index(ctx.rng, span)? as usize;
                let chosen = choose_distinct(ctx.rng, elements.len(), k);
                let values: Vec<Value> = chosen.iter().map(|&i| elements[i].clone()).collect();
                let v = Value::List(values);
                Some(Pick::new(v.clone(), v))
            }
            Arbitrary::Tuple { components } => {
                let mut values = Vec::with_capacity(components.len());
                let mut originals = Vec::with_capacity(components.len());
                for component in components {
                    let item = component.pick(ctx)?;
                    values.push(item.value);
                    originals.push(item.original);
                }
                Some(Pick::new(Value::List(values), Value::List(originals)))
            }
            Arbitrary::Record { fields } => {
                let mut values = Vec::with_capacity(fields.len());
                let mut originals = Vec::with_capacity(fields.len());
                for (name, field) in fields {
                    let item = field.pick(ctx)?;
                    values.push((name.clone(), item.value));
                    originals.push((name.clone(), item.original));
                }
                Some(Pick::new(
                    super::map_value(values),
                    super::map_value(originals),
                ))
            }
            Arbitrary::Union { branches } => pick_union(branches, ctx),
            Arbitrary::Mapped { base, map, .. } => {
                let inner = base.pick(ctx)?;
                let mapped = map(&inner.value);
                Some(Pick::new(mapped, inner.original))
            }
            Arbitrary::Filtered {
                base,
                predicate,
                token,
            } => pick_filtered(base, predicate, *token, ctx),
            Arbitrary::Chained {
                base, continuation, ..
            } => {
                let outer = base.pick(ctx)?;
                let inner_arb = continuation(&outer.value);
                let inner = inner_arb.pick(ctx)?;
                Some(inner)
            }
            Arbitrary::Unique {
                base,
                by_original,
                token,
            } => pick_unique(base, *by_original, *token, ctx),
            Arbitrary::Pattern(p) => p.pick(ctx),
            Arbitrary::Graph(g) => g.pick(ctx),
            Arbitrary::Path(p) => p.pick(ctx),
        }
    }
}

/// Branch selection proportional to `size().value`, cumulative weights +
/// binary search. For filtered branches the weight is the
/// posterior-adjusted size at this slot.
fn pick_union(branches: &[Arbitrary], ctx: &mut PickContext<'_>) -> Option<Pick> {
    let mut cumulative: Vec<u128> = Vec::with_capacity(branches.len());
    let mut total: u128 = 0;
    for branch in branches {
        total += branch.size_in(ctx.session, ctx.slot).value as u128;
        cumulative.push(total);
    }
    if total == 0 {
        return None;
    }
    let target = (ctx.rng.next_f64() * total as f64) as u128;
    let target = target.min(total - 1);
    let idx = cumulative.partition_point(|&c| c <= target);
    branches.get(idx)?.pick(ctx)
}

fn pick_filtered(
    base: &Arbitrary,
    predicate: &super::FilterFn,
    token: u64,
    ctx: &mut PickContext<'_>,
) -> Option<Pick> {
    let key = (ctx.slot, token);

    // Cold start: seed the posterior with a fixed deterministic stream so
    // the first termination decision is already informed.
    if !ctx.session.filters.contains_key(&key) {
        ctx.session.filters.insert(key, FilterState::fresh());
        let mut warm_rng = StdSource::from_seed(WARMUP_SEED ^ token);
        for _ in 0..FILTER_WARMUP_SAMPLES {
            let picked = {
                let mut warm_ctx = PickContext::new(&mut warm_rng, ctx.session, ctx.slot);
                base.pick(&mut warm_ctx)
            };
            let Some(item) = picked else { break };
            let accepted = predicate(&item.value);
            if let Some(state) = ctx.session.filters.get_mut(&key) {
                if accepted {
                    state.posterior.observe_success();
                } else {
                    state.posterior.observe_failure();
                }
            }
        }
    }

    for _ in 0..FILTER_MAX_ATTEMPTS {
        let (posterior, exhausted) = match ctx.session.filters.get(&key) {
            Some(state) => (state.posterior, state.exhausted),
            None => (BetaPosterior::filter_prior(), false),
        };
        if exhausted {
            return None;
        }

        // Early termination: the upper credible bound says less than one
        // acceptable value remains in the base space.
        let base_size = base.size_in(ctx.session, ctx.slot);
        if (base_size.value as f64) * posterior.quantile(UPPER_QUANTILE) < 1.0 {
            if let Some(state) = ctx.session.filters.get_mut(&key) {
                state.exhausted = true;
            }
            return None;
        }

        let Some(item) = base.pick(ctx) else {
            return None;
        };
        let accepted = predicate(&item.value);
        if let Some(state) = ctx.session.filters.get_mut(&key) {
            if accepted {
                state.posterior.observe_success();
            } else {
                state.posterior.observe_failure();
            }
        }
        if accepted {
            return Some(item);
        }
    }
    None
}

fn pick_unique(
    base: &Arbitrary,
    by_original: bool,
    token: u64,
    ctx: &mut PickContext<'_>,
) -> Option<Pick> {
    let key = (ctx.slot, token);
    for _ in 0..UNIQUE_GUARD {
        let item = base.pick(ctx)?;
        let hash = if by_original {
            item.original.canonical_hash()
        } else {
            item.value.canonical_hash()
        };
        let seen = ctx.session.unique_seen.entry(key).or_default();
        if seen.insert(hash) {
            return Some(item);
        }
    }
    None
}

/// k distinct indices out of n via partial Fisher-Yates, returned in
/// ascending order so set picks are canonical.
fn choose_distinct(rng: &mut dyn RandomSource, n: usize, k: usize) -> Vec<usize> {
    let k = k.min(n);
    let mut indices: Vec<usize> = (0..n).collect();
    for i in 0..k {
        let remaining = (n - i) as u64;
        if let Some(j) = uniform_index(rng, remaining) {
            indices.swap(i, i + j as usize);
        }
    }
    let mut chosen: Vec<usize> = indices.into_iter().take(k).collect();
    chosen.sort_unstable();
    chosen
}
