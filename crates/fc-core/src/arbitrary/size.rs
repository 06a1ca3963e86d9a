//! Size estimation and propagation.
//!
//! Sizes are exact for enumerable structure and become estimated the
//! moment a filter or lossy map enters the composition. Filtered sizes
//! are read off the run's posterior for that (slot, instance) pair;
//! outside a run the optimistic prior applies.

use fc_common::ArbitrarySize;
use fc_math::{LOWER_QUANTILE, UPPER_QUANTILE};

use super::pick::PosteriorSession;
use super::Arbitrary;

/// Hard cap on length terms walked when summing geometric container
/// sizes; beyond this the sum has saturated for any inner size > 1.
const GEOMETRIC_TERM_CAP: usize = 256;

/// Distinguishable values attributed to a non-degenerate real interval.
/// A continuum has no cardinality the algebra can use; 2^32 keeps real
/// spaces large but composable without instantly saturating products.
const REAL_SPACE: u64 = 1 << 32;

impl Arbitrary {
    /// Size against a fresh session: filters report their prior-mode
    /// estimate. Scenario-level search space sizes use this.
    pub fn size(&self) -> ArbitrarySize {
        self.size_in(&PosteriorSession::new(), 0)
    }

    /// Size as currently estimated by the given run session.
    pub fn size_in(&self, session: &PosteriorSession, slot: usize) -> ArbitrarySize {
        match self {
            Arbitrary::Empty => ArbitrarySize::zero(),
            Arbitrary::Constant(_) => ArbitrarySize::exact(1),
            Arbitrary::Boolean => ArbitrarySize::exact(2),
            Arbitrary::Integer { min, max } => {
                let width = (*max as i128 - *min as i128 + 1).max(0) as u128;
                ArbitrarySize::exact(width.min(u64::MAX as u128) as u64)
            }
            Arbitrary::Real { min, max } => {
                if min == max {
                    ArbitrarySize::exact(1)
                } else {
                    ArbitrarySize::exact(REAL_SPACE)
                }
            }
            Arbitrary::Array {
                inner,
                min_len,
                max_len,
            } => geometric_sum(&inner.size_in(session, slot), *min_len, *max_len),
            Arbitrary::Set {
                elements,
                min_len,
                max_len,
            } => {
                let n = elements.len() as u64;
                let mut total: u64 = 0;
                for k in *min_len..=*max_len {
                    total = total.saturating_add(fc_math::choose(n, k as u64));
                }
                ArbitrarySize::exact(total)
            }
            Arbitrary::Tuple { components } => components
                .iter()
                .map(|c| c.size_in(session, slot))
                .fold(ArbitrarySize::exact(1), |acc, s| acc.product(&s)),
            Arbitrary::Record { fields } => fields
                .iter()
                .map(|(_, a)| a.size_in(session, slot))
                .fold(ArbitrarySize::exact(1), |acc, s| acc.product(&s)),
            Arbitrary::Union { branches } => branches
                .iter()
                .map(|b| b.size_in(session, slot))
                .fold(ArbitrarySize::zero(), |acc, s| acc.sum(&s)),
            // Upper bound when the map is not injective; without an
            // inverse there is nothing better to propagate.
            Arbitrary::Mapped { base, .. } => base.size_in(session, slot),
            Arbitrary::Filtered { base, token, .. } => {
                let base_size = base.size_in(session, slot);
                let posterior = session.posterior(slot, *token);
                base_size.scale(
                    posterior.mode(),
                    posterior.quantile(LOWER_QUANTILE),
                    posterior.quantile(UPPER_QUANTILE),
                )
            }
            // Documented under-approximation: the continuation's
            // contribution is not counted.
            Arbitrary::Chained { base, .. } => base.size_in(session, slot),
            // Distinct cardinality is a count-distinct problem; the base
            // size is the upper bound reported here.
            Arbitrary::Unique { base, .. } => base.size_in(session, slot),
            Arbitrary::Pattern(p) => p.size(),
            Arbitrary::Graph(g) => g.size(),
            Arbitrary::Path(p) => p.size(),
        }
    }
}

/// Sum of inner^k for k in [min_len, max_len], with saturation.
fn geometric_sum(inner: &ArbitrarySize, min_len: usize, max_len: usize) -> ArbitrarySize {
    if max_len < min_len {
        return ArbitrarySize::zero();
    }
    let capped_max = max_len.min(min_len + GEOMETRIC_TERM_CAP);
    let mut total = ArbitrarySize::exact(0);
    let mut term = inner.pow(min_len as u32);
    for k in min_len..=capped_max {
        total = total.sum(&term);
        if total.value == u64::MAX {
            break;
        }
        if k < capped_max {
            term = term.product(inner);
        }
    }
    // The cap only matters for spaces that saturated anyway unless the
    // inner size is 1; patch that exact case.
    if capped_max < max_len && inner.value <= 1 {
        let extra = (max_len - capped_max) as u64;
        total = total.sum(&ArbitrarySize::exact(extra.saturating_mul(inner.value)));
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitrary::{
        array, boolean, constant, integer, real, set, tuple, union, Arbitrary,
    };
    use crate::arbitrary::pick::PickContext;
    use crate::sample::rng::StdSource;
    use fc_common::Value;

    #[test]
    fn leaf_sizes_are_exact() {
        assert_eq!(constant(1i64).size(), ArbitrarySize::exact(1));
        assert_eq!(boolean().size(), ArbitrarySize::exact(2));
        assert_eq!(integer(-100, 100).size(), ArbitrarySize::exact(201));
        assert_eq!(Arbitrary::Empty.size(), ArbitrarySize::zero());
    }

    #[test]
    fn degenerate_real_is_unit() {
        assert_eq!(real(2.5, 2.5).size(), ArbitrarySize::exact(1));
        assert!(real(0.0, 1.0).size().value > 1);
    }

    #[test]
    fn array_size_is_geometric_sum() {
        // booleans of length 0..=3: 1 + 2 + 4 + 8 = 15
        let a = array(boolean(), 0, 3);
        assert_eq!(a.size(), ArbitrarySize::exact(15));
        // fixed length: 2^4
        assert_eq!(array(boolean(), 4, 4).size(), ArbitrarySize::exact(16));
    }

    #[test]
    fn set_size_sums_binomials() {
        // C(4,1) + C(4,2) = 4 + 6
        let s = set(vec![1i64, 2, 3, 4], 1, 2);
        assert_eq!(s.size(), ArbitrarySize::exact(10));
    }

    #[test]
    fn tuple_size_is_product() {
        let t = tuple(vec![integer(0, 9), boolean()]);
        assert_eq!(t.size(), ArbitrarySize::exact(20));
    }

    #[test]
    fn union_size_is_sum() {
        let u = union(vec![integer(0, 9), boolean()]);
        assert_eq!(u.size(), ArbitrarySize::exact(12));
    }

    #[test]
    fn filtered_size_starts_from_prior_mode() {
        let f = integer(0, 99).filter(|v| v.as_int().unwrap_or(0) < 10);
        let size = f.size();
        assert!(!size.exact);
        // Prior Beta(2,1): mode falls back to mean 2/3.
        assert_eq!(size.value, 67);
        assert!(size.lo <= size.value && size.value <= size.hi);
    }

    #[test]
    fn filtered_size_tightens_with_observations() {
        let f = integer(0, 99).filter(|v| v.as_int().unwrap_or(0) < 10);
        let mut rng = StdSource::from_seed(3);
        let mut session = PosteriorSession::new();
        {
            let mut ctx = PickContext::new(&mut rng, &mut session, 0);
            for _ in 0..40 {
                f.pick(&mut ctx);
            }
        }
        let size = f.size_in(&session, 0);
        // True acceptance is 10%; the estimate should have moved well
        // below the prior's 67.
        assert!(size.value < 40, "size {size:?} did not tighten");
        assert!(size.lo <= size.value && size.value <= size.hi);
    }

    #[test]
    fn mapped_size_inherits_base() {
        let m = integer(0, 9).map(|v| Value::Int(v.as_int().unwrap_or(0) % 3));
        assert_eq!(m.size().value, 10);
    }

    #[test]
    fn chained_size_equals_base() {
        let c = integer(0, 9).chain(|_| boolean());
        assert_eq!(c.size().value, 10);
    }

    #[test]
    fn estimated_flag_propagates_through_products() {
        let f = integer(0, 9).filter(|_| true);
        let t = tuple(vec![f, boolean()]);
        assert!(!t.size().exact);
    }

    #[test]
    fn long_array_saturates() {
        let a = array(integer(0, 255), 0, 10_000);
        assert_eq!(a.size().value, u64::MAX);
    }
}
