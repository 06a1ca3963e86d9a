//! Search-space size estimates with credible intervals.
//!
//! Sizes are exact for bounded, fully enumerable spaces and estimated
//! once a filter or non-injective map makes the effective cardinality
//! unknowable. Estimated sizes carry a 90% credible interval; interval
//! arithmetic here is conservative (products/sums of endpoints, ignoring
//! correlation) and saturating, so composition never overflows and never
//! loses the `lo <= value <= hi` invariant.

use serde::{Deserialize, Serialize};

/// Size of an arbitrary's search space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArbitrarySize {
    pub value: u64,
    /// True when the space is bounded and fully enumerable.
    pub exact: bool,
    /// Lower 90% credible endpoint (equals `value` when exact).
    pub lo: u64,
    /// Upper 90% credible endpoint (equals `value` when exact).
    pub hi: u64,
}

impl ArbitrarySize {
    /// An exactly known size: lo = hi = value.
    pub fn exact(value: u64) -> Self {
        Self {
            value,
            exact: true,
            lo: value,
            hi: value,
        }
    }

    /// An estimated size; endpoints are reordered and clamped around
    /// `value` so the invariant holds by construction.
    pub fn estimated(value: u64, lo: u64, hi: u64) -> Self {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        Self {
            value,
            exact: false,
            lo: lo.min(value),
            hi: hi.max(value),
        }
    }

    /// The empty space.
    pub fn zero() -> Self {
        Self::exact(0)
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0 && self.hi == 0
    }

    /// Product of two sizes; exact only when both are exact.
    pub fn product(&self, other: &ArbitrarySize) -> ArbitrarySize {
        let value = self.value.saturating_mul(other.value);
        if self.exact && other.exact {
            ArbitrarySize::exact(value)
        } else {
            ArbitrarySize::estimated(
                value,
                self.lo.saturating_mul(other.lo),
                self.hi.saturating_mul(other.hi),
            )
        }
    }

    /// Sum of two sizes; exact only when both are exact.
    pub fn sum(&self, other: &ArbitrarySize) -> ArbitrarySize {
        let value = self.value.saturating_add(other.value);
        if self.exact && other.exact {
            ArbitrarySize::exact(value)
        } else {
            ArbitrarySize::estimated(
                value,
                self.lo.saturating_add(other.lo),
                self.hi.saturating_add(other.hi),
            )
        }
    }

    /// k-th power, for fixed-length container spaces.
    pub fn pow(&self, k: u32) -> ArbitrarySize {
        let mut acc = ArbitrarySize::exact(1);
        for _ in 0..k {
            acc = acc.product(self);
        }
        acc
    }

    /// Scale by a posterior's acceptance estimate: value by the mode,
    /// endpoints by the credible quantiles (floor below, ceiling above).
    pub fn scale(&self, mode: f64, q_lo: f64, q_hi: f64) -> ArbitrarySize {
        let value = (self.value as f64 * mode.clamp(0.0, 1.0)).round() as u64;
        let lo = (self.lo as f64 * q_lo.clamp(0.0, 1.0)).floor() as u64;
        let hi = (self.hi as f64 * q_hi.clamp(0.0, 1.0)).ceil() as u64;
        ArbitrarySize::estimated(value, lo, hi)
    }
}
