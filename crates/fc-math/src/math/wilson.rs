//! Wilson score interval for binomial proportions.
//!
//! Coverage-based stopping verifies per-label floors sequentially: a label
//! is proven covered once its lower Wilson bound clears the floor, and
//! proven infeasible once its upper bound falls below it. The Wilson form
//! behaves sanely at small n and extreme proportions, where the normal
//! approximation does not.

use super::normal::z_for_level;

/// Two-sided Wilson score interval for `successes` out of `n` at z.
///
/// Returns (lower, upper), both clamped to [0, 1]. For n = 0 the interval
/// is the vacuous [0, 1].
pub fn wilson_bounds(successes: u64, n: u64, z: f64) -> (f64, f64) {
    if n == 0 {
        return (0.0, 1.0);
    }
    let n_f = n as f64;
    let p = successes as f64 / n_f;
    let z2 = z * z;

    let denom = 1.0 + z2 / n_f;
    let center = p + z2 / (2.0 * n_f);
    let spread = z * (p * (1.0 - p) / n_f + z2 / (4.0 * n_f * n_f)).sqrt();

    let lower = ((center - spread) / denom).clamp(0.0, 1.0);
    let upper = ((center + spread) / denom).clamp(0.0, 1.0);
    (lower, upper)
}

/// Wilson interval at a two-sided confidence level (e.g. 0.95).
pub fn wilson_at_level(successes: u64, n: u64, level: f64) -> (f64, f64) {
    wilson_bounds(successes, n, z_for_level(level))
}

/// Lower Wilson bound only.
pub fn wilson_lower(successes: u64, n: u64, z: f64) -> f64 {
    wilson_bounds(successes, n, z).0
}

/// Upper Wilson bound only.
pub fn wilson_upper(successes: u64, n: u64, z: f64) -> f64 {
    wilson_bounds(successes, n, z).1
}

#[cfg(test)]
mod tests {
    use super::*;

    const Z95: f64 = 1.959964;

    #[test]
    fn bounds_bracket_proportion() {
        let (lo, hi) = wilson_bounds(30, 50, Z95);
        let p = 0.6;
        assert!(lo < p && p < hi);
    }

    #[test]
    fn zero_n_is_vacuous() {
        assert_eq!(wilson_bounds(0, 0, Z95), (0.0, 1.0));
    }

    #[test]
    fn known_value_half() {
        // 50/100 at z=1.96: approximately (0.404, 0.596)
        let (lo, hi) = wilson_bounds(50, 100, Z95);
        assert!((lo - 0.404).abs() < 0.005, "lo = {lo}");
        assert!((hi - 0.596).abs() < 0.005, "hi = {hi}");
    }

    #[test]
    fn extreme_proportions_stay_in_unit_interval() {
        let (lo, _) = wilson_bounds(0, 10, Z95);
        let (_, hi) = wilson_bounds(10, 10, Z95);
        assert_eq!(lo, 0.0);
        assert_eq!(hi, 1.0);
        let (lo1, hi1) = wilson_bounds(1, 10, Z95);
        assert!(lo1 > 0.0 && hi1 < 1.0);
    }

    #[test]
    fn lower_monotone_in_proportion() {
        let n = 200;
        let mut prev = -1.0;
        for k in (0..=n).step_by(10) {
            let lo = wilson_lower(k, n, Z95);
            assert!(lo >= prev, "lower bound regressed at k={k}");
            prev = lo;
        }
    }

    #[test]
    fn lower_monotone_in_n_at_fixed_proportion() {
        // Same observed proportion, more data: lower bound tightens upward.
        let lo_small = wilson_lower(8, 10, Z95);
        let lo_mid = wilson_lower(80, 100, Z95);
        let lo_big = wilson_lower(800, 1000, Z95);
        assert!(lo_small < lo_mid && lo_mid < lo_big);
    }

    #[test]
    fn interval_narrows_with_n() {
        let (lo1, hi1) = wilson_bounds(5, 10, Z95);
        let (lo2, hi2) = wilson_bounds(500, 1000, Z95);
        assert!(hi2 - lo2 < hi1 - lo1);
    }

    #[test]
    fn level_api_matches_z_api() {
        let a = wilson_at_level(30, 50, 0.95);
        let b = wilson_bounds(30, 50, crate::z_for_level(0.95));
        assert!((a.0 - b.0).abs() < 1e-12 && (a.1 - b.1).abs() < 1e-12);
    }
}
