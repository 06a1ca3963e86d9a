//! Beta posterior over an unknown proportion, updated one trial at a time.
//!
//! Two places in the engine carry one of these:
//! - every filtered arbitrary tracks its acceptance rate, and the upper
//!   credible bound drives early termination of exhausted filters;
//! - confidence-based stopping tracks the predicate pass rate as
//!   `Beta(1 + passed, 1 + failed)`.

use serde::{Deserialize, Serialize};

use super::beta::{beta_cdf, beta_inv_cdf};

/// Default credible mass used system-wide.
pub const CREDIBLE_WIDTH: f64 = 0.90;
/// Lower credible endpoint quantile for [`CREDIBLE_WIDTH`].
pub const LOWER_QUANTILE: f64 = 0.05;
/// Upper credible endpoint quantile for [`CREDIBLE_WIDTH`].
pub const UPPER_QUANTILE: f64 = 0.95;

/// Beta(alpha, beta) posterior with scalar conjugate updates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaPosterior {
    alpha: f64,
    beta: f64,
}

impl BetaPosterior {
    /// Create a posterior with validation.
    ///
    /// Returns None if either parameter is non-positive or NaN.
    pub fn new(alpha: f64, beta: f64) -> Option<Self> {
        if alpha.is_nan() || beta.is_nan() || alpha <= 0.0 || beta <= 0.0 {
            return None;
        }
        Some(Self { alpha, beta })
    }

    /// Uniform prior Beta(1, 1).
    pub fn uniform() -> Self {
        Self {
            alpha: 1.0,
            beta: 1.0,
        }
    }

    /// Prior for a fresh filter: Beta(2, 1), biased toward believing the
    /// filter accepts. Warm-up pre-samples pull it toward the truth before
    /// any termination decision consults it.
    pub fn filter_prior() -> Self {
        Self {
            alpha: 2.0,
            beta: 1.0,
        }
    }

    /// Posterior after `successes` and `failures` on a uniform prior.
    pub fn from_counts(successes: u64, failures: u64) -> Self {
        Self {
            alpha: 1.0 + successes as f64,
            beta: 1.0 + failures as f64,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Record a positive observation (filter accepted / test passed).
    pub fn observe_success(&mut self) {
        self.alpha += 1.0;
    }

    /// Record a negative observation (filter rejected / test failed).
    pub fn observe_failure(&mut self) {
        self.beta += 1.0;
    }

    /// Posterior mean alpha / (alpha + beta).
    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    /// Posterior variance.
    pub fn variance(&self) -> f64 {
        let sum = self.alpha + self.beta;
        (self.alpha * self.beta) / (sum * sum * (sum + 1.0))
    }

    /// Posterior mode (alpha-1)/(alpha+beta-2) when both parameters exceed
    /// one; the mean otherwise (the density is monotone or bathtub-shaped
    /// there and the mode sits on a boundary).
    pub fn mode(&self) -> f64 {
        if self.alpha > 1.0 && self.beta > 1.0 {
            (self.alpha - 1.0) / (self.alpha + self.beta - 2.0)
        } else {
            self.mean()
        }
    }

    /// CDF at x.
    pub fn cdf(&self, x: f64) -> f64 {
        beta_cdf(x, self.alpha, self.beta)
    }

    /// Quantile (inverse CDF) at q.
    pub fn quantile(&self, q: f64) -> f64 {
        beta_inv_cdf(q, self.alpha, self.beta)
    }

    /// Central credible interval holding `width` posterior mass.
    pub fn credible_interval(&self, width: f64) -> (f64, f64) {
        let tail = (1.0 - width) / 2.0;
        (self.quantile(tail), self.quantile(1.0 - tail))
    }

    /// Total observation count folded into this posterior relative to the
    /// uniform prior.
    pub fn observations(&self) -> f64 {
        (self.alpha - 1.0).max(0.0) + (self.beta - 1.0).max(0.0)
    }
}
