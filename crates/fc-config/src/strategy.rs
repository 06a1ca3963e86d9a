//! Strategy options controlling exploration, stopping, and shrinking.

use serde::{Deserialize, Serialize};

/// Which shrinking search strategy to run over the quantifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShrinkStrategyKind {
    /// Fix all but one quantifier and exhaust progress on it before
    /// advancing, repeating whole passes up to the round budget.
    #[default]
    SequentialExhaustive,
    /// One shrink attempt per quantifier in rotation.
    RoundRobin,
}

/// Exploration strategy configuration.
///
/// Every field has a serialized name (camelCase) and a `with*` builder
/// method; unset optional fields leave the corresponding feature off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StrategyConfig {
    /// Successful tests to run under fixed stopping.
    pub sample_size: u64,
    /// Hard cap on tests regardless of stopping rule.
    pub max_iterations: u64,
    /// Target confidence for Bayesian stopping; None means fixed stopping.
    pub confidence: Option<f64>,
    /// Null-hypothesis pass rate the confidence is measured against.
    pub pass_rate_threshold: f64,
    /// Confidence floor that must be reached before sample-size
    /// termination is honored.
    pub min_confidence: Option<f64>,
    /// Width of reported credible intervals.
    pub credible_interval_width: f64,
    /// Seed for the pick stream; None draws one from entropy.
    pub seed: Option<u64>,
    /// Collect label/coverage statistics.
    pub statistics: bool,
    /// Collect per-arbitrary distribution statistics (implies
    /// `statistics`).
    pub detailed_statistics: bool,
    /// Emit corner cases before random fill.
    pub bias: bool,
    /// Run the shrinker on counterexamples.
    pub shrinking_enabled: bool,
    /// Total shrink candidate budget.
    pub shrink_attempts: u64,
    /// Maximum passes over all quantifiers.
    pub shrink_rounds: u64,
    /// Shrinking search strategy.
    pub shrink_strategy: ShrinkStrategyKind,
    /// How often (in tests) stopping conditions and cancellation are
    /// checked.
    pub confidence_check_interval: u64,
    /// Wall-clock budget; consulted at check boundaries.
    pub max_time_ms: Option<u64>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            sample_size: 1000,
            max_iterations: 100_000,
            confidence: None,
            pass_rate_threshold: 0.95,
            min_confidence: None,
            credible_interval_width: 0.90,
            seed: None,
            statistics: false,
            detailed_statistics: false,
            bias: true,
            shrinking_enabled: true,
            shrink_attempts: 1000,
            shrink_rounds: 4,
            shrink_strategy: ShrinkStrategyKind::default(),
            confidence_check_interval: 100,
            max_time_ms: None,
        }
    }
}

impl StrategyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed stopping after n successful tests.
    pub fn with_sample_size(mut self, n: u64) -> Self {
        self.sample_size = n;
        self
    }

    /// Bayesian stopping at the given target confidence (0-1).
    pub fn with_confidence(mut self, level: f64) -> Self {
        self.confidence = Some(level);
        self
    }

    /// Null-hypothesis pass rate for confidence stopping.
    pub fn with_pass_rate_threshold(mut self, p: f64) -> Self {
        self.pass_rate_threshold = p;
        self
    }

    /// Confidence floor before sample-size termination is honored.
    pub fn with_min_confidence(mut self, level: f64) -> Self {
        self.min_confidence = Some(level);
        self
    }

    /// Hard cap irrespective of stopping rule.
    pub fn with_max_iterations(mut self, n: u64) -> Self {
        self.max_iterations = n;
        self
    }

    /// Fixed seed for reproducible runs.
    pub fn with_random_generator(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_statistics(mut self, enabled: bool) -> Self {
        self.statistics = enabled;
        self
    }

    /// Enables per-arbitrary distributions on top of label statistics.
    pub fn with_detailed_statistics(mut self) -> Self {
        self.statistics = true;
        self.detailed_statistics = true;
        self
    }

    pub fn with_bias(mut self) -> Self {
        self.bias = true;
        self
    }

    pub fn without_bias(mut self) -> Self {
        self.bias = false;
        self
    }

    pub fn with_shrinking(mut self, attempts: u64) -> Self {
        self.shrinking_enabled = true;
        self.shrink_attempts = attempts;
        self
    }

    pub fn without_shrinking(mut self) -> Self {
        self.shrinking_enabled = false;
        self
    }

    pub fn with_shrinking_strategy(mut self, strategy: ShrinkStrategyKind) -> Self {
        self.shrink_strategy = strategy;
        self
    }

    pub fn with_credible_interval_width(mut self, width: f64) -> Self {
        self.credible_interval_width = width;
        self
    }

    pub fn with_max_time_ms(mut self, ms: u64) -> Self {
        self.max_time_ms = Some(ms);
        self
    }

    pub fn with_confidence_check_interval(mut self, tests: u64) -> Self {
        self.confidence_check_interval = tests;
        self
    }

    /// Whether any statistics block should be collected.
    pub fn wants_statistics(&self) -> bool {
        self.statistics || self.detailed_statistics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let c = StrategyConfig::default();
        assert_eq!(c.sample_size, 1000);
        assert_eq!(c.confidence_check_interval, 100);
        assert!(c.bias);
        assert!(c.shrinking_enabled);
        assert!(c.confidence.is_none());
    }

    #[test]
    fn builder_chains() {
        let c = StrategyConfig::new()
            .with_sample_size(200)
            .with_confidence(0.99)
            .with_pass_rate_threshold(0.95)
            .without_bias()
            .with_shrinking(500)
            .with_shrinking_strategy(ShrinkStrategyKind::RoundRobin)
            .with_random_generator(7);
        assert_eq!(c.sample_size, 200);
        assert_eq!(c.confidence, Some(0.99));
        assert!(!c.bias);
        assert_eq!(c.shrink_attempts, 500);
        assert_eq!(c.shrink_strategy, ShrinkStrategyKind::RoundRobin);
        assert_eq!(c.seed, Some(7));
    }

    #[test]
    fn detailed_statistics_implies_statistics() {
        let c = StrategyConfig::new().with_detailed_statistics();
        assert!(c.statistics && c.detailed_statistics);
        assert!(c.wants_statistics());
    }

    #[test]
    fn json_round_trip() {
        let c = StrategyConfig::new()
            .with_confidence(0.99)
            .with_max_time_ms(5000);
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains(r#""sampleSize":1000"#));
        assert!(json.contains(r#""shrinkStrategy":"sequential-exhaustive""#));
        let back: StrategyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let back: StrategyConfig = serde_json::from_str(r#"{"sampleSize": 50}"#).unwrap();
        assert_eq!(back.sample_size, 50);
        assert_eq!(back.max_iterations, 100_000);
    }
}
