//! Result schema: the bit-level contract of a check.
//!
//! Field names are the serialization contract (camelCase JSON); every
//! optional block is opt-in via strategy flags. `schemars` derives keep
//! the schema machine-checkable.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Per-label coverage verification outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoverageResult {
    pub label: String,
    pub required_percentage: f64,
    pub observed_percentage: f64,
    pub count: u64,
    pub satisfied: bool,
    /// Two-sided Wilson score interval at the configured level.
    pub confidence_interval: [f64; 2],
}

/// Shrinking effort accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShrinkingStats {
    pub candidates_tested: u64,
    pub rounds_completed: u64,
    pub improvements_made: u64,
}

/// One histogram bin over a numeric distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    pub lo: f64,
    pub hi: f64,
    pub count: u64,
}

/// Summary of a streamed numeric distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DistributionSummary {
    pub mean: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub q1: f64,
    pub q3: f64,
    pub histogram: Vec<HistogramBin>,
}

/// Opt-in per-arbitrary generation statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArbitraryStats {
    pub samples: u64,
    /// Distinct-value estimate (HyperLogLog).
    pub unique_estimate: u64,
    pub corner_cases_hit: u64,
    /// Value distribution for numeric arbitraries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric: Option<DistributionSummary>,
    /// Length distribution for strings and arrays.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<DistributionSummary>,
}

/// Calibrated statistics for one check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FluentStatistics {
    pub tests_run: u64,
    pub tests_passed: u64,
    pub tests_discarded: u64,
    pub execution_time_ms: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credible_interval: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_percentages: Option<BTreeMap<String, f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_results: Option<Vec<CoverageResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arbitrary_stats: Option<BTreeMap<String, ArbitraryStats>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shrinking_stats: Option<ShrinkingStats>,
}

/// Outcome of a scenario check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FluentResult {
    pub satisfiable: bool,
    /// Counterexample (for a failed forall) or witness (for exists);
    /// a name -> value map over the scenario's quantifiers.
    pub example: Value,
    pub seed: u64,
    pub statistics: FluentStatistics,
    /// Present when satisfiability was decided by an infeasible coverage
    /// floor or similar; names the offending label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FluentResult {
    /// Panic with a readable report unless the property held.
    ///
    /// Intended for test code; this is the one place the library panics
    /// on behalf of the user.
    pub fn assert_satisfiable(&self) {
        assert!(
            self.satisfiable,
            "property falsified by {} (seed {}, {} tests){}",
            self.example,
            self.seed,
            self.statistics.tests_run,
            self.message
                .as_deref()
                .map(|m| format!(": {m}"))
                .unwrap_or_default()
        );
    }

    /// Panic unless the property was falsified.
    pub fn assert_unsatisfiable(&self) {
        assert!(
            !self.satisfiable,
            "property unexpectedly held after {} tests (seed {})",
            self.statistics.tests_run, self.seed
        );
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_result(satisfiable: bool) -> FluentResult {
        FluentResult {
            satisfiable,
            example: Value::Map(
                [("x".to_string(), Value::Int(-50))].into_iter().collect(),
            ),
            seed: 42,
            statistics: FluentStatistics {
                tests_run: 100,
                tests_passed: 99,
                tests_discarded: 0,
                execution_time_ms: 3,
                ..Default::default()
            },
            message: None,
        }
    }

    #[test]
    fn json_field_names_are_camel_case() {
        let json = minimal_result(true).to_json().unwrap();
        assert!(json.contains(r#""testsRun":100"#));
        assert!(json.contains(r#""testsPassed":99"#));
        assert!(json.contains(r#""testsDiscarded":0"#));
        assert!(json.contains(r#""executionTimeMs":3"#));
        assert!(json.contains(r#""satisfiable":true"#));
    }

    #[test]
    fn optional_blocks_are_omitted_when_absent() {
        let json = minimal_result(true).to_json().unwrap();
        assert!(!json.contains("confidence"));
        assert!(!json.contains("coverageResults"));
        assert!(!json.contains("shrinkingStats"));
    }

    #[test]
    fn coverage_result_round_trip() {
        let cov = CoverageResult {
            label: "big".into(),
            required_percentage: 50.0,
            observed_percentage: 0.0,
            count: 0,
            satisfied: false,
            confidence_interval: [0.0, 0.05],
        };
        let json = serde_json::to_string(&cov).unwrap();
        assert!(json.contains(r#""requiredPercentage":50.0"#));
        let back: CoverageResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cov);
    }

    #[test]
    #[should_panic(expected = "property falsified")]
    fn assert_satisfiable_panics_on_failure() {
        minimal_result(false).assert_satisfiable();
    }

    #[test]
    fn assert_unsatisfiable_accepts_failure() {
        minimal_result(false).assert_unsatisfiable();
    }
}
