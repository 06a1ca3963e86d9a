//! Streaming statistics for a single run.
//!
//! Everything here is incremental and bounded: Welford mean/variance,
//! running min/max, a reservoir buffer for quantiles, an on-demand
//! histogram, label and coverage tables with Wilson intervals, and a
//! HyperLogLog distinct-value estimator for the opt-in per-arbitrary
//! block.

use std::collections::BTreeMap;

use fc_common::{
    ArbitraryStats, CoverageResult, DistributionSummary, HistogramBin, Pick, Value,
};
use fc_math::{wilson_at_level, z_for_level, wilson_bounds};

/// Default reservoir capacity.
pub const RESERVOIR_CAPACITY: usize = 10_000;
/// Default histogram bin count.
pub const HISTOGRAM_BINS: usize = 10;
/// HyperLogLog register count exponent (2^10 registers, ~3% error).
const HLL_BITS: u32 = 10;

/// Welford's online mean/variance with running extrema.
#[derive(Debug, Clone, Default)]
pub struct StreamingMoments {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl StreamingMoments {
    pub fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = x - self.mean;
        self.m2 += delta * delta2;
        self.min = self.min.min(x);
        self.max = self.max.max(x);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.mean
        }
    }

    /// Population variance.
    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.m2 / self.count as f64
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

/// Reservoir sample of a value stream, for quantiles and histograms.
///
/// Replacement draws come from an internal xorshift stream so enabling
/// statistics never perturbs the pick stream.
#[derive(Debug, Clone)]
pub struct ReservoirBuffer {
    capacity: usize,
    seen: u64,
    values: Vec<f64>,
    state: u64,
}

impl Default for ReservoirBuffer {
    fn default() -> Self {
        Self::with_capacity(RESERVOIR_CAPACITY)
    }
}

impl ReservoirBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            seen: 0,
            values: Vec::new(),
            state: 0x243f_6a88_85a3_08d3,
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    pub fn push(&mut self, x: f64) {
        self.seen += 1;
        if self.values.len() < self.capacity {
            self.values.push(x);
            return;
        }
        let j = self.next_u64() % self.seen;
        if (j as usize) < self.capacity {
            self.values[j as usize] = x;
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Quantile by sorting a copy of the buffer.
    pub fn quantile(&self, q: f64) -> f64 {
        if self.values.is_empty() {
            return f64::NAN;
        }
        let mut sorted = self.values.clone();
        sorted.sort_by(f64::total_cmp);
        let idx = ((sorted.len() - 1) as f64 * q.clamp(0.0, 1.0)).round() as usize;
        sorted[idx]
    }

    /// Fixed-bin histogram over the buffer's observed range.
    pub fn histogram(&self, bins: usize) -> Vec<HistogramBin> {
        if self.values.is_empty() || bins == 0 {
            return Vec::new();
        }
        let lo = self.values.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = self.values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        if lo == hi {
            return vec![HistogramBin {
                lo,
                hi,
                count: self.values.len() as u64,
            }];
        }
        let width = (hi - lo) / bins as f64;
        let mut counts = vec![0u64; bins];
        for &v in &self.values {
            let idx = (((v - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }
        counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                lo: lo + i as f64 * width,
                hi: lo + (i + 1) as f64 * width,
                count,
            })
            .collect()
    }
}

/// HyperLogLog distinct-count estimator.
#[derive(Debug, Clone)]
pub struct HyperLogLog {
    registers: Vec<u8>,
}

impl Default for HyperLogLog {
    fn default() -> Self {
        Self::new()
    }
}

impl HyperLogLog {
    pub fn new() -> Self {
        Self {
            registers: vec![0; 1 << HLL_BITS],
        }
    }

    pub fn add(&mut self, hash: u64) {
        let idx = (hash >> (64 - HLL_BITS)) as usize;
        let rest = hash << HLL_BITS;
        let rank = (rest.leading_zeros() + 1).min(64 - HLL_BITS + 1) as u8;
        if rank > self.registers[idx] {
            self.registers[idx] = rank;
        }
    }

    pub fn estimate(&self) -> u64 {
        let m = self.registers.len() as f64;
        let alpha = 0.7213 / (1.0 + 1.079 / m);
        let sum: f64 = self
            .registers
            .iter()
            .map(|&r| 2f64.powi(-(r as i32)))
            .sum();
        let raw = alpha * m * m / sum;
        // Linear counting below the small-range threshold.
        let zeros = self.registers.iter().filter(|&&r| r == 0).count();
        let estimate = if raw <= 2.5 * m && zeros > 0 {
            m * (m / zeros as f64).ln()
        } else {
            raw
        };
        estimate.round() as u64
    }
}

/// Label occurrence counts.
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    counts: BTreeMap<String, u64>,
    total: u64,
}

impl LabelTable {
    pub fn record(&mut self, label: &str) {
        *self.counts.entry(label.to_string()).or_insert(0) += 1;
    }

    /// Count one classified test (denominator for percentages).
    pub fn bump_total(&mut self) {
        self.total += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn counts(&self) -> &BTreeMap<String, u64> {
        &self.counts
    }

    pub fn percentages(&self) -> BTreeMap<String, f64> {
        let denom = self.total.max(1) as f64;
        self.counts
            .iter()
            .map(|(k, v)| (k.clone(), 100.0 * *v as f64 / denom))
            .collect()
    }
}

/// One coverage requirement being verified sequentially.
#[derive(Debug, Clone)]
pub struct CoverageFloor {
    pub label: String,
    /// Required share in percent.
    pub required: f64,
    pub hits: u64,
}

/// Coverage table: per-label floors with Wilson-interval verdicts.
#[derive(Debug, Clone, Default)]
pub struct CoverageTable {
    floors: Vec<CoverageFloor>,
    observed: u64,
}

impl CoverageTable {
    pub fn add_floor(&mut self, label: impl Into<String>, required: f64) {
        self.floors.push(CoverageFloor {
            label: label.into(),
            required,
            hits: 0,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.floors.is_empty()
    }

    /// Record one test; `hit` flags per floor, in declaration order.
    pub fn record(&mut self, hits: &[bool]) {
        self.observed += 1;
        for (floor, hit) in self.floors.iter_mut().zip(hits) {
            if *hit {
                floor.hits += 1;
            }
        }
    }

    pub fn floor_count(&self) -> usize {
        self.floors.len()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.floors.iter().map(|f| f.label.as_str())
    }

    /// All floors proven satisfied: every lower bound clears its floor.
    pub fn all_satisfied(&self, level: f64) -> bool {
        let z = z_for_level(level);
        self.floors.iter().all(|f| {
            wilson_bounds(f.hits, self.observed, z).0 > f.required / 100.0
        })
    }

    /// First floor proven infeasible: upper bound below the floor.
    pub fn first_infeasible(&self, level: f64) -> Option<&str> {
        let z = z_for_level(level);
        self.floors.iter().find_map(|f| {
            let (_, upper) = wilson_bounds(f.hits, self.observed, z);
            (upper < f.required / 100.0).then_some(f.label.as_str())
        })
    }

    /// Materialize coverage results at the given confidence level.
    pub fn results(&self, level: f64) -> Vec<CoverageResult> {
        self.floors
            .iter()
            .map(|f| {
                let (lo, hi) = wilson_at_level(f.hits, self.observed, level);
                let observed_pct = if self.observed == 0 {
                    0.0
                } else {
                    100.0 * f.hits as f64 / self.observed as f64
                };
                CoverageResult {
                    label: f.label.clone(),
                    required_percentage: f.required,
                    observed_percentage: observed_pct,
                    count: f.hits,
                    satisfied: lo > f.required / 100.0,
                    confidence_interval: [lo, hi],
                }
            })
            .collect()
    }
}

/// Opt-in per-arbitrary collector.
#[derive(Debug, Clone)]
pub struct ArbitraryCollector {
    samples: u64,
    corner_hits: u64,
    corner_hashes: std::collections::HashSet<u64>,
    distinct: HyperLogLog,
    numeric: StreamingMoments,
    numeric_buffer: ReservoirBuffer,
    length: StreamingMoments,
    length_buffer: ReservoirBuffer,
}

impl ArbitraryCollector {
    pub fn new(corner_cases: &[Pick]) -> Self {
        Self {
            samples: 0,
            corner_hits: 0,
            corner_hashes: corner_cases
                .iter()
                .map(|p| p.value.canonical_hash())
                .collect(),
            distinct: HyperLogLog::new(),
            numeric: StreamingMoments::new(),
            numeric_buffer: ReservoirBuffer::default(),
            length: StreamingMoments::new(),
            length_buffer: ReservoirBuffer::default(),
        }
    }

    pub fn record(&mut self, pick: &Pick) {
        self.samples += 1;
        let hash = pick.value.canonical_hash();
        self.distinct.add(hash);
        if self.corner_hashes.contains(&hash) {
            self.corner_hits += 1;
        }
        match &pick.value {
            Value::Int(n) => {
                self.numeric.push(*n as f64);
                self.numeric_buffer.push(*n as f64);
            }
            Value::Real(x) => {
                self.numeric.push(*x);
                self.numeric_buffer.push(*x);
            }
            Value::Str(s) => {
                let len = s.chars().count() as f64;
                self.length.push(len);
                self.length_buffer.push(len);
            }
            Value::List(items) => {
                let len = items.len() as f64;
                self.length.push(len);
                self.length_buffer.push(len);
            }
            _ => {}
        }
    }

    pub fn summarize(&self) -> ArbitraryStats {
        ArbitraryStats {
            samples: self.samples,
            unique_estimate: self.distinct.estimate(),
            corner_cases_hit: self.corner_hits,
            numeric: summarize_distribution(&self.numeric, &self.numeric_buffer),
            length: summarize_distribution(&self.length, &self.length_buffer),
        }
    }
}

fn summarize_distribution(
    moments: &StreamingMoments,
    buffer: &ReservoirBuffer,
) -> Option<DistributionSummary> {
    if moments.count() == 0 {
        return None;
    }
    Some(DistributionSummary {
        mean: moments.mean(),
        variance: moments.variance(),
        min: moments.min(),
        max: moments.max(),
        median: buffer.quantile(0.5),
        q1: buffer.quantile(0.25),
        q3: buffer.quantile(0.75),
        histogram: buffer.histogram(HISTOGRAM_BINS),
    })
}
