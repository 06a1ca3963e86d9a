//! FluentCheck shared types, errors, and report schemas.
//!
//! This crate provides:
//! - The tagged [`Value`] union that quantifier bindings flow through
//! - [`Pick`] (a generated value plus its pre-map original)
//! - [`ArbitrarySize`] with exact/estimated tags and credible intervals
//! - The unified [`Error`] type with stable codes and categories
//! - The result schema ([`FluentResult`], [`FluentStatistics`], ...)

pub mod error;
pub mod pick;
pub mod report;
pub mod size;
pub mod value;

pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use pick::Pick;
pub use report::{
    ArbitraryStats, CoverageResult, DistributionSummary, FluentResult, FluentStatistics,
    HistogramBin, ShrinkingStats,
};
pub use size::ArbitrarySize;
pub use value::Value;
