//! FluentCheck strategy configuration.
//!
//! This crate provides:
//! - Typed strategy options (sample size, confidence targets, bias,
//!   shrinking budgets) with a chainable builder surface
//! - Semantic validation with stable error codes
//! - Named presets for common exploration profiles
//! - JSON round-trip for embedding configs in reports

pub mod preset;
pub mod strategy;
pub mod validate;

pub use preset::Preset;
pub use strategy::{ShrinkStrategyKind, StrategyConfig};
pub use validate::{validate_strategy, ValidationError, ValidationResult};

/// Schema version for serialized strategy configs.
pub const STRATEGY_SCHEMA_VERSION: &str = "1.0.0";
