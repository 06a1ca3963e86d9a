//! Error types for FluentCheck.
//!
//! Structured error handling with stable numeric codes for machine
//! parsing, category classification, and recoverability hints. The core
//! never throws into user code on its own: most of these kinds surface
//! through result fields (discard counters, outcome tags) and only
//! construction-time failures are returned to the caller directly.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for FluentCheck operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Arbitrary/scenario construction errors.
    Construction,
    /// Value generation errors (exhaustion, empty spaces).
    Generation,
    /// Exploration/stopping errors.
    Exploration,
    /// Shrinking errors.
    Shrinking,
    /// Serialization and I/O errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Construction => write!(f, "construction"),
            ErrorCategory::Generation => write!(f, "generation"),
            ErrorCategory::Exploration => write!(f, "exploration"),
            ErrorCategory::Shrinking => write!(f, "shrinking"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for FluentCheck.
#[derive(Error, Debug)]
pub enum Error {
    // Construction errors (10-19)
    #[error("schema validation failed: {0}")]
    SchemaValidation(String),

    #[error("duplicate binding name: {name}")]
    DuplicateName { name: String },

    #[error("unknown binding name: {name}")]
    UnknownName { name: String },

    #[error("scenario has no property: missing then()")]
    MissingProperty,

    #[error("invalid pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    // Generation errors (20-29)
    #[error("empty search space: {0}")]
    EmptySpace(String),

    #[error("filter exhausted after {attempts} attempts")]
    FilterExhausted { attempts: u64 },

    // Exploration errors (30-39)
    #[error("precondition failed")]
    PreconditionFailed,

    #[error("predicate threw: {0}")]
    PredicateThrew(String),

    #[error("budget exhausted after {tests_run} tests")]
    BudgetExhausted { tests_run: u64 },

    #[error("coverage floor for label {label:?} is infeasible")]
    CoverageInfeasible { label: String },

    // Shrinking errors (40-49)
    #[error("cannot rebuild partial scenario for quantifier {name:?}")]
    PartialRebuild { name: String },

    // I/O and serialization errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable error code, grouped by category:
    /// - 10-19: construction
    /// - 20-29: generation
    /// - 30-39: exploration
    /// - 40-49: shrinking
    /// - 60-69: I/O
    pub fn code(&self) -> u32 {
        match self {
            Error::SchemaValidation(_) => 10,
            Error::DuplicateName { .. } => 11,
            Error::UnknownName { .. } => 12,
            Error::MissingProperty => 13,
            Error::InvalidPattern { .. } => 14,
            Error::EmptySpace(_) => 20,
            Error::FilterExhausted { .. } => 21,
            Error::PreconditionFailed => 30,
            Error::PredicateThrew(_) => 31,
            Error::BudgetExhausted { .. } => 32,
            Error::CoverageInfeasible { .. } => 33,
            Error::PartialRebuild { .. } => 40,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::SchemaValidation(_)
            | Error::DuplicateName { .. }
            | Error::UnknownName { .. }
            | Error::MissingProperty
            | Error::InvalidPattern { .. } => ErrorCategory::Construction,

            Error::EmptySpace(_) | Error::FilterExhausted { .. } => ErrorCategory::Generation,

            Error::PreconditionFailed
            | Error::PredicateThrew(_)
            | Error::BudgetExhausted { .. }
            | Error::CoverageInfeasible { .. } => ErrorCategory::Exploration,

            Error::PartialRebuild { .. } => ErrorCategory::Shrinking,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Whether a retry with different inputs or a larger budget can help.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Construction errors need the scenario fixed, not retried.
            Error::SchemaValidation(_)
            | Error::DuplicateName { .. }
            | Error::UnknownName { .. }
            | Error::MissingProperty
            | Error::InvalidPattern { .. } => false,

            // An empty space is structural; exhaustion may pass with a
            // different seed or looser filter.
            Error::EmptySpace(_) => false,
            Error::FilterExhausted { .. } => true,

            Error::PreconditionFailed => true,
            Error::PredicateThrew(_) => false,
            Error::BudgetExhausted { .. } => true,
            Error::CoverageInfeasible { .. } => false,

            Error::PartialRebuild { .. } => true,

            Error::Io(_) => true,
            Error::Json(_) => true,
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Additional structured context (e.g. label, quantifier name).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::DuplicateName { name } | Error::UnknownName { name } => {
                context.insert("name".to_string(), serde_json::json!(name));
            }
            Error::CoverageInfeasible { label } => {
                context.insert("label".to_string(), serde_json::json!(label));
            }
            Error::FilterExhausted { attempts } => {
                context.insert("attempts".to_string(), serde_json::json!(attempts));
            }
            Error::BudgetExhausted { tests_run } => {
                context.insert("testsRun".to_string(), serde_json::json!(tests_run));
            }
            Error::PartialRebuild { name } => {
                context.insert("quantifier".to_string(), serde_json::json!(name));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context,
        }
    }
}

impl StructuredError {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_grouped_by_category() {
        assert_eq!(Error::SchemaValidation("x".into()).code(), 10);
        assert_eq!(Error::EmptySpace("x".into()).code(), 20);
        assert_eq!(Error::PreconditionFailed.code(), 30);
        assert_eq!(
            Error::PartialRebuild { name: "a".into() }.code(),
            40
        );
    }

    #[test]
    fn categories() {
        assert_eq!(
            Error::MissingProperty.category(),
            ErrorCategory::Construction
        );
        assert_eq!(
            Error::FilterExhausted { attempts: 5 }.category(),
            ErrorCategory::Generation
        );
        assert_eq!(
            Error::CoverageInfeasible { label: "big".into() }.category(),
            ErrorCategory::Exploration
        );
    }

    #[test]
    fn recoverability() {
        assert!(!Error::DuplicateName { name: "a".into() }.is_recoverable());
        assert!(Error::FilterExhausted { attempts: 100 }.is_recoverable());
        assert!(Error::BudgetExhausted { tests_run: 10 }.is_recoverable());
        assert!(!Error::CoverageInfeasible { label: "big".into() }.is_recoverable());
    }

    #[test]
    fn structured_error_carries_context() {
        let err = Error::CoverageInfeasible {
            label: "big".into(),
        };
        let s = StructuredError::from(&err);
        assert_eq!(s.code, 33);
        assert_eq!(s.context.get("label"), Some(&serde_json::json!("big")));
        assert!(s.to_json().contains(r#""category":"exploration""#));
    }
}
