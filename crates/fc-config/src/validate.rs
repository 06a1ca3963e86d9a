//! Semantic validation for strategy configs.

use thiserror::Error;

use crate::strategy::StrategyConfig;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Strategy validation errors.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },

    #[error("inconsistent options: {0}")]
    Inconsistent(String),
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::Inconsistent(_) => 66,
        }
    }
}

fn require_probability(field: &'static str, x: f64) -> ValidationResult<()> {
    if !(x > 0.0 && x < 1.0) || x.is_nan() {
        return Err(ValidationError::InvalidValue {
            field,
            message: format!("must be strictly between 0 and 1, got {x}"),
        });
    }
    Ok(())
}

/// Validate a strategy config semantically.
///
/// Rules:
/// - probabilities (`confidence`, `passRateThreshold`, `minConfidence`,
///   `credibleIntervalWidth`) lie strictly in (0, 1)
/// - counters (`sampleSize`, `maxIterations`, `confidenceCheckInterval`)
///   are positive
/// - `sampleSize` cannot exceed `maxIterations`
/// - shrinking budgets are positive when shrinking is enabled
pub fn validate_strategy(config: &StrategyConfig) -> ValidationResult<()> {
    if config.sample_size == 0 {
        return Err(ValidationError::InvalidValue {
            field: "sampleSize",
            message: "must be at least 1".into(),
        });
    }
    if config.max_iterations == 0 {
        return Err(ValidationError::InvalidValue {
            field: "maxIterations",
            message: "must be at least 1".into(),
        });
    }
    if config.confidence_check_interval == 0 {
        return Err(ValidationError::InvalidValue {
            field: "confidenceCheckInterval",
            message: "must be at least 1".into(),
        });
    }
    if config.sample_size > config.max_iterations {
        return Err(ValidationError::Inconsistent(format!(
            "sampleSize {} exceeds maxIterations {}",
            config.sample_size, config.max_iterations
        )));
    }

    if let Some(level) = config.confidence {
        require_probability("confidence", level)?;
    }
    require_probability("passRateThreshold", config.pass_rate_threshold)?;
    if let Some(level) = config.min_confidence {
        require_probability("minConfidence", level)?;
    }
    require_probability("credibleIntervalWidth", config.credible_interval_width)?;

    if config.shrinking_enabled {
        if config.shrink_attempts == 0 {
            return Err(ValidationError::InvalidValue {
                field: "shrinkAttempts",
                message: "must be at least 1 when shrinking is enabled".into(),
            });
        }
        if config.shrink_rounds == 0 {
            return Err(ValidationError::InvalidValue {
                field: "shrinkRounds",
                message: "must be at least 1 when shrinking is enabled".into(),
            });
        }
    }

    if let Some(max_ms) = config.max_time_ms {
        if max_ms == 0 {
            return Err(ValidationError::InvalidValue {
                field: "maxTimeMs",
                message: "must be positive when set".into(),
            });
        }
    }

    Ok(())
}
