// src/error.rs
use thiserror::Error;

/// Errors raised by the sde-mlmc library
#[derive(Debug, Error)]
pub enum SdeError {
    /// A parameter value violates its constraint
    #[error("Invalid parameter '{parameter}' = {value}: {constraint}")]
    InvalidParameters {
        parameter: String,
        value: f64,
        constraint: String,
    },

    /// Invalid configuration (counts, modes, missing values)
    #[error("Invalid configuration for '{field}': {reason}")]
    InvalidConfiguration { field: String, reason: String },

    /// A parameter-table row with the wrong number of fields
    #[error("Malformed parameter row {line}: expected {expected} fields, found {found}")]
    MalformedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A value that should have been numeric
    #[error("Cannot parse '{value}' as a number for '{field}'")]
    ParseError { field: String, value: String },

    /// Variance requested from fewer than two observations
    #[error("Variance needs at least 2 observations, accumulator holds {count}")]
    InsufficientObservations { count: u64 },

    /// Parameter file could not be read
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Parameter table or CSV report could not be read or written
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON report could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Text report could not be formatted
    #[error("Report formatting failed")]
    Format(#[from] std::fmt::Error),
}

impl SdeError {
    /// True for every error that aborts a single configuration before simulation
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            SdeError::InvalidParameters { .. }
                | SdeError::InvalidConfiguration { .. }
                | SdeError::MalformedRow { .. }
                | SdeError::ParseError { .. }
                | SdeError::Csv(_)
        )
    }
}

/// Result type alias for sde-mlmc operations
pub type SdeResult<T> = Result<T, SdeError>;

/// Validation utilities
pub mod validation {
    use super::{SdeError, SdeResult};

    /// Validate that a parameter is positive
    pub fn validate_positive(name: &str, value: f64) -> SdeResult<()> {
        if value <= 0.0 || value.is_nan() {
            Err(SdeError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be positive (> 0)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate that a parameter is non-negative
    pub fn validate_non_negative(name: &str, value: f64) -> SdeResult<()> {
        if value < 0.0 || value.is_nan() {
            Err(SdeError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be non-negative (≥ 0)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate that a parameter is within a range
    pub fn validate_range(name: &str, value: f64, min: f64, max: f64) -> SdeResult<()> {
        if !(min..=max).contains(&value) {
            Err(SdeError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: format!("must be in range [{}, {}]", min, max),
            })
        } else {
            Ok(())
        }
    }

    /// Validate correlation parameter
    pub fn validate_correlation(name: &str, rho: f64) -> SdeResult<()> {
        validate_range(name, rho, -1.0, 1.0)
    }

    /// Validate that a value is finite and not NaN
    pub fn validate_finite(name: &str, value: f64) -> SdeResult<()> {
        if !value.is_finite() {
            Err(SdeError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be finite (not NaN or infinite)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate sample count
    pub fn validate_samples(samples: usize) -> SdeResult<()> {
        if samples == 0 {
            Err(SdeError::InvalidConfiguration {
                field: "sims".to_string(),
                reason: "must be greater than 0".to_string(),
            })
        } else if samples > 1_000_000_000 {
            Err(SdeError::InvalidConfiguration {
                field: "sims".to_string(),
                reason: "exceeds maximum allowed (1 billion)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate steps count
    pub fn validate_steps(steps: usize) -> SdeResult<()> {
        if steps == 0 {
            Err(SdeError::InvalidConfiguration {
                field: "steps".to_string(),
                reason: "must be greater than 0".to_string(),
            })
        } else if steps > 1_000_000 {
            Err(SdeError::InvalidConfiguration {
                field: "steps".to_string(),
                reason: "exceeds maximum allowed (1,000,000)".to_string(),
            })
        } else {
            Ok(())
        }
    }
}
