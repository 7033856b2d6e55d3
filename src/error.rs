//! Error types shared by the analysis layers

use crate::constants::MAX_REDSHIFT;
use thiserror::Error;

/// Rejected input to one of the numerical operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Redshift must be finite and non-negative, got {0}")]
    InvalidRedshift(f64),

    #[error("Redshift z = {z} is above the supported maximum {max}")]
    RedshiftTooHigh { z: f64, max: f64 },

    #[error("Redshift z = {0} gives (1+z) <= 0, correction is undefined")]
    DegenerateRedshift(f64),

    #[error("Uncertainty for '{label}' must be finite and > 0, got {sigma}")]
    InvalidSigma { label: String, sigma: f64 },

    #[error("{name} = {value} is outside the valid range {range}")]
    ParameterOutOfRange {
        name: &'static str,
        value: f64,
        range: &'static str,
    },

    #[error("Flat universe required: Omega_m + Omega_lambda = {total:.4} != 1.0")]
    NotFlat { total: f64 },

    #[error("Resolution {bits} bits out of valid range [{min}, {max}]")]
    ResolutionOutOfRange { bits: u32, min: u32, max: u32 },

    #[error("Invalid resolution schedule: {0}")]
    InvalidSchedule(String),

    #[error("Need at least {required} values for {what}, got {actual}")]
    InsufficientData {
        what: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("Length mismatch: {left} redshifts vs {right} corrections")]
    LengthMismatch { left: usize, right: usize },

    #[error("Unknown survey: {name}. Valid options: {valid}")]
    UnknownSurvey { name: String, valid: String },

    #[error("Unknown resolution schedule: {name}. Valid options: {valid}")]
    UnknownSchedule { name: String, valid: String },

    #[error("Survey '{survey}' is inconsistent: {reason}")]
    InvalidSurvey { survey: String, reason: String },
}

/// Failure of a complete analysis run (validation plus I/O and parsing)
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to process JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Statistics error: {0}")]
    Statistics(String),

    #[error("Unsupported report: expected {expected}, found {found}")]
    UnsupportedReport { expected: String, found: String },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Reject non-finite or non-positive uncertainties
pub fn ensure_sigma(label: &str, sigma: f64) -> std::result::Result<(), ValidationError> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(ValidationError::InvalidSigma {
            label: label.to_string(),
            sigma,
        });
    }
    Ok(())
}

/// Reject negative, non-finite and implausibly high redshifts
pub fn ensure_redshift(z: f64) -> std::result::Result<(), ValidationError> {
    if !z.is_finite() || z < 0.0 {
        return Err(ValidationError::InvalidRedshift(z));
    }
    if z > MAX_REDSHIFT {
        return Err(ValidationError::RedshiftTooHigh {
            z,
            max: MAX_REDSHIFT,
        });
    }
    Ok(())
}
