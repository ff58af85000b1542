//! Parameters

use thiserror::Error;

/// Errors raised while validating mining parameters.
#[derive(Debug, Error, PartialEq)]
pub enum ParameterError {
    /// A parameter was outside its allowed range (name, value).
    #[error("invalid parameter {name}: {value} is outside (0, 1]")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,

        /// Rejected value
        value: f64,
    },

    /// The maximum itemset length was zero.
    #[error("invalid parameter max_len: must be at least 1")]
    InvalidMaxLen,
}

/// A fraction in `(0, 1]`, used for minimum support and minimum confidence.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub struct Threshold(f64);

impl Threshold {
    /// Validates `value` as a threshold named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::InvalidParameter`] if `value` is NaN or outside `(0, 1]`.
    pub fn new(name: &'static str, value: f64) -> Result<Self, ParameterError> {
        if value > 0.0 && value <= 1.0 {
            Ok(Self(value))
        } else {
            Err(ParameterError::InvalidParameter { name, value })
        }
    }

    /// Returns the raw fraction.
    pub fn value(self) -> f64 {
        self.0
    }

    /// Whether `fraction` meets this threshold.
    pub fn admits(self, fraction: f64) -> bool {
        fraction >= self.0
    }
}

/// Validates an optional maximum itemset length.
///
/// # Errors
///
/// Returns [`ParameterError::InvalidMaxLen`] for `Some(0)`.
pub fn validate_max_len(max_len: Option<usize>) -> Result<Option<usize>, ParameterError> {
    match max_len {
        Some(0) => Err(ParameterError::InvalidMaxLen),
        other => Ok(other),
    }
}
