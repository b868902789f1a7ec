//! Error type shared by the storm analysis pipeline
//!
//! Only construction and shape validation can fail. Once a [`FieldSequence`](crate::FieldSequence)
//! or a configured detector exists, every analysis step is a total function over its inputs.

use thiserror::Error;

/// Errors raised when inputs cannot be analyzed as given.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StormError {
    /// A flat buffer does not hold exactly `width * height` values per frame.
    #[error("data length {len} does not match a {width}x{height} grid (expected {expected})")]
    DataLength {
        len: usize,
        width: usize,
        height: usize,
        expected: usize,
    },

    /// A frame (or mask) does not share the shape of the first one.
    #[error(
        "frame {index} has shape {}x{}, expected {}x{}",
        .found.0, .found.1, .expected.0, .expected.1
    )]
    ShapeMismatch {
        index: usize,
        /// Expected `(width, height)`
        expected: (usize, usize),
        /// Actual `(width, height)`
        found: (usize, usize),
    },

    /// A configuration value is out of its valid range.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter { name: &'static str, message: String },
}

impl StormError {
    /// Create error for a configuration value with a custom message.
    ///
    /// # Arguments
    /// * `name` - The name of the invalid parameter (e.g., `"area_threshold"`)
    /// * `message` - A description of the validation error
    pub fn invalid_parameter(name: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            message: message.into(),
        }
    }

    /// Create error for a non-finite threshold.
    pub fn non_finite(name: &'static str, value: f64) -> Self {
        Self::invalid_parameter(name, format!("must be finite, got {value}"))
    }

    /// Create error for a ratio outside `[0, 1]`.
    pub fn ratio_out_of_range(name: &'static str, value: f64) -> Self {
        Self::invalid_parameter(name, format!("must lie in [0, 1], got {value}"))
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StormError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_message() {
        let err = StormError::ShapeMismatch {
            index: 3,
            expected: (64, 48),
            found: (32, 48),
        };
        assert_eq!(err.to_string(), "frame 3 has shape 32x48, expected 64x48");
    }

    #[test]
    fn test_invalid_parameter_message() {
        let err = StormError::ratio_out_of_range("overlap_threshold", 1.5);
        assert_eq!(
            err.to_string(),
            "invalid parameter 'overlap_threshold': must lie in [0, 1], got 1.5"
        );
    }
}
