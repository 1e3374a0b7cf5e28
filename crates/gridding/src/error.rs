//! Error types for gridding operations.

use thiserror::Error;

/// Errors that can occur while gridding, degridding or computing a rolloff.
///
/// Every variant is reported before the output buffer is touched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GriddingError {
    /// Sample counts of two buffers disagree.
    #[error("{what} has {actual} samples, expected {expected}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Coordinate dimensionality does not match the grid rank.
    #[error("coordinate dimensionality {actual} does not match grid rank {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The engine supports ranks 1 through `MAX_RANK`.
    #[error("unsupported rank {0}")]
    UnsupportedRank(usize),

    /// A grid extent is zero or negative.
    #[error("invalid extent {value} on axis {axis}")]
    InvalidDimension { axis: usize, value: i64 },

    /// Grid spacing must be finite and positive.
    #[error("invalid grid spacing {value} on axis {axis}")]
    InvalidSpacing { axis: usize, value: f32 },

    /// Density weights must be finite and non-negative.
    #[error("invalid density weight {value} at sample {index}")]
    InvalidWeight { index: usize, value: f32 },

    /// The isofov selector only accepts 0 or 1.
    #[error("unsupported isofov mode {0}")]
    UnsupportedFovMode(i64),

    /// Degenerate kernel or configuration parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GriddingError {
    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            what,
            expected,
            actual,
        }
    }

    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Result type for gridding operations.
pub type Result<T> = std::result::Result<T, GriddingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GriddingError::shape_mismatch("weights", 10, 9);
        assert_eq!(err.to_string(), "weights has 9 samples, expected 10");

        let err = GriddingError::dimension_mismatch(2, 3);
        assert!(err.to_string().contains("rank 2"));

        let err = GriddingError::UnsupportedFovMode(7);
        assert_eq!(err.to_string(), "unsupported isofov mode 7");
    }
}
