//! Error types for analytical pricing operations.

use thiserror::Error;

/// Errors from the Black formula and its sensitivities.
///
/// # Examples
///
/// ```
/// use volcube_models::analytical::AnalyticalError;
///
/// let err = AnalyticalError::InvalidStdDev { std_dev: -0.1 };
/// assert_eq!(format!("{}", err), "Invalid standard deviation: -0.1");
/// ```
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnalyticalError {
    /// Forward must be positive.
    #[error("Invalid forward: F = {forward}")]
    InvalidForward {
        /// The offending forward
        forward: f64,
    },

    /// Strike must be non-negative.
    #[error("Invalid strike: K = {strike}")]
    InvalidStrike {
        /// The offending strike
        strike: f64,
    },

    /// Standard deviation must be non-negative.
    #[error("Invalid standard deviation: {std_dev}")]
    InvalidStdDev {
        /// The offending standard deviation
        std_dev: f64,
    },

    /// Discount factor must be positive.
    #[error("Invalid discount factor: {discount}")]
    InvalidDiscount {
        /// The offending discount factor
        discount: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            format!("{}", AnalyticalError::InvalidForward { forward: 0.0 }),
            "Invalid forward: F = 0"
        );
        assert_eq!(
            format!("{}", AnalyticalError::InvalidDiscount { discount: -1.0 }),
            "Invalid discount factor: -1"
        );
    }
}
