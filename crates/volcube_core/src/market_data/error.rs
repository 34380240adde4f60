//! Market data error types.
//!
//! Structured errors for quote access, yield curve lookups, ATM volatility
//! structures and swap-rate calculation.

use crate::types::{DateError, InterpolationError};
use thiserror::Error;

/// Market data operation errors.
///
/// # Examples
///
/// ```
/// use volcube_core::market_data::MarketDataError;
///
/// let err = MarketDataError::InvalidMaturity { t: -1.0 };
/// assert!(format!("{}", err).contains("-1"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    /// Invalid maturity (negative time).
    #[error("Invalid maturity: t = {t}")]
    InvalidMaturity {
        /// The invalid maturity value
        t: f64,
    },

    /// A volatility that must be positive is not.
    #[error("Invalid volatility {vol} at option time {option_time}, swap length {swap_length}")]
    InvalidVolatility {
        /// The offending volatility
        vol: f64,
        /// Option time of the lookup
        option_time: f64,
        /// Swap length of the lookup
        swap_length: f64,
    },

    /// A quote has no valid value.
    #[error("Quote '{0}' has no valid value")]
    InvalidQuote(String),

    /// Interpolation error.
    #[error("Interpolation error: {0}")]
    Interpolation(#[from] InterpolationError),

    /// Date arithmetic error.
    #[error("Date error: {0}")]
    Date(#[from] DateError),

    /// Insufficient data for construction.
    #[error("Insufficient data: got {got}, need {need}")]
    InsufficientData {
        /// Number of points provided
        got: usize,
        /// Minimum number of points required
        need: usize,
    },

    /// Any other malformed input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_maturity_display() {
        let err = MarketDataError::InvalidMaturity { t: -1.5 };
        assert_eq!(format!("{}", err), "Invalid maturity: t = -1.5");
    }

    #[test]
    fn test_invalid_volatility_display() {
        let err = MarketDataError::InvalidVolatility {
            vol: -0.01,
            option_time: 1.0,
            swap_length: 5.0,
        };
        assert!(format!("{}", err).contains("swap length 5"));
    }

    #[test]
    fn test_from_interpolation_error() {
        let err: MarketDataError = InterpolationError::OutOfBounds {
            x: 5.0,
            min: 0.0,
            max: 3.0,
        }
        .into();
        assert!(matches!(err, MarketDataError::Interpolation(_)));
    }

    #[test]
    fn test_from_date_error() {
        let err: MarketDataError = DateError::ParseError("x".to_string()).into();
        assert!(matches!(err, MarketDataError::Date(_)));
    }
}
