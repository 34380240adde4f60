//! Smile section errors.

use crate::analytical::AnalyticalError;
use crate::models::SabrError;
use thiserror::Error;
use volcube_core::types::InterpolationError;

/// Errors raised while building or querying a smile section.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SmileError {
    /// Exercise time must be positive.
    #[error("Invalid exercise time: {time}")]
    InvalidExerciseTime {
        /// Offending time
        time: f64,
    },

    /// Strikes and standard deviations differ in length, or are empty.
    #[error("Smile needs matching non-empty strikes and std devs: got {strikes} strikes and {std_devs} std devs")]
    DimensionMismatch {
        /// Number of strikes
        strikes: usize,
        /// Number of standard deviations
        std_devs: usize,
    },

    /// A standard deviation, quoted or extrapolated, is negative or NaN.
    #[error("Negative standard deviation {std_dev} at strike {strike}")]
    NegativeStdDev {
        /// Strike
        strike: f64,
        /// Standard deviation
        std_dev: f64,
    },

    /// Strike grid error.
    #[error("Strike interpolation failed: {0}")]
    Interpolation(#[from] InterpolationError),

    /// SABR parameter or evaluation error.
    #[error("SABR smile error: {0}")]
    Sabr(#[from] SabrError),

    /// Black formula error.
    #[error("Black pricing error: {0}")]
    Pricing(#[from] AnalyticalError),
}
