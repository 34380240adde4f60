//! Volatility cube errors.

use thiserror::Error;
use volcube_core::market_data::MarketDataError;
use volcube_core::types::{InterpolationError, Period, SolverError};
use volcube_models::calibration::FitError;
use volcube_models::models::SabrError;
use volcube_models::smile::SmileError;

/// Errors from building, calibrating or querying a volatility cube.
///
/// # Examples
///
/// ```
/// use volcube_optimiser::cube::CubeError;
///
/// let err = CubeError::StaleInterpolators;
/// assert!(format!("{}", err).contains("ensure_fresh"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CubeError {
    /// Grid axes or layer count violate the cube invariants.
    #[error("Invalid cube grid: {0}")]
    InvalidGrid(String),

    /// Vol-spread quote layout is inconsistent.
    #[error("Invalid cube quotes: {0}")]
    InvalidQuotes(String),

    /// Calibration configuration is inconsistent.
    #[error("Invalid cube configuration: {0}")]
    InvalidConfig(String),

    /// Layer, row or column index outside the cube.
    #[error("Index out of range: {what} {index} (size {len})")]
    IndexOutOfRange {
        /// Axis name
        what: &'static str,
        /// Requested index
        index: usize,
        /// Axis size
        len: usize,
    },

    /// Replacement matrix or value vector has the wrong shape.
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected shape
        expected: String,
        /// Supplied shape
        got: String,
    },

    /// Interpolators queried before `ensure_fresh` rebuilt them.
    #[error("Cube interpolators are stale: call ensure_fresh first")]
    StaleInterpolators,

    /// Interpolation failure, including out-of-grid queries.
    #[error("Cube interpolation failed: {0}")]
    Interpolation(#[from] InterpolationError),

    /// Market data lookup failure.
    #[error("Market data error: {0}")]
    MarketData(#[from] MarketDataError),

    /// Smile construction failure.
    #[error("Smile error: {0}")]
    Smile(#[from] SmileError),

    /// SABR fit failed at a quoted node.
    #[error("SABR fit failed at option {option_tenor}, swap {swap_tenor}: {source}")]
    CellFit {
        /// Option tenor of the node
        option_tenor: Period,
        /// Swap tenor of the node
        swap_tenor: Period,
        /// Underlying fit error
        source: FitError,
    },

    /// Interpolated SABR parameters are invalid.
    #[error("Invalid SABR parameters at option time {option_time}, swap length {swap_length}: {source}")]
    InvalidParameters {
        /// Option time
        option_time: f64,
        /// Swap length
        swap_length: f64,
        /// Validation failure
        source: SabrError,
    },

    /// ATM recalibration root search failed at a dense node.
    #[error("ATM recalibration failed at option time {option_time}, swap length {swap_length}: {source}")]
    AtmRecalibration {
        /// Option time
        option_time: f64,
        /// Swap length
        swap_length: f64,
        /// Solver failure
        source: SolverError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_fit_names_node() {
        let err = CubeError::CellFit {
            option_tenor: "1Y".parse().unwrap(),
            swap_tenor: "10Y".parse().unwrap(),
            source: FitError::InsufficientStrikes { got: 2, need: 3 },
        };
        let msg = format!("{}", err);
        assert!(msg.contains("option 1Y"));
        assert!(msg.contains("swap 10Y"));
        assert!(msg.contains("got 2"));
    }

    #[test]
    fn test_from_interpolation_error() {
        let err: CubeError = InterpolationError::OutOfBounds {
            x: 5.0,
            min: 0.0,
            max: 1.0,
        }
        .into();
        assert!(matches!(err, CubeError::Interpolation(_)));
    }
}
