//! Market-model error types.

use thiserror::Error;

/// Errors from market-model inputs and the coterminal calibration.
///
/// Every variant is a contract violation by the caller or a logic error.
/// Jointly infeasible targets are not an error; see
/// [`CoterminalCalibration::Infeasible`](super::CoterminalCalibration::Infeasible).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoterminalError {
    /// A collection has the wrong number of entries.
    #[error("{what}: expected {expected} entries, got {got}")]
    SizeMismatch {
        /// Offending collection.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },

    /// Time grids disagree.
    #[error("Time mismatch: {0}")]
    TimeMismatch(String),

    /// Invalid time grid or input value.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Both roots of the multiplier quadratic are negative.
    #[error("Negative multiplier root at step {step}: a non-negative discriminant must yield a non-negative root")]
    NegativeRoot {
        /// Evolution step of the recursion.
        step: usize,
    },

    /// A pseudo-root matrix has the wrong shape.
    #[error("Pseudo-root at step {step} is {got_rows}x{got_cols}, expected {rows}x{cols}")]
    DimensionMismatch {
        /// Evolution step.
        step: usize,
        /// Expected rows (rates).
        rows: usize,
        /// Expected columns (factors).
        cols: usize,
        /// Actual rows.
        got_rows: usize,
        /// Actual columns.
        got_cols: usize,
    },
}
