//! Errors of the numeric foundation: calendar arithmetic, one- and
//! two-dimensional interpolation, and the root and least-squares solvers.
//! Higher layers wrap these through `#[from]` conversions.

use thiserror::Error;

/// Failures building, parsing or shifting dates and tenors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    /// Components that name no calendar day.
    #[error("no such date {year}-{month}-{day}")]
    InvalidDate {
        /// Calendar year.
        year: i32,
        /// Month, 1 to 12.
        month: u32,
        /// Day of month.
        day: u32,
    },

    /// Unreadable date (`YYYY-MM-DD`), period (`6M`, `10Y`) or day count label.
    #[error("cannot parse {0}")]
    ParseError(String),

    /// A tenor shift left chrono's range.
    #[error("date out of range: {0}")]
    Overflow(String),
}

/// Failures of the interpolators behind smiles, ATM matrices and cube layers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpolationError {
    /// Query outside the nodes with extrapolation disabled.
    #[error("{x} lies outside [{min}, {max}]")]
    OutOfBounds {
        /// Query point.
        x: f64,
        /// First node.
        min: f64,
        /// Last node.
        max: f64,
    },

    /// Too few nodes for the scheme.
    #[error("{got} nodes given, {need} required")]
    InsufficientData {
        /// Nodes supplied.
        got: usize,
        /// Minimum for the scheme.
        need: usize,
    },

    /// Node `index` does not exceed its predecessor.
    #[error("nodes not increasing at index {index}")]
    NonMonotonicData {
        /// First offending node.
        index: usize,
    },

    /// Mismatched lengths or non-finite values.
    #[error("bad interpolation input: {0}")]
    InvalidInput(String),
}

/// Failures of Brent root search and Levenberg-Marquardt fitting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Brent ran out of iterations inside a valid bracket.
    #[error("no root within {iterations} iterations")]
    MaxIterationsExceeded {
        /// Iteration limit that was hit.
        iterations: usize,
    },

    /// `f(a)` and `f(b)` share a sign, so `[a, b]` brackets nothing.
    #[error("[{a}, {b}] does not bracket a root")]
    NoBracket {
        /// Lower end of the last interval tried.
        a: f64,
        /// Upper end.
        b: f64,
    },

    /// Empty problem or non-finite objective.
    #[error("numerical failure: {0}")]
    NumericalInstability(String),
}
