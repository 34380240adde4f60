//! Smile fitting error types.

use crate::models::SabrError;
use crate::smile::SmileError;
use thiserror::Error;
use volcube_core::types::SolverError;

/// Errors from fitting SABR parameters to a single smile.
///
/// # Examples
///
/// ```
/// use volcube_models::calibration::FitError;
///
/// let err = FitError::InsufficientStrikes { got: 2, need: 3 };
/// assert_eq!(format!("{}", err), "Insufficient strikes for SABR fit: got 2, need 3");
/// ```
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FitError {
    /// Fewer usable strikes than free parameters.
    #[error("Insufficient strikes for SABR fit: got {got}, need {need}")]
    InsufficientStrikes {
        /// Usable strikes
        got: usize,
        /// Free parameters
        need: usize,
    },

    /// Market inputs unusable (non-positive forward, expiry or volatility,
    /// strikes not increasing, length mismatch).
    #[error("Invalid smile input: {0}")]
    InvalidInput(String),

    /// Residual error above the configured tolerance.
    #[error("SABR fit rms error {rms_error:.3e} (max {max_error:.3e}) exceeds tolerance {tolerance:.3e}")]
    NotConverged {
        /// Root-mean-square volatility error
        rms_error: f64,
        /// Largest absolute volatility error
        max_error: f64,
        /// Configured tolerance
        tolerance: f64,
    },

    /// Fitted parameters fail SABR validation.
    #[error("Fitted parameters are invalid: {0}")]
    InvalidParameters(#[from] SabrError),

    /// Least-squares solver failure.
    #[error("Least-squares solver failed: {0}")]
    Solver(#[from] SolverError),

    /// Smile construction failure.
    #[error("Smile error: {0}")]
    Smile(#[from] SmileError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_converged_names_residual() {
        let err = FitError::NotConverged {
            rms_error: 0.0123,
            max_error: 0.05,
            tolerance: 0.002,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("1.230e-2"));
        assert!(msg.contains("2.000e-3"));
    }

    #[test]
    fn test_from_solver_error() {
        let err: FitError = SolverError::MaxIterationsExceeded { iterations: 5 }.into();
        assert!(matches!(err, FitError::Solver(_)));
    }
}
