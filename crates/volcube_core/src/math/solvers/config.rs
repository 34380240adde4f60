//! Stopping rules for [`BrentSolver`](super::BrentSolver).

use num_traits::Float;

/// Tolerance and iteration cap of a Brent search.
///
/// The cube's ATM recalibration solves for the SABR alpha that reprices
/// the ATM vol and runs with [`SolverConfig::high_precision`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverConfig<T: Float> {
    /// Stop once `|f(x)|` or half the bracket width falls below this.
    pub tolerance: T,

    /// Iterations before `SolverError::MaxIterationsExceeded`.
    pub max_iterations: usize,
}

impl<T: Float> Default for SolverConfig<T> {
    fn default() -> Self {
        Self::with(1e-10, 100)
    }
}

impl<T: Float> SolverConfig<T> {
    /// # Panics
    ///
    /// If `tolerance` is not positive or `max_iterations` is zero.
    pub fn new(tolerance: T, max_iterations: usize) -> Self {
        assert!(tolerance > T::zero(), "tolerance must be positive");
        assert!(max_iterations > 0, "max_iterations must be > 0");
        Self {
            tolerance,
            max_iterations,
        }
    }

    /// `1e-14` within 500 iterations.
    pub fn high_precision() -> Self {
        Self::with(1e-14, 500)
    }

    fn with(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance: T::from(tolerance).unwrap_or_else(T::epsilon),
            max_iterations,
        }
    }
}
