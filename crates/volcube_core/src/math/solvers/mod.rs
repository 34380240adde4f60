//! Root-finding and least-squares solvers.
//!
//! ## Available Solvers
//!
//! - [`BrentSolver`]: bracketing root-finder, with a bracket search from an
//!   initial guess; used for ATM recalibration of a single SABR parameter
//! - [`LevenbergMarquardtSolver`]: nonlinear least squares; used for the
//!   per-node SABR smile fits
//!
//! Root-finding uses [`SolverConfig`]; the least-squares solver uses
//! [`LMConfig`] with additional damping controls.
//!
//! ## Example
//!
//! ```
//! use volcube_core::math::solvers::{LevenbergMarquardtSolver, LMConfig};
//!
//! let residuals = |params: &[f64]| -> Vec<f64> { vec![params[0] - 2.0, params[1] - 3.0] };
//!
//! let solver = LevenbergMarquardtSolver::with_defaults();
//! let result = solver.solve(residuals, vec![0.0, 0.0]).unwrap();
//! assert!(result.converged);
//! assert!((result.params[0] - 2.0).abs() < 1e-6);
//! ```

mod brent;
mod config;
mod levenberg_marquardt;

pub use brent::BrentSolver;
pub use config::SolverConfig;
pub use levenberg_marquardt::{LMConfig, LMResult, LevenbergMarquardtSolver};
