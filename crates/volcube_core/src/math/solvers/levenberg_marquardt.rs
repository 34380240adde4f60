//! Levenberg-Marquardt nonlinear least-squares solver.
//!
//! Each iteration solves the damped normal equations
//!
//! ```text
//! (J^T J + λI) δ = -J^T r
//! p_{n+1} = p_n + δ
//! ```
//!
//! with a forward-difference Jacobian `J` and a Cholesky factorisation from
//! `nalgebra`. Successful steps shrink `λ` (towards Gauss-Newton), rejected
//! steps grow it (towards gradient descent).
//!
//! # Example
//!
//! ```
//! use volcube_core::math::solvers::{LevenbergMarquardtSolver, LMConfig};
//!
//! let x_data = [0.0, 1.0, 2.0, 3.0, 4.0];
//! let y_data: Vec<f64> = x_data.iter().map(|x: &f64| 2.0 * (-0.5 * x).exp()).collect();
//!
//! let solver = LevenbergMarquardtSolver::new(LMConfig::default());
//! let residuals = |p: &[f64]| -> Vec<f64> {
//!     x_data.iter().zip(&y_data).map(|(&x, &y)| p[0] * (-p[1] * x).exp() - y).collect()
//! };
//!
//! let result = solver.solve(residuals, vec![1.0, 1.0]).unwrap();
//! assert!(result.converged);
//! assert!((result.params[0] - 2.0).abs() < 1e-6);
//! ```

use crate::types::SolverError;
use nalgebra::{DMatrix, DVector};
use tracing::warn;

/// Relative bump used for the forward-difference Jacobian.
const JACOBIAN_BUMP: f64 = 1e-8;

/// Configuration for the Levenberg-Marquardt solver.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LMConfig {
    /// Convergence tolerance on the residual norm `||r||`.
    pub tolerance: f64,
    /// Maximum number of iterations.
    pub max_iterations: usize,
    /// Initial damping factor.
    pub initial_lambda: f64,
    /// Damping multiplier after a rejected step.
    pub lambda_up: f64,
    /// Damping multiplier after an accepted step.
    pub lambda_down: f64,
    /// Lower clamp for the damping factor.
    pub min_lambda: f64,
    /// Upper clamp for the damping factor.
    pub max_lambda: f64,
    /// Convergence tolerance on the relative step size.
    pub param_tolerance: f64,
}

impl Default for LMConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 100,
            initial_lambda: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
            min_lambda: 1e-10,
            max_lambda: 1e10,
            param_tolerance: 1e-10,
        }
    }
}

impl LMConfig {
    /// Default configuration with the given tolerance and iteration limit.
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
            ..Default::default()
        }
    }

    /// Relaxed settings for quick fits.
    pub fn fast() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 50,
            ..Default::default()
        }
    }

    /// Tight settings for fits that must reach machine precision.
    pub fn high_precision() -> Self {
        Self {
            tolerance: 1e-14,
            max_iterations: 500,
            param_tolerance: 1e-14,
            ..Default::default()
        }
    }
}

/// Outcome of a least-squares solve.
#[derive(Debug, Clone, PartialEq)]
pub struct LMResult {
    /// Final parameters.
    pub params: Vec<f64>,
    /// Residuals at the final parameters.
    pub residuals: Vec<f64>,
    /// Sum of squared residuals at the final parameters.
    pub residual_ss: f64,
    /// Iterations performed.
    pub iterations: usize,
    /// Whether a convergence criterion was met before the iteration limit.
    pub converged: bool,
    /// Damping factor at exit.
    pub final_lambda: f64,
}

impl LMResult {
    /// Root mean squared residual.
    pub fn rmse(&self) -> f64 {
        if self.residuals.is_empty() {
            return 0.0;
        }
        (self.residual_ss / self.residuals.len() as f64).sqrt()
    }

    /// Largest absolute residual.
    pub fn max_abs_residual(&self) -> f64 {
        self.residuals.iter().fold(0.0, |m, r| m.max(r.abs()))
    }
}

/// Levenberg-Marquardt solver for nonlinear least squares.
///
/// The residual function may be called many times per iteration; it must be
/// deterministic for results to be reproducible.
#[derive(Debug, Clone)]
pub struct LevenbergMarquardtSolver {
    config: LMConfig,
}

impl LevenbergMarquardtSolver {
    /// Create a solver with the given configuration.
    pub fn new(config: LMConfig) -> Self {
        Self { config }
    }

    /// Create a solver with [`LMConfig::default`].
    pub fn with_defaults() -> Self {
        Self::new(LMConfig::default())
    }

    /// Solver configuration.
    pub fn config(&self) -> &LMConfig {
        &self.config
    }

    /// Minimise `Σ r_i(p)²` starting from `initial_params`.
    ///
    /// Hitting the iteration limit is not an error: the best parameters are
    /// returned with `converged == false` and the caller judges the fit.
    ///
    /// # Errors
    ///
    /// * `SolverError::NumericalInstability` - empty parameter or residual
    ///   vector, or non-finite initial residuals
    pub fn solve<F>(&self, residuals: F, initial_params: Vec<f64>) -> Result<LMResult, SolverError>
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        if initial_params.is_empty() {
            return Err(SolverError::NumericalInstability(
                "Empty parameter vector".to_string(),
            ));
        }

        let mut params = initial_params;
        let mut lambda = self.config.initial_lambda;
        let mut r = residuals(&params);
        if r.is_empty() {
            return Err(SolverError::NumericalInstability(
                "Empty residual vector".to_string(),
            ));
        }
        let mut ss = sum_of_squares(&r);
        if !ss.is_finite() {
            return Err(SolverError::NumericalInstability(format!(
                "Non-finite residuals at initial parameters {params:?}"
            )));
        }

        for iteration in 0..self.config.max_iterations {
            if ss.sqrt() < self.config.tolerance {
                return Ok(self.result(params, r, ss, iteration, true, lambda));
            }

            let jacobian = forward_jacobian(&residuals, &params, &r);
            let delta = match damped_step(&jacobian, &r, lambda) {
                Some(d) => d,
                None => {
                    lambda = (lambda * self.config.lambda_up).min(self.config.max_lambda);
                    continue;
                }
            };

            let param_norm = params.iter().map(|p| p * p).sum::<f64>().sqrt().max(1.0);
            if delta.norm() / param_norm < self.config.param_tolerance {
                return Ok(self.result(params, r, ss, iteration, true, lambda));
            }

            let trial: Vec<f64> = params.iter().zip(delta.iter()).map(|(p, d)| p + d).collect();
            let trial_r = residuals(&trial);
            let trial_ss = sum_of_squares(&trial_r);

            if trial_ss.is_finite() && trial_ss < ss {
                params = trial;
                r = trial_r;
                ss = trial_ss;
                lambda = (lambda * self.config.lambda_down).max(self.config.min_lambda);
            } else {
                lambda = (lambda * self.config.lambda_up).min(self.config.max_lambda);
            }
        }

        let iterations = self.config.max_iterations;
        warn!(
            iterations,
            residual_ss = ss,
            lambda,
            "Levenberg-Marquardt hit the iteration limit"
        );
        Ok(self.result(params, r, ss, iterations, false, lambda))
    }

    fn result(
        &self,
        params: Vec<f64>,
        residuals: Vec<f64>,
        residual_ss: f64,
        iterations: usize,
        converged: bool,
        final_lambda: f64,
    ) -> LMResult {
        LMResult {
            params,
            residuals,
            residual_ss,
            iterations,
            converged,
            final_lambda,
        }
    }
}

/// Solves `(J^T J + λI) δ = -J^T r`; `None` when the system is not positive definite.
fn damped_step(jacobian: &DMatrix<f64>, r: &[f64], lambda: f64) -> Option<DVector<f64>> {
    let n = jacobian.ncols();
    let r = DVector::from_column_slice(r);
    let jt = jacobian.transpose();
    let normal = &jt * jacobian + DMatrix::<f64>::identity(n, n) * lambda;
    let rhs = -(&jt * r);
    let step = normal.cholesky()?.solve(&rhs);
    step.iter().all(|x| x.is_finite()).then_some(step)
}

fn forward_jacobian<F>(residuals: &F, params: &[f64], r0: &[f64]) -> DMatrix<f64>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let mut jacobian = DMatrix::<f64>::zeros(r0.len(), params.len());
    let mut bumped = params.to_vec();

    for j in 0..params.len() {
        let h = JACOBIAN_BUMP * params[j].abs().max(1.0);
        bumped[j] = params[j] + h;
        let r_plus = residuals(&bumped);
        for (i, (rp, r)) in r_plus.iter().zip(r0).enumerate() {
            jacobian[(i, j)] = (rp - r) / h;
        }
        bumped[j] = params[j];
    }

    jacobian
}

#[inline]
fn sum_of_squares(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum()
}
