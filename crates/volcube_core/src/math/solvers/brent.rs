//! Brent's method root-finding solver.

use super::SolverConfig;
use crate::types::SolverError;
use num_traits::Float;
use tracing::{debug, warn};

/// Growth factor applied to the bracket width while searching for a sign change.
const BRACKET_GROWTH: f64 = 1.6;

/// Brent's method root-finding solver.
///
/// Combines bisection, secant and inverse quadratic interpolation. It needs
/// a bracket `[a, b]` with `f(a)` and `f(b)` of opposite signs, which
/// [`BrentSolver::find_root_from_guess`] can search for from a starting point.
///
/// The solver stops when `|f(b)|` or the bracket half-width falls below the
/// configured tolerance.
///
/// # Example
///
/// ```
/// use volcube_core::math::solvers::{BrentSolver, SolverConfig};
///
/// let solver = BrentSolver::new(SolverConfig::default());
/// let root = solver.find_root(|x: f64| x * x - 2.0, 0.0, 2.0).unwrap();
/// assert!((root - std::f64::consts::SQRT_2).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct BrentSolver<T: Float> {
    config: SolverConfig<T>,
}

impl<T: Float> BrentSolver<T> {
    /// Create a solver with the given configuration.
    pub fn new(config: SolverConfig<T>) -> Self {
        Self { config }
    }

    /// Create a solver with [`SolverConfig::default`].
    pub fn with_defaults() -> Self {
        Self::new(SolverConfig::default())
    }

    /// Solver configuration.
    pub fn config(&self) -> &SolverConfig<T> {
        &self.config
    }

    /// Find a root of `f` in the bracket `[a, b]`.
    ///
    /// # Errors
    ///
    /// * `SolverError::NoBracket` - `f(a)` and `f(b)` have the same sign
    /// * `SolverError::MaxIterationsExceeded` - no convergence within the limit
    pub fn find_root<F>(&self, f: F, a: T, b: T) -> Result<T, SolverError>
    where
        F: Fn(T) -> T,
    {
        let fa = f(a);
        let fb = f(b);
        self.solve_bracketed(&f, a, fa, b, fb)
    }

    /// Find a root of `f` starting from `guess`.
    ///
    /// The bracket `[guess - step, guess + step]` is widened geometrically,
    /// never crossing `lower` or `upper`, until `f` changes sign; Brent's
    /// method then runs on the bracket found.
    ///
    /// # Errors
    ///
    /// * `SolverError::NoBracket` - no sign change found within the iteration
    ///   limit or the bounds
    /// * `SolverError::MaxIterationsExceeded` - Brent's method did not converge
    pub fn find_root_from_guess<F>(
        &self,
        f: F,
        guess: T,
        step: T,
        lower: T,
        upper: T,
    ) -> Result<T, SolverError>
    where
        F: Fn(T) -> T,
    {
        let growth = T::from(BRACKET_GROWTH).unwrap_or_else(T::one);
        let mut a = (guess - step).max(lower);
        let mut b = (guess + step).min(upper);
        let mut fa = f(a);
        let mut fb = f(b);

        for _ in 0..self.config.max_iterations {
            if fa * fb <= T::zero() {
                return self.solve_bracketed(&f, a, fa, b, fb);
            }
            // widen on the side whose value is closer to zero
            if fa.abs() < fb.abs() {
                if a <= lower {
                    break;
                }
                a = (a + growth * (a - b)).max(lower);
                fa = f(a);
            } else {
                if b >= upper {
                    break;
                }
                b = (b + growth * (b - a)).min(upper);
                fb = f(b);
            }
        }

        let (a, b) = (a.to_f64().unwrap_or(f64::NAN), b.to_f64().unwrap_or(f64::NAN));
        debug!(a, b, "no sign change found within the bounds");
        Err(SolverError::NoBracket { a, b })
    }

    fn solve_bracketed<F>(&self, f: &F, a: T, fa: T, b: T, fb: T) -> Result<T, SolverError>
    where
        F: Fn(T) -> T,
    {
        if fa * fb > T::zero() || fa.is_nan() || fb.is_nan() {
            return Err(SolverError::NoBracket {
                a: a.to_f64().unwrap_or(f64::NAN),
                b: b.to_f64().unwrap_or(f64::NAN),
            });
        }

        let zero = T::zero();
        let one = T::one();
        let two = one + one;
        let three = two + one;
        let half = one / two;
        let tolerance = self.config.tolerance;

        let (mut a, mut fa, mut b, mut fb) = (a, fa, b, fb);
        let (mut c, mut fc) = (b, fb);
        let mut d = b - a;
        let mut e = d;

        for _ in 0..self.config.max_iterations {
            if (fb > zero && fc > zero) || (fb < zero && fc < zero) {
                c = a;
                fc = fa;
                d = b - a;
                e = d;
            }
            if fc.abs() < fb.abs() {
                a = b;
                b = c;
                c = a;
                fa = fb;
                fb = fc;
                fc = fa;
            }

            let tol1 = two * T::epsilon() * b.abs() + half * tolerance;
            let xm = half * (c - b);
            if xm.abs() <= tol1 || fb.abs() < tolerance {
                return Ok(b);
            }

            if e.abs() >= tol1 && fa.abs() > fb.abs() {
                let s = fb / fa;
                let (mut p, mut q) = if a == c {
                    // secant
                    (two * xm * s, one - s)
                } else {
                    // inverse quadratic interpolation
                    let qq = fa / fc;
                    let r = fb / fc;
                    (
                        s * (two * xm * qq * (qq - r) - (b - a) * (r - one)),
                        (qq - one) * (r - one) * (s - one),
                    )
                };
                if p > zero {
                    q = -q;
                }
                p = p.abs();
                let min1 = three * xm * q - (tol1 * q).abs();
                let min2 = (e * q).abs();
                if two * p < min1.min(min2) {
                    e = d;
                    d = p / q;
                } else {
                    d = xm;
                    e = d;
                }
            } else {
                d = xm;
                e = d;
            }

            a = b;
            fa = fb;
            b = if d.abs() > tol1 {
                b + d
            } else if xm > zero {
                b + tol1
            } else {
                b - tol1
            };
            fb = f(b);
        }

        let iterations = self.config.max_iterations;
        warn!(
            iterations,
            bracket = (c - b).abs().to_f64().unwrap_or(f64::NAN),
            "Brent solver did not converge"
        );
        Err(SolverError::MaxIterationsExceeded { iterations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // ========================================
    // Bracketed Root Tests
    // ========================================

    #[test]
    fn test_find_sqrt_2() {
        let solver = BrentSolver::new(SolverConfig::default());
        let root = solver.find_root(|x: f64| x * x - 2.0, 0.0, 2.0).unwrap();
        assert_relative_eq!(root, std::f64::consts::SQRT_2, epsilon = 1e-10);
    }

    #[test]
    fn test_find_sin_root() {
        let solver = BrentSolver::new(SolverConfig::high_precision());
        let root = solver.find_root(|x: f64| x.sin(), 3.0, 4.0).unwrap();
        assert_relative_eq!(root, std::f64::consts::PI, epsilon = 1e-13);
    }

    #[test]
    fn test_root_at_endpoint() {
        let solver = BrentSolver::with_defaults();
        let root = solver.find_root(|x: f64| x - 1.0, 1.0, 3.0).unwrap();
        assert_eq!(root, 1.0);
    }

    #[test]
    fn test_no_bracket() {
        let solver = BrentSolver::with_defaults();
        let err = solver.find_root(|x: f64| x * x + 1.0, -1.0, 1.0).unwrap_err();
        assert_eq!(err, SolverError::NoBracket { a: -1.0, b: 1.0 });
    }

    #[test]
    fn test_max_iterations() {
        let solver = BrentSolver::new(SolverConfig::new(1e-300, 3));
        let err = solver
            .find_root(|x: f64| x.powi(3) - x - 2.0, 1.0, 2.0)
            .unwrap_err();
        assert_eq!(err, SolverError::MaxIterationsExceeded { iterations: 3 });
    }

    // ========================================
    // Bracket Search Tests
    // ========================================

    #[test]
    fn test_find_root_from_guess_expands_bracket() {
        let solver = BrentSolver::new(SolverConfig::high_precision());
        let root = solver
            .find_root_from_guess(|x: f64| x - 40.0, 1.0, 0.1, 0.0, f64::INFINITY)
            .unwrap();
        assert_relative_eq!(root, 40.0, epsilon = 1e-12);
    }

    #[test]
    fn test_find_root_from_guess_respects_lower_bound() {
        let solver = BrentSolver::new(SolverConfig::high_precision());
        let root = solver
            .find_root_from_guess(|x: f64| x * x - 1e-6, 0.5, 0.4, 1e-12, 10.0)
            .unwrap();
        assert_relative_eq!(root, 1e-3, epsilon = 1e-10);
    }

    #[test]
    fn test_find_root_from_guess_fails_within_bounds() {
        let solver = BrentSolver::with_defaults();
        let result = solver.find_root_from_guess(|x: f64| x + 5.0, 1.0, 0.5, 0.0, 10.0);
        // the search stops once the side nearer zero hits its bound
        assert!(matches!(result, Err(SolverError::NoBracket { a, .. }) if a == 0.0));
    }
}
