//! Per-smile SABR calibration.
//!
//! Fits `(α, β, ν, ρ)` to the Black volatilities of one smile by
//! Levenberg-Marquardt least squares. Free parameters are optimised in an
//! unconstrained space and mapped back through
//!
//! ```text
//! α = y² + ε     β = exp(-y²)
//! ν = y² + ε     ρ = ρmax · y / √(1 + y²)
//! ```
//!
//! so every trial point is a valid SABR parameter set. Fixed parameters keep
//! their initial guess.
//!
//! With vega weighting on, residual `i` is scaled by `√wᵢ`, `wᵢ` the Black
//! vega at strike `i` normalised to sum to one; otherwise `wᵢ = 1/n`. The
//! reported rms and max errors are unweighted volatility differences.

use super::error::FitError;
use crate::analytical::black_vega;
use crate::models::{hagan_lognormal_vol, SabrParameter, SabrParams};
use crate::smile::InterpolatedSmileSection;
use tracing::{debug, warn};
use volcube_core::math::interpolators::{Extrapolation, Interpolator, LinearInterpolator};
use volcube_core::math::solvers::{LMConfig, LevenbergMarquardtSolver};

/// Floor added to the squared transforms of alpha and nu.
const POSITIVE_FLOOR: f64 = 1e-7;

/// Volatility error charged when the Hagan expansion breaks down at a trial point.
const BREAKDOWN_PENALTY: f64 = 1.0;

const PARAMETERS: [SabrParameter; 4] = [
    SabrParameter::Alpha,
    SabrParameter::Beta,
    SabrParameter::Nu,
    SabrParameter::Rho,
];

/// Initial guess for each parameter.
///
/// A missing alpha is derived from the ATM volatility as `σ_atm · F^(1-β)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SabrGuess {
    /// Alpha guess.
    pub alpha: Option<f64>,
    /// Beta guess.
    pub beta: f64,
    /// Nu guess.
    pub nu: f64,
    /// Rho guess.
    pub rho: f64,
}

impl Default for SabrGuess {
    fn default() -> Self {
        Self {
            alpha: None,
            beta: 0.5,
            nu: 0.4,
            rho: 0.0,
        }
    }
}

/// Which parameters are held at their guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ParameterFlags {
    /// Alpha fixed.
    pub alpha: bool,
    /// Beta fixed.
    pub beta: bool,
    /// Nu fixed.
    pub nu: bool,
    /// Rho fixed.
    pub rho: bool,
}

impl ParameterFlags {
    /// Whether `parameter` is fixed.
    pub fn is_fixed(&self, parameter: SabrParameter) -> bool {
        match parameter {
            SabrParameter::Alpha => self.alpha,
            SabrParameter::Beta => self.beta,
            SabrParameter::Nu => self.nu,
            SabrParameter::Rho => self.rho,
        }
    }

    /// Number of free parameters.
    pub fn free_count(&self) -> usize {
        PARAMETERS.iter().filter(|p| !self.is_fixed(**p)).count()
    }
}

/// SABR smile fit configuration.
///
/// # Example
///
/// ```
/// use volcube_models::calibration::SabrFitConfig;
///
/// let config = SabrFitConfig::default()
///     .with_fixed_beta(0.5)
///     .with_vega_weighting(true)
///     .with_max_error_tolerance(1e-3);
/// assert!(config.fixed.beta);
/// assert_eq!(config.fixed.free_count(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SabrFitConfig {
    /// Initial guesses (and values of fixed parameters).
    pub guess: SabrGuess,
    /// Fixed-parameter flags.
    pub fixed: ParameterFlags,
    /// Weight residuals by normalised Black vega.
    pub vega_weighted: bool,
    /// Largest acceptable rms volatility error.
    pub max_error_tolerance: f64,
    /// Levenberg-Marquardt settings.
    pub lm: LMConfig,
    /// Bound on |ρ| enforced by the transformation.
    pub rho_max: f64,
}

impl Default for SabrFitConfig {
    fn default() -> Self {
        Self {
            guess: SabrGuess::default(),
            fixed: ParameterFlags::default(),
            vega_weighted: false,
            max_error_tolerance: 0.002,
            lm: LMConfig::default(),
            rho_max: 0.9999,
        }
    }
}

impl SabrFitConfig {
    /// Hold beta at `beta`.
    pub fn with_fixed_beta(mut self, beta: f64) -> Self {
        self.guess.beta = beta;
        self.fixed.beta = true;
        self
    }

    /// Replace the guesses.
    pub fn with_guess(mut self, guess: SabrGuess) -> Self {
        self.guess = guess;
        self
    }

    /// Replace the fixed-parameter flags.
    pub fn with_fixed(mut self, fixed: ParameterFlags) -> Self {
        self.fixed = fixed;
        self
    }

    /// Toggle vega weighting.
    pub fn with_vega_weighting(mut self, vega_weighted: bool) -> Self {
        self.vega_weighted = vega_weighted;
        self
    }

    /// Set the rms error tolerance.
    pub fn with_max_error_tolerance(mut self, tolerance: f64) -> Self {
        self.max_error_tolerance = tolerance;
        self
    }

    /// Set the Levenberg-Marquardt configuration.
    pub fn with_lm_config(mut self, lm: LMConfig) -> Self {
        self.lm = lm;
        self
    }
}

/// Outcome of a successful smile fit.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SabrFitResult {
    /// Fitted parameters.
    pub params: SabrParams,
    /// Root-mean-square volatility error.
    pub rms_error: f64,
    /// Largest absolute volatility error.
    pub max_error: f64,
    /// Solver iterations.
    pub iterations: usize,
    /// Whether the solver met its own convergence test.
    pub converged: bool,
}

/// Fits SABR parameters to one smile.
///
/// # Example
///
/// ```
/// use volcube_models::calibration::{SabrFitConfig, SabrSmileFitter};
/// use volcube_models::models::SabrParams;
///
/// let truth = SabrParams::new(0.03, 0.5, 0.35, -0.25).unwrap();
/// let (t, f) = (3.0, 0.03);
/// let strikes = [0.015, 0.02, 0.025, 0.03, 0.035, 0.04, 0.05];
/// let vols: Vec<f64> = strikes
///     .iter()
///     .map(|&k| truth.implied_vol(k, f, t).unwrap())
///     .collect();
///
/// let fitter = SabrSmileFitter::new(SabrFitConfig::default().with_fixed_beta(0.5));
/// let fit = fitter.fit(t, f, &strikes, &vols).unwrap();
/// assert!(fit.rms_error < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct SabrSmileFitter {
    config: SabrFitConfig,
}

impl SabrSmileFitter {
    /// Create a fitter.
    pub fn new(config: SabrFitConfig) -> Self {
        Self { config }
    }

    /// Fit configuration.
    pub fn config(&self) -> &SabrFitConfig {
        &self.config
    }

    /// Fit the Black volatilities of a quoted smile section.
    ///
    /// # Errors
    ///
    /// See [`SabrSmileFitter::fit`].
    pub fn fit_section(&self, section: &InterpolatedSmileSection) -> Result<SabrFitResult, FitError> {
        let sqrt_t = section.exercise_time().sqrt();
        let vols: Vec<f64> = section.std_devs().iter().map(|s| s / sqrt_t).collect();
        self.fit(
            section.exercise_time(),
            section.atm_level(),
            section.strikes(),
            &vols,
        )
    }

    /// Fit SABR to `vols` quoted at `strikes` for an option on `forward`
    /// expiring at `expiry`.
    ///
    /// A fit the solver did not flag as converged is still accepted when its
    /// rms error is within tolerance.
    ///
    /// # Errors
    ///
    /// * `FitError::InvalidInput` - bad expiry, forward, strikes or vols
    /// * `FitError::InsufficientStrikes` - fewer strikes than free parameters
    /// * `FitError::NotConverged` - rms error above `max_error_tolerance`
    /// * `FitError::InvalidParameters` - fixed guesses fail SABR validation
    /// * `FitError::Solver` - least-squares failure
    pub fn fit(
        &self,
        expiry: f64,
        forward: f64,
        strikes: &[f64],
        vols: &[f64],
    ) -> Result<SabrFitResult, FitError> {
        validate_inputs(expiry, forward, strikes, vols)?;

        let free: Vec<SabrParameter> = PARAMETERS
            .iter()
            .copied()
            .filter(|p| !self.config.fixed.is_fixed(*p))
            .collect();
        if strikes.len() < free.len() {
            return Err(FitError::InsufficientStrikes {
                got: strikes.len(),
                need: free.len(),
            });
        }

        let start = self.initial_params(forward, strikes, vols);
        start.validate()?;
        let weights = self.weights(expiry, forward, strikes, vols);

        let assemble = |y: &[f64]| -> SabrParams {
            free.iter()
                .zip(y)
                .fold(start, |params, (&p, &yi)| params.with(p, self.direct(p, yi)))
        };
        let residuals = |y: &[f64]| -> Vec<f64> {
            let params = assemble(y);
            strikes
                .iter()
                .zip(vols)
                .zip(&weights)
                .map(|((&k, &market), &w)| {
                    let model = hagan_lognormal_vol(k, forward, expiry, &params);
                    let error = if model.is_finite() {
                        model - market
                    } else {
                        BREAKDOWN_PENALTY
                    };
                    error * w.sqrt()
                })
                .collect()
        };

        let (params, iterations, converged) = if free.is_empty() {
            (start, 0, true)
        } else {
            let y0: Vec<f64> = free.iter().map(|&p| self.inverse(p, start.get(p))).collect();
            let solver = LevenbergMarquardtSolver::new(self.config.lm);
            let lm = solver.solve(residuals, y0)?;
            (assemble(&lm.params), lm.iterations, lm.converged)
        };
        params.validate()?;

        let (rms_error, max_error) = vol_errors(&params, expiry, forward, strikes, vols);
        let tolerance = self.config.max_error_tolerance;
        if !(rms_error <= tolerance) {
            return Err(FitError::NotConverged {
                rms_error,
                max_error,
                tolerance,
            });
        }
        if !converged {
            warn!(
                expiry,
                rms_error,
                iterations,
                "SABR fit hit the iteration limit but is within tolerance"
            );
        }
        debug!(
            expiry,
            forward,
            alpha = params.alpha,
            beta = params.beta,
            nu = params.nu,
            rho = params.rho,
            rms_error,
            max_error,
            "SABR smile fitted"
        );

        Ok(SabrFitResult {
            params,
            rms_error,
            max_error,
            iterations,
            converged,
        })
    }

    fn initial_params(&self, forward: f64, strikes: &[f64], vols: &[f64]) -> SabrParams {
        let guess = self.config.guess;
        let alpha = guess.alpha.unwrap_or_else(|| {
            atm_vol_estimate(forward, strikes, vols) * forward.powf(1.0 - guess.beta)
        });
        SabrParams {
            alpha,
            beta: guess.beta,
            nu: guess.nu,
            rho: guess.rho,
        }
    }

    fn weights(&self, expiry: f64, forward: f64, strikes: &[f64], vols: &[f64]) -> Vec<f64> {
        let n = strikes.len();
        let uniform = vec![1.0 / n as f64; n];
        if !self.config.vega_weighted {
            return uniform;
        }
        let sqrt_t = expiry.sqrt();
        let vegas: Vec<f64> = strikes
            .iter()
            .zip(vols)
            .map(|(&k, &v)| black_vega(k, forward, v * sqrt_t, expiry, 1.0).unwrap_or(0.0))
            .collect();
        let total: f64 = vegas.iter().sum();
        if total > 0.0 && total.is_finite() {
            vegas.iter().map(|v| v / total).collect()
        } else {
            uniform
        }
    }

    fn direct(&self, parameter: SabrParameter, y: f64) -> f64 {
        match parameter {
            SabrParameter::Alpha | SabrParameter::Nu => y * y + POSITIVE_FLOOR,
            SabrParameter::Beta => (-y * y).exp(),
            SabrParameter::Rho => self.config.rho_max * y / (1.0 + y * y).sqrt(),
        }
    }

    fn inverse(&self, parameter: SabrParameter, x: f64) -> f64 {
        match parameter {
            SabrParameter::Alpha | SabrParameter::Nu => (x - POSITIVE_FLOOR).max(0.0).sqrt(),
            SabrParameter::Beta => (-x.max(f64::MIN_POSITIVE).min(1.0).ln()).sqrt(),
            SabrParameter::Rho => {
                let r_max = self.config.rho_max;
                let r = x.clamp(-0.99 * r_max, 0.99 * r_max);
                r / (r_max * r_max - r * r).sqrt()
            }
        }
    }
}

fn validate_inputs(expiry: f64, forward: f64, strikes: &[f64], vols: &[f64]) -> Result<(), FitError> {
    if !(expiry > 0.0) {
        return Err(FitError::InvalidInput(format!("expiry {expiry} must be positive")));
    }
    if !(forward > 0.0) {
        return Err(FitError::InvalidInput(format!("forward {forward} must be positive")));
    }
    if strikes.len() != vols.len() {
        return Err(FitError::InvalidInput(format!(
            "{} strikes but {} volatilities",
            strikes.len(),
            vols.len()
        )));
    }
    if strikes.is_empty() {
        return Err(FitError::InsufficientStrikes { got: 0, need: 1 });
    }
    if let Some(k) = strikes.iter().find(|k| !(**k > 0.0)) {
        return Err(FitError::InvalidInput(format!("strike {k} must be positive")));
    }
    if strikes.windows(2).any(|w| !(w[0] < w[1])) {
        return Err(FitError::InvalidInput("strikes must be strictly increasing".to_string()));
    }
    if let Some(v) = vols.iter().find(|v| !(**v > 0.0) || !v.is_finite()) {
        return Err(FitError::InvalidInput(format!("volatility {v} must be positive")));
    }
    Ok(())
}

/// Market volatility at the forward, flat beyond the quoted strikes.
fn atm_vol_estimate(forward: f64, strikes: &[f64], vols: &[f64]) -> f64 {
    LinearInterpolator::new(strikes, vols)
        .map(|interp| interp.with_extrapolation(Extrapolation::Flat))
        .and_then(|interp| interp.interpolate(forward))
        .unwrap_or(vols[0])
}

fn vol_errors(
    params: &SabrParams,
    expiry: f64,
    forward: f64,
    strikes: &[f64],
    vols: &[f64],
) -> (f64, f64) {
    let errors: Vec<f64> = strikes
        .iter()
        .zip(vols)
        .map(|(&k, &market)| hagan_lognormal_vol(k, forward, expiry, params) - market)
        .collect();
    let n = errors.len() as f64;
    let rms = (errors.iter().map(|e| e * e).sum::<f64>() / n).sqrt();
    let max = errors.iter().fold(0.0_f64, |m, e| m.max(e.abs()));
    (rms, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const STRIKES: [f64; 7] = [0.015, 0.02, 0.025, 0.03, 0.035, 0.04, 0.05];

    fn market(params: &SabrParams, forward: f64, expiry: f64) -> Vec<f64> {
        STRIKES
            .iter()
            .map(|&k| params.implied_vol(k, forward, expiry).unwrap())
            .collect()
    }

    // ========================================
    // Transformation Tests
    // ========================================

    #[test]
    fn test_transform_inverse_roundtrip() {
        let fitter = SabrSmileFitter::new(SabrFitConfig::default());
        for (p, x) in [
            (SabrParameter::Alpha, 0.035),
            (SabrParameter::Beta, 0.7),
            (SabrParameter::Nu, 0.45),
            (SabrParameter::Rho, -0.6),
        ] {
            let y = fitter.inverse(p, x);
            assert_relative_eq!(fitter.direct(p, y), x, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_transform_stays_in_domain() {
        let fitter = SabrSmileFitter::new(SabrFitConfig::default());
        for y in [-1e6, -3.0, 0.0, 2.0, 1e6] {
            assert!(fitter.direct(SabrParameter::Alpha, y) > 0.0);
            let beta = fitter.direct(SabrParameter::Beta, y);
            assert!((0.0..=1.0).contains(&beta));
            assert!(fitter.direct(SabrParameter::Rho, y).abs() < 1.0);
        }
    }

    // ========================================
    // Fit Tests
    // ========================================

    #[test]
    fn test_recovers_parameters_with_fixed_beta() {
        let truth = SabrParams::new(0.025, 0.5, 0.4, -0.3).unwrap();
        let vols = market(&truth, 0.03, 5.0);
        let fitter = SabrSmileFitter::new(SabrFitConfig::default().with_fixed_beta(0.5));
        let fit = fitter.fit(5.0, 0.03, &STRIKES, &vols).unwrap();

        assert!(fit.rms_error < 1e-7);
        assert_eq!(fit.params.beta, 0.5);
        assert_relative_eq!(fit.params.alpha, truth.alpha, max_relative = 1e-3);
        assert_relative_eq!(fit.params.nu, truth.nu, max_relative = 1e-2);
        assert_relative_eq!(fit.params.rho, truth.rho, epsilon = 1e-2);
    }

    #[test]
    fn test_vega_weighted_fit() {
        let truth = SabrParams::new(0.025, 0.5, 0.4, -0.3).unwrap();
        let vols = market(&truth, 0.03, 5.0);
        let config = SabrFitConfig::default()
            .with_fixed_beta(0.5)
            .with_vega_weighting(true);
        let fit = SabrSmileFitter::new(config).fit(5.0, 0.03, &STRIKES, &vols).unwrap();
        assert!(fit.rms_error < 1e-6);
    }

    #[test]
    fn test_all_fixed_evaluates_guess() {
        let truth = SabrParams::new(0.025, 0.5, 0.4, -0.3).unwrap();
        let vols = market(&truth, 0.03, 5.0);
        let config = SabrFitConfig::default()
            .with_guess(SabrGuess {
                alpha: Some(0.025),
                beta: 0.5,
                nu: 0.4,
                rho: -0.3,
            })
            .with_fixed(ParameterFlags {
                alpha: true,
                beta: true,
                nu: true,
                rho: true,
            });
        let fit = SabrSmileFitter::new(config).fit(5.0, 0.03, &STRIKES, &vols).unwrap();
        assert_eq!(fit.params, truth);
        assert_eq!(fit.iterations, 0);
        assert!(fit.max_error < 1e-15);
    }

    #[test]
    fn test_insufficient_strikes() {
        let fitter = SabrSmileFitter::new(SabrFitConfig::default());
        let err = fitter
            .fit(1.0, 0.03, &[0.02, 0.03, 0.04], &[0.3, 0.25, 0.22])
            .unwrap_err();
        assert_eq!(err, FitError::InsufficientStrikes { got: 3, need: 4 });
    }

    #[test]
    fn test_unfittable_smile_is_not_converged() {
        // a zig-zag no SABR smile can follow within 1bp
        let vols = [0.30, 0.10, 0.30, 0.10, 0.30, 0.10, 0.30];
        let config = SabrFitConfig::default()
            .with_fixed_beta(0.5)
            .with_max_error_tolerance(1e-4);
        let err = SabrSmileFitter::new(config)
            .fit(2.0, 0.03, &STRIKES, &vols)
            .unwrap_err();
        match err {
            FitError::NotConverged {
                rms_error,
                tolerance,
                ..
            } => {
                assert!(rms_error > tolerance);
                assert_eq!(tolerance, 1e-4);
            }
            other => panic!("Expected NotConverged, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_inputs() {
        let fitter = SabrSmileFitter::new(SabrFitConfig::default().with_fixed_beta(0.5));
        assert!(matches!(
            fitter.fit(0.0, 0.03, &STRIKES, &[0.2; 7]),
            Err(FitError::InvalidInput(_))
        ));
        assert!(matches!(
            fitter.fit(1.0, 0.03, &STRIKES, &[0.2; 6]),
            Err(FitError::InvalidInput(_))
        ));
        assert!(matches!(
            fitter.fit(1.0, 0.03, &[0.03, 0.02, 0.04], &[0.2; 3]),
            Err(FitError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_fit_section_uses_std_devs() {
        let truth = SabrParams::new(0.025, 0.5, 0.4, -0.3).unwrap();
        let t = 4.0;
        let std_devs: Vec<f64> = market(&truth, 0.03, t).iter().map(|v| v * 2.0).collect();
        let section = InterpolatedSmileSection::new(
            t,
            0.03,
            STRIKES.to_vec(),
            std_devs,
            Extrapolation::Flat,
        )
        .unwrap();
        let fitter = SabrSmileFitter::new(SabrFitConfig::default().with_fixed_beta(0.5));
        assert!(fitter.fit_section(&section).unwrap().rms_error < 1e-6);
    }
}
