//! Cube calibration configuration.

use super::error::CubeError;
use volcube_core::math::solvers::SolverConfig;
use volcube_models::calibration::{ParameterFlags, SabrFitConfig, SabrGuess};
use volcube_models::models::SabrParameter;

/// Configuration of the SABR and spread cubes.
///
/// # Examples
///
/// ```
/// use volcube_models::models::SabrParameter;
/// use volcube_optimiser::cube::CubeConfig;
///
/// let config = CubeConfig::default()
///     .with_fixed_beta(0.5)
///     .with_vega_weighting(true)
///     .with_atm_calibration(true, SabrParameter::Alpha);
/// assert!(config.validate().is_ok());
///
/// let fixed_alpha = config.with_fixed_alpha(0.02);
/// assert!(fixed_alpha.validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CubeConfig {
    /// Per-node SABR fit settings.
    pub fit: SabrFitConfig,
    /// Re-solve one parameter per dense node so the ATM vol is matched.
    pub atm_calibrated: bool,
    /// Parameter solved for during ATM recalibration; must be free.
    pub atm_parameter: SabrParameter,
    /// Root-finder settings for ATM recalibration.
    pub atm_solver: SolverConfig<f64>,
    /// Extrapolate the market vol-spread cube.
    pub market_extrapolation: bool,
    /// Extrapolate the sparse, dense and ATM parameter cubes.
    pub parameter_extrapolation: bool,
}

impl Default for CubeConfig {
    fn default() -> Self {
        Self {
            fit: SabrFitConfig::default(),
            atm_calibrated: true,
            atm_parameter: SabrParameter::Alpha,
            atm_solver: SolverConfig::high_precision(),
            market_extrapolation: false,
            parameter_extrapolation: true,
        }
    }
}

impl CubeConfig {
    /// Check that ATM recalibration targets a free parameter and the fit
    /// tolerance is positive.
    ///
    /// # Errors
    ///
    /// `CubeError::InvalidConfig` describing the problem.
    pub fn validate(&self) -> Result<(), CubeError> {
        if self.atm_calibrated && self.fit.fixed.is_fixed(self.atm_parameter) {
            return Err(CubeError::InvalidConfig(format!(
                "ATM recalibration parameter {:?} is fixed",
                self.atm_parameter
            )));
        }
        if !(self.fit.max_error_tolerance > 0.0) {
            return Err(CubeError::InvalidConfig(format!(
                "max error tolerance {} must be positive",
                self.fit.max_error_tolerance
            )));
        }
        Ok(())
    }

    /// Replace the fit settings.
    pub fn with_fit(mut self, fit: SabrFitConfig) -> Self {
        self.fit = fit;
        self
    }

    /// Replace the initial guesses.
    pub fn with_guess(mut self, guess: SabrGuess) -> Self {
        self.fit.guess = guess;
        self
    }

    /// Replace the fixed-parameter flags.
    pub fn with_fixed(mut self, fixed: ParameterFlags) -> Self {
        self.fit.fixed = fixed;
        self
    }

    /// Hold beta at `beta`.
    pub fn with_fixed_beta(mut self, beta: f64) -> Self {
        self.fit = self.fit.with_fixed_beta(beta);
        self
    }

    /// Hold alpha at `alpha`.
    pub fn with_fixed_alpha(mut self, alpha: f64) -> Self {
        self.fit.guess.alpha = Some(alpha);
        self.fit.fixed.alpha = true;
        self
    }

    /// Toggle vega weighting of the fits.
    pub fn with_vega_weighting(mut self, vega_weighted: bool) -> Self {
        self.fit.vega_weighted = vega_weighted;
        self
    }

    /// Set the rms error tolerance of the fits.
    pub fn with_max_error_tolerance(mut self, tolerance: f64) -> Self {
        self.fit.max_error_tolerance = tolerance;
        self
    }

    /// Toggle ATM recalibration and choose its parameter.
    pub fn with_atm_calibration(mut self, enabled: bool, parameter: SabrParameter) -> Self {
        self.atm_calibrated = enabled;
        self.atm_parameter = parameter;
        self
    }

    /// Set the ATM root-finder configuration.
    pub fn with_atm_solver(mut self, solver: SolverConfig<f64>) -> Self {
        self.atm_solver = solver;
        self
    }

    /// Set the extrapolation flags of the market and parameter cubes.
    pub fn with_extrapolation(mut self, market: bool, parameters: bool) -> Self {
        self.market_extrapolation = market;
        self.parameter_extrapolation = parameters;
        self
    }
}
