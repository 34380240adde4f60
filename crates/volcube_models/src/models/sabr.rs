//! SABR stochastic volatility model.
//!
//! ```text
//! dF = α F^β dW₁
//! dα = ν α dW₂
//! E[dW₁ dW₂] = ρ dt
//! ```
//!
//! Implied Black volatilities come from the Hagan et al. (2002) expansion,
//! with a series form for `ln(F/K)` and for `z / x(z)` near the money so
//! the ATM limit is taken without loss of precision.

use thiserror::Error;

/// Relative distance below which forward and strike are treated as equal.
const CLOSE_TOLERANCE: f64 = 42.0 * f64::EPSILON;

/// SABR parameter and evaluation errors.
#[derive(Debug, Clone, Copy, Error, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SabrError {
    /// Alpha must be positive.
    #[error("Invalid SABR alpha: {alpha} (must be positive)")]
    InvalidAlpha {
        /// Offending alpha
        alpha: f64,
    },

    /// Beta must lie in [0, 1].
    #[error("Invalid SABR beta: {beta} (must be in [0, 1])")]
    InvalidBeta {
        /// Offending beta
        beta: f64,
    },

    /// Nu must be non-negative.
    #[error("Invalid SABR nu: {nu} (must be non-negative)")]
    InvalidNu {
        /// Offending nu
        nu: f64,
    },

    /// Rho must lie in (-1, 1).
    #[error("Invalid SABR rho: {rho} (must be in (-1, 1))")]
    InvalidRho {
        /// Offending rho
        rho: f64,
    },

    /// Forward must be positive.
    #[error("Invalid SABR forward: {forward} (must be positive)")]
    InvalidForward {
        /// Offending forward
        forward: f64,
    },

    /// Strike must be positive.
    #[error("Invalid SABR strike: {strike} (must be positive)")]
    InvalidStrike {
        /// Offending strike
        strike: f64,
    },

    /// Expiry must be non-negative.
    #[error("Invalid SABR expiry: {expiry} (must be non-negative)")]
    InvalidExpiry {
        /// Offending expiry
        expiry: f64,
    },

    /// The expansion produced a non-positive or non-finite volatility.
    #[error("SABR volatility {vol} at strike {strike} is not a positive finite number")]
    InvalidVolatility {
        /// Computed volatility
        vol: f64,
        /// Strike it was computed at
        strike: f64,
    },
}

/// Names one of the four SABR parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SabrParameter {
    /// Initial volatility level.
    #[default]
    Alpha,
    /// CEV exponent.
    Beta,
    /// Volatility of volatility.
    Nu,
    /// Correlation.
    Rho,
}

/// SABR parameters `(α, β, ν, ρ)`.
///
/// # Examples
///
/// ```
/// use volcube_models::models::SabrParams;
///
/// let params = SabrParams::new(0.02, 0.5, 0.4, -0.2).unwrap();
/// let atm = params.implied_vol(0.03, 0.03, 5.0).unwrap();
/// let otm = params.implied_vol(0.05, 0.03, 5.0).unwrap();
/// assert!(atm > 0.0 && otm > 0.0);
///
/// assert!(SabrParams::new(0.02, 1.5, 0.4, 0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SabrParams {
    /// Initial volatility level.
    pub alpha: f64,
    /// CEV exponent.
    pub beta: f64,
    /// Volatility of volatility.
    pub nu: f64,
    /// Forward/volatility correlation.
    pub rho: f64,
}

impl SabrParams {
    /// Create validated parameters.
    ///
    /// # Errors
    ///
    /// See [`SabrParams::validate`].
    pub fn new(alpha: f64, beta: f64, nu: f64, rho: f64) -> Result<Self, SabrError> {
        let params = Self {
            alpha,
            beta,
            nu,
            rho,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check `α > 0`, `0 ≤ β ≤ 1`, `ν ≥ 0` and `-1 < ρ < 1`.
    ///
    /// NaN fails every check.
    pub fn validate(&self) -> Result<(), SabrError> {
        if !(self.alpha > 0.0) || !self.alpha.is_finite() {
            return Err(SabrError::InvalidAlpha { alpha: self.alpha });
        }
        if !(0.0..=1.0).contains(&self.beta) {
            return Err(SabrError::InvalidBeta { beta: self.beta });
        }
        if !(self.nu >= 0.0) || !self.nu.is_finite() {
            return Err(SabrError::InvalidNu { nu: self.nu });
        }
        if !(self.rho > -1.0 && self.rho < 1.0) {
            return Err(SabrError::InvalidRho { rho: self.rho });
        }
        Ok(())
    }

    /// Value of one parameter.
    pub fn get(&self, parameter: SabrParameter) -> f64 {
        match parameter {
            SabrParameter::Alpha => self.alpha,
            SabrParameter::Beta => self.beta,
            SabrParameter::Nu => self.nu,
            SabrParameter::Rho => self.rho,
        }
    }

    /// Copy with one parameter replaced, unvalidated.
    pub fn with(mut self, parameter: SabrParameter, value: f64) -> Self {
        match parameter {
            SabrParameter::Alpha => self.alpha = value,
            SabrParameter::Beta => self.beta = value,
            SabrParameter::Nu => self.nu = value,
            SabrParameter::Rho => self.rho = value,
        }
        self
    }

    /// Parameters as `[α, β, ν, ρ]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.alpha, self.beta, self.nu, self.rho]
    }

    /// Hagan implied Black volatility for `strike` on `forward` at `expiry`.
    ///
    /// # Errors
    ///
    /// Invalid parameters or inputs, or a result that is not a positive
    /// finite number.
    pub fn implied_vol(&self, strike: f64, forward: f64, expiry: f64) -> Result<f64, SabrError> {
        self.validate()?;
        if !(forward > 0.0) {
            return Err(SabrError::InvalidForward { forward });
        }
        if !(strike > 0.0) {
            return Err(SabrError::InvalidStrike { strike });
        }
        if !(expiry >= 0.0) {
            return Err(SabrError::InvalidExpiry { expiry });
        }
        let vol = hagan_lognormal_vol(strike, forward, expiry, self);
        if !(vol > 0.0) || !vol.is_finite() {
            return Err(SabrError::InvalidVolatility { vol, strike });
        }
        Ok(vol)
    }
}

/// Unchecked Hagan lognormal volatility.
///
/// No validation is performed; callers that feed trial parameters (such as
/// a least-squares fit) inspect the result for finiteness themselves.
pub fn hagan_lognormal_vol(strike: f64, forward: f64, expiry: f64, params: &SabrParams) -> f64 {
    let SabrParams {
        alpha,
        beta,
        nu,
        rho,
    } = *params;
    let one_minus_beta = 1.0 - beta;

    let a = (forward * strike).powf(one_minus_beta);
    let sqrt_a = a.sqrt();
    let log_m = if (forward - strike).abs() <= CLOSE_TOLERANCE * forward.max(strike) {
        let eps = (forward - strike) / strike;
        eps - 0.5 * eps * eps
    } else {
        (forward / strike).ln()
    };

    let z = (nu / alpha) * sqrt_a * log_m;
    let b = 1.0 - 2.0 * rho * z + z * z;
    let c = one_minus_beta * one_minus_beta * log_m * log_m;
    let d_denominator = sqrt_a * (1.0 + c / 24.0 + c * c / 1920.0);
    let d_time = 1.0
        + expiry
            * (one_minus_beta * one_minus_beta * alpha * alpha / (24.0 * a)
                + 0.25 * rho * beta * nu * alpha / sqrt_a
                + (2.0 - 3.0 * rho * rho) * nu * nu / 24.0);

    let multiplier = if z * z > 10.0 * f64::EPSILON {
        let xx = ((b.sqrt() + z - rho) / (1.0 - rho)).ln();
        z / xx
    } else {
        1.0 - 0.5 * rho * z - (3.0 * rho * rho - 2.0) * z * z / 12.0
    };

    (alpha / d_denominator) * multiplier * d_time
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    // ========================================
    // Validation Tests
    // ========================================

    #[test]
    fn test_validate_bounds() {
        assert!(SabrParams::new(0.2, 0.0, 0.0, 0.0).is_ok());
        assert!(SabrParams::new(0.2, 1.0, 1.0, 0.99).is_ok());
        assert_eq!(
            SabrParams::new(0.0, 0.5, 0.3, 0.0),
            Err(SabrError::InvalidAlpha { alpha: 0.0 })
        );
        assert_eq!(
            SabrParams::new(0.2, 0.5, -0.1, 0.0),
            Err(SabrError::InvalidNu { nu: -0.1 })
        );
        assert_eq!(
            SabrParams::new(0.2, 0.5, 0.3, 1.0),
            Err(SabrError::InvalidRho { rho: 1.0 })
        );
        assert!(SabrParams::new(f64::NAN, 0.5, 0.3, 0.0).is_err());
    }

    #[test]
    fn test_get_and_with() {
        let params = SabrParams::new(0.02, 0.5, 0.4, -0.2).unwrap();
        assert_eq!(params.get(SabrParameter::Nu), 0.4);
        let bumped = params.with(SabrParameter::Alpha, 0.03);
        assert_eq!(bumped.alpha, 0.03);
        assert_eq!(bumped.to_array()[1..], params.to_array()[1..]);
        assert_eq!(SabrParameter::default(), SabrParameter::Alpha);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            format!("{}", SabrError::InvalidBeta { beta: 2.0 }),
            "Invalid SABR beta: 2 (must be in [0, 1])"
        );
    }

    // ========================================
    // Hagan Formula Tests
    // ========================================

    #[test]
    fn test_lognormal_without_volvol_is_flat() {
        let params = SabrParams::new(0.25, 1.0, 0.0, 0.0).unwrap();
        for k in [0.01, 0.03, 0.08] {
            assert_relative_eq!(params.implied_vol(k, 0.03, 10.0).unwrap(), 0.25, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_atm_closed_form() {
        let (alpha, beta, nu, rho) = (0.02, 0.5, 0.4, -0.3);
        let (f, t) = (0.03_f64, 2.0);
        let params = SabrParams::new(alpha, beta, nu, rho).unwrap();
        let fb = f.powf(1.0 - beta);
        let expected = alpha / fb
            * (1.0
                + t * ((1.0 - beta).powi(2) * alpha * alpha / (24.0 * fb * fb)
                    + 0.25 * rho * beta * nu * alpha / fb
                    + (2.0 - 3.0 * rho * rho) * nu * nu / 24.0));
        assert_relative_eq!(params.implied_vol(f, f, t).unwrap(), expected, epsilon = 1e-15);
    }

    #[test]
    fn test_continuous_through_atm() {
        let params = SabrParams::new(0.02, 0.5, 0.4, -0.3).unwrap();
        let atm = params.implied_vol(0.03, 0.03, 2.0).unwrap();
        for k in [0.03 * (1.0 + 1e-9), 0.03 * (1.0 - 1e-9)] {
            assert_relative_eq!(params.implied_vol(k, 0.03, 2.0).unwrap(), atm, max_relative = 1e-8);
        }
    }

    #[test]
    fn test_negative_rho_gives_downward_skew() {
        let params = SabrParams::new(0.02, 0.5, 0.4, -0.5).unwrap();
        let low = params.implied_vol(0.02, 0.03, 1.0).unwrap();
        let high = params.implied_vol(0.04, 0.03, 1.0).unwrap();
        assert!(low > high);
    }

    #[test]
    fn test_invalid_inputs() {
        let params = SabrParams::new(0.02, 0.5, 0.4, 0.0).unwrap();
        assert_eq!(
            params.implied_vol(0.0, 0.03, 1.0),
            Err(SabrError::InvalidStrike { strike: 0.0 })
        );
        assert_eq!(
            params.implied_vol(0.03, -0.01, 1.0),
            Err(SabrError::InvalidForward { forward: -0.01 })
        );
        assert_eq!(
            params.implied_vol(0.03, 0.03, -1.0),
            Err(SabrError::InvalidExpiry { expiry: -1.0 })
        );
    }

    proptest! {
        #[test]
        fn prop_positive_vol_for_moderate_params(
            k in 0.005..0.1_f64,
            nu in 0.0..1.0_f64,
            rho in -0.7..0.7_f64,
            beta in 0.0..=1.0_f64,
        ) {
            let params = SabrParams::new(0.03, beta, nu, rho).unwrap();
            let vol = hagan_lognormal_vol(k, 0.03, 1.0, &params);
            prop_assert!(vol.is_finite() && vol > 0.0);
        }
    }
}
