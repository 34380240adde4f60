//! Tagged union over the smile kinds produced by the cubes.

use super::error::SmileError;
use super::interpolated::InterpolatedSmileSection;
use super::sabr::SabrSmileSection;
use crate::analytical::{black_formula, black_vega, OptionType};
use crate::models::SabrParams;
use volcube_core::math::interpolators::Extrapolation;

/// Volatility smile at one (option time, swap length) point.
///
/// Pricing engines consume this type without caring how the smile was
/// built. Static dispatch over the variants.
///
/// # Example
///
/// ```
/// use volcube_models::analytical::OptionType;
/// use volcube_models::models::SabrParams;
/// use volcube_models::smile::SmileSection;
///
/// let params = SabrParams::new(0.02, 0.5, 0.3, -0.2).unwrap();
/// let smile = SmileSection::sabr(5.0, 0.03, params).unwrap();
///
/// let vol = smile.volatility(0.035).unwrap();
/// assert!((smile.variance(0.035).unwrap() - vol * vol * 5.0).abs() < 1e-15);
/// assert!(smile.option_price(0.035, OptionType::Call, 0.9).unwrap() > 0.0);
/// ```
#[derive(Debug, Clone)]
pub enum SmileSection {
    /// Quoted sparse smile, flat beyond the quoted strikes.
    Quoted(InterpolatedSmileSection),
    /// ATM volatility plus interpolated spreads, linear beyond the strikes.
    Spread(InterpolatedSmileSection),
    /// SABR parametric smile.
    Sabr(SabrSmileSection),
}

impl SmileSection {
    /// Quoted smile with flat extrapolation.
    ///
    /// # Errors
    ///
    /// See [`InterpolatedSmileSection::new`].
    pub fn quoted(
        exercise_time: f64,
        atm_level: f64,
        strikes: Vec<f64>,
        std_devs: Vec<f64>,
    ) -> Result<Self, SmileError> {
        InterpolatedSmileSection::new(
            exercise_time,
            atm_level,
            strikes,
            std_devs,
            Extrapolation::Flat,
        )
        .map(SmileSection::Quoted)
    }

    /// Spread smile with linear extrapolation.
    ///
    /// # Errors
    ///
    /// See [`InterpolatedSmileSection::new`].
    pub fn spread(
        exercise_time: f64,
        atm_level: f64,
        strikes: Vec<f64>,
        std_devs: Vec<f64>,
    ) -> Result<Self, SmileError> {
        InterpolatedSmileSection::new(
            exercise_time,
            atm_level,
            strikes,
            std_devs,
            Extrapolation::Linear,
        )
        .map(SmileSection::Spread)
    }

    /// SABR smile.
    ///
    /// # Errors
    ///
    /// See [`SabrSmileSection::new`].
    pub fn sabr(exercise_time: f64, forward: f64, params: SabrParams) -> Result<Self, SmileError> {
        SabrSmileSection::new(exercise_time, forward, params).map(SmileSection::Sabr)
    }

    /// Time to exercise in years.
    pub fn exercise_time(&self) -> f64 {
        match self {
            SmileSection::Quoted(s) | SmileSection::Spread(s) => s.exercise_time(),
            SmileSection::Sabr(s) => s.exercise_time(),
        }
    }

    /// ATM forward level.
    pub fn atm_level(&self) -> f64 {
        match self {
            SmileSection::Quoted(s) | SmileSection::Spread(s) => s.atm_level(),
            SmileSection::Sabr(s) => s.forward(),
        }
    }

    /// Lowest strike the section is meant for.
    pub fn min_strike(&self) -> f64 {
        match self {
            SmileSection::Quoted(s) | SmileSection::Spread(s) => s.min_strike(),
            SmileSection::Sabr(_) => 0.0,
        }
    }

    /// Highest strike the section is meant for.
    pub fn max_strike(&self) -> f64 {
        match self {
            SmileSection::Quoted(s) | SmileSection::Spread(s) => s.max_strike(),
            SmileSection::Sabr(_) => f64::MAX,
        }
    }

    /// Black volatility at `strike`.
    pub fn volatility(&self, strike: f64) -> Result<f64, SmileError> {
        match self {
            SmileSection::Quoted(s) | SmileSection::Spread(s) => s.volatility(strike),
            SmileSection::Sabr(s) => s.volatility(strike),
        }
    }

    /// Total Black variance `σ²T` at `strike`.
    pub fn variance(&self, strike: f64) -> Result<f64, SmileError> {
        let std_dev = self.std_dev(strike)?;
        Ok(std_dev * std_dev)
    }

    /// Total standard deviation `σ√T` at `strike`.
    pub fn std_dev(&self, strike: f64) -> Result<f64, SmileError> {
        match self {
            SmileSection::Quoted(s) | SmileSection::Spread(s) => s.std_dev(strike),
            SmileSection::Sabr(s) => Ok(s.volatility(strike)? * s.exercise_time().sqrt()),
        }
    }

    /// Black price of an option on the ATM level, scaled by `discount`.
    pub fn option_price(
        &self,
        strike: f64,
        option_type: OptionType,
        discount: f64,
    ) -> Result<f64, SmileError> {
        let std_dev = self.std_dev(strike)?;
        Ok(black_formula(
            option_type,
            strike,
            self.atm_level(),
            std_dev,
            discount,
        )?)
    }

    /// Black vega at `strike`, scaled by `discount`.
    pub fn vega(&self, strike: f64, discount: f64) -> Result<f64, SmileError> {
        let std_dev = self.std_dev(strike)?;
        Ok(black_vega(
            strike,
            self.atm_level(),
            std_dev,
            self.exercise_time(),
            discount,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn strikes() -> Vec<f64> {
        vec![0.02, 0.03, 0.04]
    }

    fn std_devs() -> Vec<f64> {
        vec![0.5, 0.4, 0.36]
    }

    // ========================================
    // Variant Behaviour Tests
    // ========================================

    #[test]
    fn test_quoted_is_flat_outside() {
        let smile = SmileSection::quoted(4.0, 0.03, strikes(), std_devs()).unwrap();
        assert_relative_eq!(smile.volatility(0.06).unwrap(), 0.18, epsilon = 1e-15);
        assert_eq!(smile.min_strike(), 0.02);
        assert_eq!(smile.max_strike(), 0.04);
    }

    #[test]
    fn test_spread_is_linear_outside() {
        let smile = SmileSection::spread(4.0, 0.03, strikes(), std_devs()).unwrap();
        // slope -4 per unit strike beyond 0.04
        assert_relative_eq!(smile.std_dev(0.05).unwrap(), 0.32, epsilon = 1e-14);
    }

    #[test]
    fn test_sabr_dispatch() {
        let params = SabrParams::new(0.2, 1.0, 0.0, 0.0).unwrap();
        let smile = SmileSection::sabr(4.0, 0.03, params).unwrap();
        assert_eq!(smile.atm_level(), 0.03);
        assert_eq!(smile.min_strike(), 0.0);
        assert_relative_eq!(smile.std_dev(0.01).unwrap(), 0.4, epsilon = 1e-15);
        assert_relative_eq!(smile.variance(0.05).unwrap(), 0.16, epsilon = 1e-15);
    }

    // ========================================
    // Pricing Tests
    // ========================================

    #[test]
    fn test_option_price_uses_black() {
        let smile = SmileSection::quoted(4.0, 0.03, strikes(), std_devs()).unwrap();
        let expected = black_formula(OptionType::Put, 0.03, 0.03, 0.4, 0.95).unwrap();
        assert_eq!(smile.option_price(0.03, OptionType::Put, 0.95).unwrap(), expected);
    }

    #[test]
    fn test_vega_positive_and_errors_propagate() {
        let smile = SmileSection::quoted(4.0, 0.03, strikes(), std_devs()).unwrap();
        assert!(smile.vega(0.03, 1.0).unwrap() > 0.0);
        assert!(matches!(
            smile.option_price(-0.01, OptionType::Call, 1.0),
            Err(SmileError::Pricing(_))
        ));
    }
}
