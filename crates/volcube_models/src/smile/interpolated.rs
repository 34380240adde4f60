//! Smile section interpolating standard deviations in strike.

use super::error::SmileError;
use volcube_core::math::interpolators::{Extrapolation, Interpolator, LinearInterpolator};

/// A smile given by standard deviations `σ(K)·√T` at discrete strikes.
///
/// Between strikes the standard deviation is linear; outside, the
/// [`Extrapolation`] policy applies. A single strike gives a flat smile.
///
/// # Example
///
/// ```
/// use volcube_core::math::interpolators::Extrapolation;
/// use volcube_models::smile::InterpolatedSmileSection;
///
/// let smile = InterpolatedSmileSection::new(
///     4.0,
///     0.03,
///     vec![0.02, 0.03, 0.04],
///     vec![0.44, 0.40, 0.38],
///     Extrapolation::Flat,
/// )
/// .unwrap();
/// assert!((smile.volatility(0.03).unwrap() - 0.20).abs() < 1e-15);
/// assert!((smile.volatility(0.10).unwrap() - 0.19).abs() < 1e-15);
/// ```
#[derive(Debug, Clone)]
pub struct InterpolatedSmileSection {
    exercise_time: f64,
    atm_level: f64,
    strikes: Vec<f64>,
    std_devs: Vec<f64>,
    interpolator: Option<LinearInterpolator<f64>>,
}

impl InterpolatedSmileSection {
    /// Build a smile from strictly increasing strikes and non-negative
    /// standard deviations.
    ///
    /// # Errors
    ///
    /// * `SmileError::InvalidExerciseTime` - `exercise_time <= 0`
    /// * `SmileError::DimensionMismatch` - empty or mismatched inputs
    /// * `SmileError::NegativeStdDev` - a negative standard deviation
    /// * `SmileError::Interpolation` - strikes not strictly increasing
    pub fn new(
        exercise_time: f64,
        atm_level: f64,
        strikes: Vec<f64>,
        std_devs: Vec<f64>,
        extrapolation: Extrapolation,
    ) -> Result<Self, SmileError> {
        if !(exercise_time > 0.0) {
            return Err(SmileError::InvalidExerciseTime {
                time: exercise_time,
            });
        }
        if strikes.is_empty() || strikes.len() != std_devs.len() {
            return Err(SmileError::DimensionMismatch {
                strikes: strikes.len(),
                std_devs: std_devs.len(),
            });
        }
        if let Some((&strike, &std_dev)) = strikes
            .iter()
            .zip(&std_devs)
            .find(|(_, s)| !(**s >= 0.0))
        {
            return Err(SmileError::NegativeStdDev { strike, std_dev });
        }

        let interpolator = if strikes.len() > 1 {
            Some(LinearInterpolator::new(&strikes, &std_devs)?.with_extrapolation(extrapolation))
        } else {
            None
        };

        Ok(Self {
            exercise_time,
            atm_level,
            strikes,
            std_devs,
            interpolator,
        })
    }

    /// Time to exercise in years.
    pub fn exercise_time(&self) -> f64 {
        self.exercise_time
    }

    /// ATM forward.
    pub fn atm_level(&self) -> f64 {
        self.atm_level
    }

    /// Quoted strikes.
    pub fn strikes(&self) -> &[f64] {
        &self.strikes
    }

    /// Quoted standard deviations.
    pub fn std_devs(&self) -> &[f64] {
        &self.std_devs
    }

    /// Lowest quoted strike.
    pub fn min_strike(&self) -> f64 {
        self.strikes[0]
    }

    /// Highest quoted strike.
    pub fn max_strike(&self) -> f64 {
        self.strikes[self.strikes.len() - 1]
    }

    /// Standard deviation at `strike`.
    ///
    /// # Errors
    ///
    /// Out-of-range strike without extrapolation, or a negative
    /// extrapolated value.
    pub fn std_dev(&self, strike: f64) -> Result<f64, SmileError> {
        let std_dev = match &self.interpolator {
            Some(interp) => interp.interpolate(strike)?,
            None => self.std_devs[0],
        };
        if !(std_dev >= 0.0) {
            return Err(SmileError::NegativeStdDev { strike, std_dev });
        }
        Ok(std_dev)
    }

    /// Black volatility at `strike`.
    pub fn volatility(&self, strike: f64) -> Result<f64, SmileError> {
        Ok(self.std_dev(strike)? / self.exercise_time.sqrt())
    }
}
