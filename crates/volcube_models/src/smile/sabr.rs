//! SABR parametric smile.

use super::error::SmileError;
use crate::models::SabrParams;

/// Smile given by the Hagan SABR expansion at a fixed expiry and forward.
///
/// # Example
///
/// ```
/// use volcube_models::models::SabrParams;
/// use volcube_models::smile::SabrSmileSection;
///
/// let params = SabrParams::new(0.2, 1.0, 0.0, 0.0).unwrap();
/// let smile = SabrSmileSection::new(2.0, 0.03, params).unwrap();
/// assert!((smile.volatility(0.05).unwrap() - 0.2).abs() < 1e-15);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SabrSmileSection {
    exercise_time: f64,
    forward: f64,
    params: SabrParams,
}

impl SabrSmileSection {
    /// Build the section, validating the parameters.
    ///
    /// # Errors
    ///
    /// * `SmileError::InvalidExerciseTime` - `exercise_time <= 0`
    /// * `SmileError::Sabr` - invalid parameters or non-positive forward
    pub fn new(exercise_time: f64, forward: f64, params: SabrParams) -> Result<Self, SmileError> {
        if !(exercise_time > 0.0) {
            return Err(SmileError::InvalidExerciseTime {
                time: exercise_time,
            });
        }
        params.validate()?;
        if !(forward > 0.0) {
            return Err(crate::models::SabrError::InvalidForward { forward }.into());
        }
        Ok(Self {
            exercise_time,
            forward,
            params,
        })
    }

    /// Time to exercise in years.
    pub fn exercise_time(&self) -> f64 {
        self.exercise_time
    }

    /// Forward swap rate.
    pub fn forward(&self) -> f64 {
        self.forward
    }

    /// SABR parameters.
    pub fn params(&self) -> &SabrParams {
        &self.params
    }

    /// Hagan volatility at `strike`.
    pub fn volatility(&self, strike: f64) -> Result<f64, SmileError> {
        Ok(self
            .params
            .implied_vol(strike, self.forward, self.exercise_time)?)
    }
}
