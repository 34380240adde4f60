//! Rate and evolution time grids.

use super::error::CoterminalError;

/// Time grid of a forward-rate market model.
///
/// `rate_times` has one entry more than there are rates: rate `i` resets at
/// `rate_times[i]` and pays at `rate_times[i + 1]`. The model evolves from
/// one reset to the next, so the evolution times are the rate times without
/// the final one and every rate resets at the start of its own step.
///
/// # Example
///
/// ```
/// use volcube_optimiser::market_model::EvolutionDescription;
///
/// let evolution = EvolutionDescription::new(vec![0.5, 1.0, 1.5, 2.0]).unwrap();
/// assert_eq!(evolution.number_of_rates(), 3);
/// assert_eq!(evolution.evolution_times(), &[0.5, 1.0, 1.5]);
/// assert_eq!(evolution.step_start(0), 0.0);
/// assert_eq!(evolution.step_start(2), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionDescription {
    rate_times: Vec<f64>,
    evolution_times: Vec<f64>,
}

impl EvolutionDescription {
    /// Build from strictly increasing, non-negative rate times.
    ///
    /// # Errors
    ///
    /// `CoterminalError::InvalidInput` for fewer than two times, a negative
    /// first time or a grid that is not strictly increasing.
    pub fn new(rate_times: Vec<f64>) -> Result<Self, CoterminalError> {
        if rate_times.len() < 2 {
            return Err(CoterminalError::InvalidInput(format!(
                "need at least 2 rate times, got {}",
                rate_times.len()
            )));
        }
        if !(rate_times[0] >= 0.0) {
            return Err(CoterminalError::InvalidInput(format!(
                "first rate time {} must be non-negative",
                rate_times[0]
            )));
        }
        if rate_times.windows(2).any(|w| !(w[0] < w[1])) {
            return Err(CoterminalError::InvalidInput(
                "rate times must be strictly increasing".to_string(),
            ));
        }
        let evolution_times = rate_times[..rate_times.len() - 1].to_vec();
        Ok(Self {
            rate_times,
            evolution_times,
        })
    }

    /// Reset times plus the final payment time.
    pub fn rate_times(&self) -> &[f64] {
        &self.rate_times
    }

    /// Accrual fractions `rate_times[i+1] - rate_times[i]`.
    pub fn rate_taus(&self) -> Vec<f64> {
        self.rate_times.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// End time of every step.
    pub fn evolution_times(&self) -> &[f64] {
        &self.evolution_times
    }

    /// Number of forward rates.
    pub fn number_of_rates(&self) -> usize {
        self.rate_times.len() - 1
    }

    /// Number of evolution steps.
    pub fn number_of_steps(&self) -> usize {
        self.evolution_times.len()
    }

    /// Start time of `step`; the first step starts at zero.
    pub fn step_start(&self, step: usize) -> f64 {
        if step == 0 {
            0.0
        } else {
            self.evolution_times[step - 1]
        }
    }

    /// First rate still alive during `step`.
    pub fn first_alive_rate(&self, step: usize) -> usize {
        step
    }
}
