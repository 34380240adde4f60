//! Forward-rate curve states.

use super::error::CoterminalError;

/// Snapshot of the forward curve on a rate-time grid.
///
/// Annuities and discount ratios are expressed in units of the zero bond
/// paying at the last rate time unless a numeraire is given.
pub trait CurveState {
    /// Reset times plus the final payment time.
    fn rate_times(&self) -> &[f64];

    /// Accrual fractions between consecutive rate times.
    fn rate_taus(&self) -> &[f64];

    /// Simple forward rates, one per accrual period.
    fn forward_rates(&self) -> &[f64];

    /// Par rates of the swaps from each rate time to the last.
    fn coterminal_swap_rates(&self) -> &[f64];

    /// `P(t_i) / P(t_j)`.
    fn discount_ratio(&self, i: usize, j: usize) -> f64;

    /// Annuity of coterminal swap `i` in units of the bond maturing at
    /// `rate_times[numeraire]`.
    fn coterminal_swap_annuity(&self, numeraire: usize, i: usize) -> f64;

    /// Number of forward rates.
    fn number_of_rates(&self) -> usize {
        self.forward_rates().len()
    }
}

/// Curve state of a forward-rate market model.
///
/// # Example
///
/// ```
/// use volcube_optimiser::market_model::{CurveState, LmmCurveState};
///
/// let state = LmmCurveState::new(vec![1.0, 2.0, 3.0], vec![0.03, 0.03]).unwrap();
/// // flat forwards give flat coterminal swap rates
/// assert!((state.coterminal_swap_rates()[0] - 0.03).abs() < 1e-15);
/// assert!((state.discount_ratio(0, 2) - 1.03 * 1.03).abs() < 1e-15);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LmmCurveState {
    rate_times: Vec<f64>,
    rate_taus: Vec<f64>,
    forward_rates: Vec<f64>,
    discount_ratios: Vec<f64>,
    coterminal_annuities: Vec<f64>,
    coterminal_swap_rates: Vec<f64>,
}

impl LmmCurveState {
    /// Build from rate times (one more than forwards) and forward rates.
    ///
    /// # Errors
    ///
    /// * `CoterminalError::SizeMismatch` - forwards not one fewer than times
    /// * `CoterminalError::InvalidInput` - times not strictly increasing, or
    ///   a forward with `1 + τf ≤ 0`
    pub fn new(rate_times: Vec<f64>, forward_rates: Vec<f64>) -> Result<Self, CoterminalError> {
        if rate_times.len() < 2 {
            return Err(CoterminalError::InvalidInput(format!(
                "need at least 2 rate times, got {}",
                rate_times.len()
            )));
        }
        if forward_rates.len() + 1 != rate_times.len() {
            return Err(CoterminalError::SizeMismatch {
                what: "forward rates",
                expected: rate_times.len() - 1,
                got: forward_rates.len(),
            });
        }
        if rate_times.windows(2).any(|w| !(w[0] < w[1])) {
            return Err(CoterminalError::InvalidInput(
                "rate times must be strictly increasing".to_string(),
            ));
        }
        let rate_taus: Vec<f64> = rate_times.windows(2).map(|w| w[1] - w[0]).collect();
        if let Some(i) = (0..forward_rates.len()).find(|&i| !(1.0 + rate_taus[i] * forward_rates[i] > 0.0)) {
            return Err(CoterminalError::InvalidInput(format!(
                "forward rate {} at index {i} gives a non-positive growth factor",
                forward_rates[i]
            )));
        }

        let n = forward_rates.len();
        let mut discount_ratios = vec![1.0; n + 1];
        for i in (0..n).rev() {
            discount_ratios[i] = discount_ratios[i + 1] * (1.0 + rate_taus[i] * forward_rates[i]);
        }
        let mut coterminal_annuities = vec![0.0; n];
        let mut running = 0.0;
        for i in (0..n).rev() {
            running += rate_taus[i] * discount_ratios[i + 1];
            coterminal_annuities[i] = running;
        }
        let coterminal_swap_rates = (0..n)
            .map(|i| (discount_ratios[i] - discount_ratios[n]) / coterminal_annuities[i])
            .collect();

        Ok(Self {
            rate_times,
            rate_taus,
            forward_rates,
            discount_ratios,
            coterminal_annuities,
            coterminal_swap_rates,
        })
    }
}

impl CurveState for LmmCurveState {
    fn rate_times(&self) -> &[f64] {
        &self.rate_times
    }

    fn rate_taus(&self) -> &[f64] {
        &self.rate_taus
    }

    fn forward_rates(&self) -> &[f64] {
        &self.forward_rates
    }

    fn coterminal_swap_rates(&self) -> &[f64] {
        &self.coterminal_swap_rates
    }

    fn discount_ratio(&self, i: usize, j: usize) -> f64 {
        self.discount_ratios[i] / self.discount_ratios[j]
    }

    fn coterminal_swap_annuity(&self, numeraire: usize, i: usize) -> f64 {
        self.coterminal_annuities[i] / self.discount_ratios[numeraire]
    }
}
