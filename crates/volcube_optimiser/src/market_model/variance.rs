//! Piecewise-constant variance term structures.

use super::error::CoterminalError;
use super::evolution::EvolutionDescription;

/// Variance of one rate accumulated over each evolution step.
///
/// `variances()[k]` is the variance the rate picks up during step `k`;
/// steps after the rate's reset contribute zero.
pub trait PiecewiseConstantVariance {
    /// Variance per evolution step.
    fn variances(&self) -> &[f64];

    /// Rate times of the underlying evolution.
    fn rate_times(&self) -> &[f64];

    /// Variance accumulated up to and including `step`.
    fn total_variance(&self, step: usize) -> f64 {
        self.variances().iter().take(step + 1).sum()
    }

    /// Average volatility per step, zero for empty steps.
    fn volatilities(&self) -> Vec<f64> {
        let times = self.rate_times();
        self.variances()
            .iter()
            .enumerate()
            .map(|(k, &var)| {
                let start = if k == 0 { 0.0 } else { times[k - 1] };
                let dt = times[k] - start;
                if dt > 0.0 {
                    (var / dt).sqrt()
                } else {
                    0.0
                }
            })
            .collect()
    }
}

impl<T: PiecewiseConstantVariance + ?Sized> PiecewiseConstantVariance for Box<T> {
    fn variances(&self) -> &[f64] {
        (**self).variances()
    }

    fn rate_times(&self) -> &[f64] {
        (**self).rate_times()
    }
}

fn check_reset(evolution: &EvolutionDescription, reset_index: usize) -> Result<(), CoterminalError> {
    let n = evolution.number_of_rates();
    if reset_index >= n {
        return Err(CoterminalError::InvalidInput(format!(
            "reset index {reset_index} out of range for {n} rates"
        )));
    }
    Ok(())
}

/// Constant volatility until the rate resets.
///
/// # Example
///
/// ```
/// use volcube_optimiser::market_model::{
///     EvolutionDescription, FlatVolatilityVariance, PiecewiseConstantVariance,
/// };
///
/// let evolution = EvolutionDescription::new(vec![1.0, 2.0, 3.0]).unwrap();
/// let var = FlatVolatilityVariance::new(0.2, &evolution, 1).unwrap();
/// assert_eq!(var.variances().len(), 2);
/// assert!((var.total_variance(1) - 0.04 * 2.0).abs() < 1e-15);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FlatVolatilityVariance {
    variances: Vec<f64>,
    rate_times: Vec<f64>,
}

impl FlatVolatilityVariance {
    /// Volatility `vol` for the rate resetting at `rate_times[reset_index]`.
    ///
    /// # Errors
    ///
    /// `CoterminalError::InvalidInput` for a negative volatility or a reset
    /// index outside the rates.
    pub fn new(vol: f64, evolution: &EvolutionDescription, reset_index: usize) -> Result<Self, CoterminalError> {
        if !(vol >= 0.0) {
            return Err(CoterminalError::InvalidInput(format!(
                "volatility {vol} must be non-negative"
            )));
        }
        check_reset(evolution, reset_index)?;
        let variances = (0..evolution.number_of_steps())
            .map(|k| {
                if k <= reset_index {
                    let dt = evolution.evolution_times()[k] - evolution.step_start(k);
                    vol * vol * dt
                } else {
                    0.0
                }
            })
            .collect();
        Ok(Self {
            variances,
            rate_times: evolution.rate_times().to_vec(),
        })
    }
}

impl PiecewiseConstantVariance for FlatVolatilityVariance {
    fn variances(&self) -> &[f64] {
        &self.variances
    }

    fn rate_times(&self) -> &[f64] {
        &self.rate_times
    }
}

/// Parameters of the abcd instantaneous volatility
/// `σ(τ) = (a + bτ)·e^(−cτ) + d`, `τ` the time to reset.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Abcd {
    /// Short-end level minus `d`.
    pub a: f64,
    /// Hump slope.
    pub b: f64,
    /// Decay speed.
    pub c: f64,
    /// Long-end level.
    pub d: f64,
}

impl Abcd {
    /// `σ(τ)`.
    pub fn volatility(&self, tau: f64) -> f64 {
        (self.a + self.b * tau) * (-self.c * tau).exp() + self.d
    }

    /// `∫ σ(τ)² dτ` up to a constant.
    fn primitive(&self, tau: f64) -> f64 {
        let Abcd { a, b, c, d } = *self;
        let p = a + b * tau;
        if c == 0.0 {
            return a * a * tau + a * b * tau * tau + b * b * tau.powi(3) / 3.0
                + 2.0 * d * (a * tau + 0.5 * b * tau * tau)
                + d * d * tau;
        }
        let k = 2.0 * c;
        let squared = -(-k * tau).exp() * (p * p / k + 2.0 * b * p / (k * k) + 2.0 * b * b / k.powi(3));
        let cross = -2.0 * d * (-c * tau).exp() * (p / c + b / (c * c));
        squared + cross + d * d * tau
    }

    /// `∫ σ(T − t)² dt` over `[start, end]` for a rate resetting at `reset`.
    pub fn variance(&self, start: f64, end: f64, reset: f64) -> f64 {
        self.primitive(reset - start) - self.primitive(reset - end)
    }
}

/// Abcd volatility integrated over each step before the reset.
///
/// # Example
///
/// ```
/// use volcube_optimiser::market_model::{
///     Abcd, AbcdVariance, EvolutionDescription, PiecewiseConstantVariance,
/// };
///
/// let evolution = EvolutionDescription::new(vec![1.0, 2.0, 3.0]).unwrap();
/// let flat = Abcd { a: 0.0, b: 0.0, c: 0.5, d: 0.2 };
/// let var = AbcdVariance::new(flat, &evolution, 1).unwrap();
/// assert!((var.variances()[1] - 0.04).abs() < 1e-14);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AbcdVariance {
    abcd: Abcd,
    variances: Vec<f64>,
    rate_times: Vec<f64>,
}

impl AbcdVariance {
    /// Abcd volatility for the rate resetting at `rate_times[reset_index]`.
    ///
    /// # Errors
    ///
    /// `CoterminalError::InvalidInput` when `a + d` or `d` is negative, `c`
    /// is negative, or the reset index is outside the rates.
    pub fn new(abcd: Abcd, evolution: &EvolutionDescription, reset_index: usize) -> Result<Self, CoterminalError> {
        if !(abcd.a + abcd.d >= 0.0) || !(abcd.d >= 0.0) || !(abcd.c >= 0.0) {
            return Err(CoterminalError::InvalidInput(format!(
                "abcd parameters {abcd:?} need a + d >= 0, c >= 0, d >= 0"
            )));
        }
        check_reset(evolution, reset_index)?;
        let reset = evolution.rate_times()[reset_index];
        let variances = (0..evolution.number_of_steps())
            .map(|k| {
                if k <= reset_index {
                    abcd.variance(evolution.step_start(k), evolution.evolution_times()[k], reset)
                } else {
                    0.0
                }
            })
            .collect();
        Ok(Self {
            abcd,
            variances,
            rate_times: evolution.rate_times().to_vec(),
        })
    }

    /// Volatility parameters.
    pub fn abcd(&self) -> Abcd {
        self.abcd
    }
}

impl PiecewiseConstantVariance for AbcdVariance {
    fn variances(&self) -> &[f64] {
        &self.variances
    }

    fn rate_times(&self) -> &[f64] {
        &self.rate_times
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn evolution() -> EvolutionDescription {
        EvolutionDescription::new(vec![0.5, 1.0, 2.0, 3.0]).unwrap()
    }

    fn simpson(f: impl Fn(f64) -> f64, a: f64, b: f64) -> f64 {
        let n = 2000;
        let h = (b - a) / n as f64;
        let inner: f64 = (1..n)
            .map(|i| {
                let w = if i % 2 == 1 { 4.0 } else { 2.0 };
                w * f(a + i as f64 * h)
            })
            .sum();
        (f(a) + inner + f(b)) * h / 3.0
    }

    #[test]
    fn test_flat_variance_stops_at_reset() {
        let var = FlatVolatilityVariance::new(0.1, &evolution(), 1).unwrap();
        assert_relative_eq!(var.variances()[0], 0.01 * 0.5, epsilon = 1e-16);
        assert_relative_eq!(var.variances()[1], 0.01 * 0.5, epsilon = 1e-16);
        assert_eq!(var.variances()[2], 0.0);
        let vols = var.volatilities();
        assert_relative_eq!(vols[1], 0.1, epsilon = 1e-15);
    }

    #[test]
    fn test_abcd_matches_numerical_integral() {
        let abcd = Abcd {
            a: -0.02,
            b: 0.3,
            c: 1.2,
            d: 0.15,
        };
        let reset = 2.0;
        let numeric = simpson(|t| abcd.volatility(reset - t).powi(2), 0.5, 1.0);
        assert_relative_eq!(abcd.variance(0.5, 1.0, reset), numeric, epsilon = 1e-12);
    }

    #[test]
    fn test_abcd_without_decay() {
        let abcd = Abcd {
            a: 0.05,
            b: 0.02,
            c: 0.0,
            d: 0.1,
        };
        let numeric = simpson(|t| abcd.volatility(3.0 - t).powi(2), 1.0, 2.0);
        assert_relative_eq!(abcd.variance(1.0, 2.0, 3.0), numeric, epsilon = 1e-12);
    }

    #[test]
    fn test_abcd_variance_steps() {
        let abcd = Abcd {
            a: 0.0,
            b: 0.0,
            c: 1.0,
            d: 0.2,
        };
        let var = AbcdVariance::new(abcd, &evolution(), 2).unwrap();
        assert_relative_eq!(var.total_variance(2), 0.04 * 2.0, epsilon = 1e-14);
        assert!(AbcdVariance::new(abcd, &evolution(), 3).is_err());
    }

    #[test]
    fn test_boxed_variances() {
        let boxed: Vec<Box<dyn PiecewiseConstantVariance>> = vec![
            Box::new(FlatVolatilityVariance::new(0.2, &evolution(), 0).unwrap()),
            Box::new(FlatVolatilityVariance::new(0.2, &evolution(), 2).unwrap()),
        ];
        assert_relative_eq!(boxed[1].total_variance(2), 0.04 * 2.0, epsilon = 1e-15);
    }
}
