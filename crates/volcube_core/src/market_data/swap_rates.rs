//! Forward swap rates for cube nodes.

use super::curves::YieldCurve;
use super::error::MarketDataError;
use crate::types::{Date, DayCountConvention, Period, TimeUnit};

/// Source of ATM forward swap rates.
pub trait SwapRateProvider {
    /// Forward par rate of the swap starting at `option_date` with tenor `swap_tenor`.
    fn atm_forward(&self, option_date: Date, swap_tenor: Period) -> Result<f64, MarketDataError>;
}

/// Par swap rates off a single yield curve.
///
/// The fixed leg pays every `fixed_frequency` from the option date; the
/// floating leg is valued at par, so
///
/// ```text
/// S = (P(t_0) - P(t_n)) / Σ τ_k P(t_k)
/// ```
///
/// with accruals `τ_k` under `fixed_day_count` and discount times under
/// `time_day_count` from the reference date.
///
/// ```
/// use volcube_core::market_data::{CurveSwapRateProvider, FlatCurve, SwapRateProvider};
/// use volcube_core::types::{Date, DayCountConvention};
///
/// let provider = CurveSwapRateProvider::new(
///     FlatCurve::new(0.03),
///     Date::from_ymd(2024, 1, 15).unwrap(),
///     DayCountConvention::Act365Fixed,
/// );
/// let expiry = Date::from_ymd(2025, 1, 15).unwrap();
/// let rate = provider.atm_forward(expiry, "5Y".parse().unwrap()).unwrap();
/// assert!((rate - 0.0305).abs() < 5e-4);
/// ```
#[derive(Debug, Clone)]
pub struct CurveSwapRateProvider<C: YieldCurve<f64>> {
    curve: C,
    reference_date: Date,
    time_day_count: DayCountConvention,
    fixed_day_count: DayCountConvention,
    fixed_frequency: Period,
}

impl<C: YieldCurve<f64>> CurveSwapRateProvider<C> {
    /// Annual 30/360 fixed leg, discount times under `time_day_count`.
    pub fn new(curve: C, reference_date: Date, time_day_count: DayCountConvention) -> Self {
        Self {
            curve,
            reference_date,
            time_day_count,
            fixed_day_count: DayCountConvention::Thirty360,
            fixed_frequency: Period::new(1, TimeUnit::Years),
        }
    }

    /// Overrides the fixed-leg payment frequency.
    pub fn with_fixed_frequency(mut self, frequency: Period) -> Self {
        self.fixed_frequency = frequency;
        self
    }

    /// Overrides the fixed-leg accrual convention.
    pub fn with_fixed_day_count(mut self, day_count: DayCountConvention) -> Self {
        self.fixed_day_count = day_count;
        self
    }

    /// The discount curve.
    pub fn curve(&self) -> &C {
        &self.curve
    }

    /// Fixed-leg annuity `Σ τ_k P(t_k)` of the swap.
    pub fn annuity(&self, start: Date, swap_tenor: Period) -> Result<f64, MarketDataError> {
        let dates = self.fixed_schedule(start, swap_tenor)?;
        dates.windows(2).try_fold(0.0, |acc, w| {
            let tau = self.fixed_day_count.year_fraction(w[0], w[1]);
            Ok(acc + tau * self.discount(w[1])?)
        })
    }

    fn discount(&self, date: Date) -> Result<f64, MarketDataError> {
        let t = self.time_day_count.year_fraction(self.reference_date, date);
        self.curve.discount_factor(t)
    }

    fn fixed_schedule(&self, start: Date, swap_tenor: Period) -> Result<Vec<Date>, MarketDataError> {
        let (tenor_months, step_months) = match (swap_tenor.months(), self.fixed_frequency.months()) {
            (Some(t), Some(s)) if t > 0 && s > 0 && t % s == 0 => (t, s),
            _ => {
                return Err(MarketDataError::InvalidInput(format!(
                    "swap tenor {} is not a positive multiple of the fixed frequency {}",
                    swap_tenor, self.fixed_frequency
                )))
            }
        };
        (0..=tenor_months / step_months)
            .map(|k| Ok(start.advance(Period::new(k * step_months, TimeUnit::Months))?))
            .collect()
    }
}

impl<C: YieldCurve<f64>> SwapRateProvider for CurveSwapRateProvider<C> {
    fn atm_forward(&self, option_date: Date, swap_tenor: Period) -> Result<f64, MarketDataError> {
        if option_date < self.reference_date {
            return Err(MarketDataError::InvalidMaturity {
                t: self.time_day_count.year_fraction(self.reference_date, option_date),
            });
        }
        let dates = self.fixed_schedule(option_date, swap_tenor)?;
        let annuity = self.annuity(option_date, swap_tenor)?;
        let first = self.discount(dates[0])?;
        let last = self.discount(dates[dates.len() - 1])?;
        Ok((first - last) / annuity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::FlatCurve;
    use approx::assert_relative_eq;

    fn provider(rate: f64) -> CurveSwapRateProvider<FlatCurve<f64>> {
        CurveSwapRateProvider::new(
            FlatCurve::new(rate),
            Date::from_ymd(2024, 1, 15).unwrap(),
            DayCountConvention::Act365Fixed,
        )
    }

    #[test]
    fn test_single_period_swap_is_simple_forward() {
        let p = provider(0.02).with_fixed_day_count(DayCountConvention::Act365Fixed);
        let start = Date::from_ymd(2025, 1, 15).unwrap();
        let end = Date::from_ymd(2026, 1, 15).unwrap();
        let tau = DayCountConvention::Act365Fixed.year_fraction(start, end);
        let rate = p.atm_forward(start, "1Y".parse().unwrap()).unwrap();
        // (P1/P2 - 1) / tau with a flat curve
        assert_relative_eq!(rate, ((0.02 * tau).exp() - 1.0) / tau, epsilon = 1e-14);
    }

    #[test]
    fn test_semi_annual_schedule() {
        let p = provider(0.03).with_fixed_frequency("6M".parse().unwrap());
        let start = Date::from_ymd(2025, 1, 15).unwrap();
        let annual = provider(0.03).annuity(start, "2Y".parse().unwrap()).unwrap();
        let semi = p.annuity(start, "2Y".parse().unwrap()).unwrap();
        // same total accrual, earlier payments discount less
        assert!(semi > annual);
        assert_relative_eq!(semi, annual, max_relative = 0.01);
    }

    #[test]
    fn test_rejects_incompatible_tenor() {
        let p = provider(0.03);
        let start = Date::from_ymd(2025, 1, 15).unwrap();
        let result = p.atm_forward(start, "18M".parse().unwrap());
        assert!(matches!(result, Err(MarketDataError::InvalidInput(_))));
        assert!(p.atm_forward(start, "10D".parse().unwrap()).is_err());
    }

    #[test]
    fn test_rejects_past_option_date() {
        let p = provider(0.03);
        let past = Date::from_ymd(2023, 1, 15).unwrap();
        assert!(matches!(
            p.atm_forward(past, "1Y".parse().unwrap()),
            Err(MarketDataError::InvalidMaturity { .. })
        ));
    }
}
