//! Constant-rate discounting, the curve behind demo and test cubes.

use super::YieldCurve;
use crate::market_data::error::MarketDataError;
use num_traits::Float;

/// Discounts every horizon at one continuously compounded rate, so forward
/// swap rates off it depend only on the swap schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlatCurve<T: Float> {
    rate: T,
}

impl<T: Float> FlatCurve<T> {
    /// Negative rates are allowed.
    #[inline]
    pub fn new(rate: T) -> Self {
        Self { rate }
    }

    /// Continuously compounded rate.
    #[inline]
    pub fn rate(&self) -> T {
        self.rate
    }
}

impl<T: Float> YieldCurve<T> for FlatCurve<T> {
    fn discount_factor(&self, t: T) -> Result<T, MarketDataError> {
        match t.to_f64() {
            Some(years) if years < 0.0 => Err(MarketDataError::InvalidMaturity { t: years }),
            _ => Ok((-self.rate * t).exp()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_discounting_past_horizon_rejected() {
        let curve = FlatCurve::new(0.03_f64);
        assert_eq!(curve.discount_factor(0.0).unwrap(), 1.0);
        assert_relative_eq!(curve.discount_factor(2.0).unwrap(), (-0.06_f64).exp(), epsilon = 1e-15);
        assert!(matches!(
            curve.discount_factor(-0.25),
            Err(MarketDataError::InvalidMaturity { t }) if t == -0.25
        ));
    }

    #[test]
    fn test_negative_rate_curve_is_flat() {
        let curve = FlatCurve::new(-0.005_f64);
        assert_relative_eq!(curve.zero_rate(3.0).unwrap(), -0.005, epsilon = 1e-15);
        assert_relative_eq!(curve.forward_rate(1.0, 4.0).unwrap(), -0.005, epsilon = 1e-15);
        assert!(curve.discount_factor(10.0).unwrap() > 1.0);
    }
}
