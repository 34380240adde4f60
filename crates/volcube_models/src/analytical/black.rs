//! Black (lognormal forward) option formula.
//!
//! Prices a European option on a forward `F` with total standard deviation
//! `σ√T`:
//!
//! ```text
//! d1 = ln(F/K)/s + s/2,  d2 = d1 - s
//! Call = D · (F·N(d1) - K·N(d2))
//! Put  = D · (K·N(-d2) - F·N(-d1))
//! ```

use super::distributions::{norm_cdf, norm_pdf};
use super::error::AnalyticalError;

/// Option side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OptionType {
    /// Right to receive the underlying at the strike.
    Call,
    /// Right to deliver the underlying at the strike.
    Put,
}

impl OptionType {
    /// `+1` for calls, `-1` for puts.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }
}

fn validate(
    strike: f64,
    forward: f64,
    std_dev: f64,
    discount: f64,
) -> Result<(), AnalyticalError> {
    if !(forward > 0.0) {
        return Err(AnalyticalError::InvalidForward { forward });
    }
    if !(strike >= 0.0) {
        return Err(AnalyticalError::InvalidStrike { strike });
    }
    if !(std_dev >= 0.0) {
        return Err(AnalyticalError::InvalidStdDev { std_dev });
    }
    if !(discount > 0.0) {
        return Err(AnalyticalError::InvalidDiscount { discount });
    }
    Ok(())
}

/// Black price of a European option.
///
/// A zero standard deviation or a zero strike returns the discounted
/// intrinsic value.
///
/// # Examples
///
/// ```
/// use volcube_models::analytical::{black_formula, OptionType};
///
/// let call = black_formula(OptionType::Call, 0.03, 0.03, 0.2, 1.0).unwrap();
/// let put = black_formula(OptionType::Put, 0.03, 0.03, 0.2, 1.0).unwrap();
/// assert!((call - put).abs() < 1e-15);
/// ```
///
/// # Errors
///
/// Returns an [`AnalyticalError`] when the forward or discount is not
/// positive, or the strike or standard deviation is negative.
pub fn black_formula(
    option_type: OptionType,
    strike: f64,
    forward: f64,
    std_dev: f64,
    discount: f64,
) -> Result<f64, AnalyticalError> {
    validate(strike, forward, std_dev, discount)?;

    let w = option_type.sign();
    if std_dev == 0.0 || strike == 0.0 {
        return Ok(discount * (w * (forward - strike)).max(0.0));
    }

    let d1 = (forward / strike).ln() / std_dev + 0.5 * std_dev;
    let d2 = d1 - std_dev;
    let value = w * (forward * norm_cdf(w * d1) - strike * norm_cdf(w * d2));
    Ok(discount * value.max(0.0))
}

/// Sensitivity of the Black price to the volatility `σ`, for an option
/// expiring at `expiry` with total standard deviation `std_dev`.
///
/// Identical for calls and puts: `D · F · φ(d1) · √T`.
///
/// # Errors
///
/// Same conditions as [`black_formula`].
pub fn black_vega(
    strike: f64,
    forward: f64,
    std_dev: f64,
    expiry: f64,
    discount: f64,
) -> Result<f64, AnalyticalError> {
    validate(strike, forward, std_dev, discount)?;
    if std_dev == 0.0 || strike == 0.0 || expiry <= 0.0 {
        return Ok(0.0);
    }
    let d1 = (forward / strike).ln() / std_dev + 0.5 * std_dev;
    Ok(discount * forward * norm_pdf(d1) * expiry.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    // ========================================
    // Price Tests
    // ========================================

    #[test]
    fn test_atm_call_approximation() {
        // ATM: C ≈ D·F·s/√(2π) for small s
        let s = 0.01;
        let call = black_formula(OptionType::Call, 0.05, 0.05, s, 1.0).unwrap();
        assert_relative_eq!(call, 0.05 * s * 0.3989422804014327, max_relative = 1e-3);
    }

    #[test]
    fn test_intrinsic_at_zero_std_dev() {
        let call = black_formula(OptionType::Call, 0.02, 0.03, 0.0, 0.9).unwrap();
        assert_relative_eq!(call, 0.9 * 0.01, epsilon = 1e-16);
        let put = black_formula(OptionType::Put, 0.02, 0.03, 0.0, 0.9).unwrap();
        assert_eq!(put, 0.0);
    }

    #[test]
    fn test_zero_strike() {
        let call = black_formula(OptionType::Call, 0.0, 0.03, 0.3, 1.0).unwrap();
        assert_relative_eq!(call, 0.03, epsilon = 1e-16);
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(
            black_formula(OptionType::Call, 0.03, 0.0, 0.2, 1.0),
            Err(AnalyticalError::InvalidForward { forward: 0.0 })
        );
        assert_eq!(
            black_formula(OptionType::Call, -0.01, 0.03, 0.2, 1.0),
            Err(AnalyticalError::InvalidStrike { strike: -0.01 })
        );
        assert_eq!(
            black_formula(OptionType::Put, 0.03, 0.03, -0.2, 1.0),
            Err(AnalyticalError::InvalidStdDev { std_dev: -0.2 })
        );
        assert!(black_vega(0.03, 0.03, 0.2, 1.0, 0.0).is_err());
    }

    // ========================================
    // Vega Tests
    // ========================================

    #[test]
    fn test_vega_matches_finite_difference() {
        let (k, f, vol, t, d) = (0.035, 0.03, 0.25, 2.0_f64, 0.95);
        let h = 1e-6;
        let up = black_formula(OptionType::Call, k, f, (vol + h) * t.sqrt(), d).unwrap();
        let dn = black_formula(OptionType::Call, k, f, (vol - h) * t.sqrt(), d).unwrap();
        let vega = black_vega(k, f, vol * t.sqrt(), t, d).unwrap();
        assert_relative_eq!(vega, (up - dn) / (2.0 * h), max_relative = 1e-4);
    }

    proptest! {
        #[test]
        fn prop_put_call_parity(
            k in 0.005..0.1_f64,
            f in 0.005..0.1_f64,
            s in 0.01..1.0_f64,
            d in 0.5..1.0_f64,
        ) {
            let call = black_formula(OptionType::Call, k, f, s, d).unwrap();
            let put = black_formula(OptionType::Put, k, f, s, d).unwrap();
            prop_assert!((call - put - d * (f - k)).abs() < 1e-6 * f.max(k));
        }

        #[test]
        fn prop_price_increases_with_std_dev(k in 0.01..0.06_f64, s in 0.05..0.8_f64) {
            let lo = black_formula(OptionType::Call, k, 0.03, s, 1.0).unwrap();
            let hi = black_formula(OptionType::Call, k, 0.03, s + 0.05, 1.0).unwrap();
            prop_assert!(hi >= lo);
        }
    }
}
