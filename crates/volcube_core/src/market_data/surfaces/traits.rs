//! ATM swaption volatility structure interface.

use crate::market_data::error::MarketDataError;
use crate::math::interpolators::{Extrapolation, Interpolator, LinearInterpolator};
use crate::types::{Date, DayCountConvention, Period};

/// ATM swaption volatilities indexed by option expiry and swap tenor.
///
/// Implementors supply the grid axes and a volatility lookup in numeric
/// coordinates; conversions between dates, tenors and numbers are provided.
/// Option times are year fractions from the reference date under the
/// structure's day count; swap lengths are tenors in years.
pub trait SwaptionVolatilityStructure {
    /// Valuation date.
    fn reference_date(&self) -> Date;

    /// Day count used for option times.
    fn day_count(&self) -> DayCountConvention;

    /// Quoted option tenors, increasing.
    fn option_tenors(&self) -> &[Period];

    /// Option expiry dates matching [`Self::option_tenors`].
    fn option_dates(&self) -> &[Date];

    /// Quoted swap tenors, increasing.
    fn swap_tenors(&self) -> &[Period];

    /// Black volatility at `(option_time, swap_length)` for `strike`.
    fn volatility(
        &self,
        option_time: f64,
        swap_length: f64,
        strike: f64,
    ) -> Result<f64, MarketDataError>;

    /// Year fraction from the reference date to `date`.
    fn option_time(&self, date: Date) -> f64 {
        self.day_count().year_fraction(self.reference_date(), date)
    }

    /// Length in years of a swap tenor.
    fn swap_length(&self, tenor: Period) -> f64 {
        tenor.years()
    }

    /// Expiry date of an option tenor.
    fn option_date_from_tenor(&self, tenor: Period) -> Result<Date, MarketDataError> {
        Ok(self.reference_date().advance(tenor)?)
    }

    /// Date whose option time is `option_time`.
    ///
    /// Interpolates linearly between the structure's (option time, date
    /// serial) pairs, extending the end segments, and rounds to the
    /// nearest day.
    fn option_date_from_time(&self, option_time: f64) -> Result<Date, MarketDataError> {
        let dates = self.option_dates();
        let times: Vec<f64> = dates.iter().map(|d| self.option_time(*d)).collect();
        let serials: Vec<f64> = dates.iter().map(|d| d.serial() as f64).collect();
        let serial = LinearInterpolator::new(&times, &serials)?
            .with_extrapolation(Extrapolation::Linear)
            .interpolate(option_time)?;
        Ok(Date::from_serial(serial.round() as i64)?)
    }

    /// Tenor of a swap length, rounded to whole months.
    fn swap_tenor_from_length(&self, swap_length: f64) -> Period {
        Period::from_months((swap_length * 12.0).round() as i32)
    }

    /// Black volatility for an option date and swap tenor.
    fn volatility_for(
        &self,
        option_date: Date,
        swap_tenor: Period,
        strike: f64,
    ) -> Result<f64, MarketDataError> {
        self.volatility(
            self.option_time(option_date),
            self.swap_length(swap_tenor),
            strike,
        )
    }
}
