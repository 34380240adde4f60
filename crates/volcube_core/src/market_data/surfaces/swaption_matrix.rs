//! Matrix of ATM swaption volatilities.

use super::SwaptionVolatilityStructure;
use crate::market_data::error::MarketDataError;
use crate::math::interpolators::BilinearInterpolator;
use crate::types::{Date, DayCountConvention, Period};

/// ATM swaption volatilities on an (option tenor × swap tenor) grid.
///
/// Values between nodes are bilinear in (option time, swap length); with
/// extrapolation enabled the edge cells are extended linearly. The strike
/// argument of [`SwaptionVolatilityStructure::volatility`] is ignored.
///
/// # Example
///
/// ```
/// use volcube_core::market_data::{SwaptionVolatilityMatrix, SwaptionVolatilityStructure};
/// use volcube_core::types::{Date, DayCountConvention, Period};
///
/// let tenors = |s: &[&str]| -> Vec<Period> { s.iter().map(|t| t.parse().unwrap()).collect() };
/// let matrix = SwaptionVolatilityMatrix::new(
///     Date::from_ymd(2024, 1, 15).unwrap(),
///     DayCountConvention::Act365Fixed,
///     tenors(&["1Y", "5Y"]),
///     tenors(&["2Y", "10Y"]),
///     vec![vec![0.20, 0.18], vec![0.17, 0.15]],
///     true,
/// )
/// .unwrap();
///
/// let t = matrix.option_time(matrix.option_dates()[0]);
/// assert!((matrix.volatility(t, 2.0, 0.03).unwrap() - 0.20).abs() < 1e-15);
/// ```
#[derive(Debug, Clone)]
pub struct SwaptionVolatilityMatrix {
    reference_date: Date,
    day_count: DayCountConvention,
    option_tenors: Vec<Period>,
    option_dates: Vec<Date>,
    swap_tenors: Vec<Period>,
    vols: Vec<Vec<f64>>,
    interpolator: BilinearInterpolator<f64>,
}

impl SwaptionVolatilityMatrix {
    /// Build the matrix; `vols[i][j]` is the ATM vol for option tenor `i`
    /// and swap tenor `j`.
    ///
    /// # Errors
    ///
    /// * `MarketDataError::InsufficientData` - fewer than two tenors on an axis
    /// * `MarketDataError::InvalidVolatility` - a non-positive volatility
    /// * `MarketDataError::Interpolation` - dimension mismatch or tenors not increasing
    pub fn new(
        reference_date: Date,
        day_count: DayCountConvention,
        option_tenors: Vec<Period>,
        swap_tenors: Vec<Period>,
        vols: Vec<Vec<f64>>,
        allow_extrapolation: bool,
    ) -> Result<Self, MarketDataError> {
        for axis in [&option_tenors, &swap_tenors] {
            if axis.len() < 2 {
                return Err(MarketDataError::InsufficientData {
                    got: axis.len(),
                    need: 2,
                });
            }
        }

        let option_dates = option_tenors
            .iter()
            .map(|p| reference_date.advance(*p))
            .collect::<Result<Vec<_>, _>>()?;
        let option_times: Vec<f64> = option_dates
            .iter()
            .map(|d| day_count.year_fraction(reference_date, *d))
            .collect();
        let swap_lengths: Vec<f64> = swap_tenors.iter().map(|p| p.years()).collect();

        for (i, row) in vols.iter().enumerate() {
            for (j, &vol) in row.iter().enumerate() {
                if !(vol > 0.0) {
                    return Err(MarketDataError::InvalidVolatility {
                        vol,
                        option_time: option_times.get(i).copied().unwrap_or(f64::NAN),
                        swap_length: swap_lengths.get(j).copied().unwrap_or(f64::NAN),
                    });
                }
            }
        }

        let interpolator =
            BilinearInterpolator::from_rows(&option_times, &swap_lengths, vols.clone())?
                .with_extrapolation(allow_extrapolation);

        Ok(Self {
            reference_date,
            day_count,
            option_tenors,
            option_dates,
            swap_tenors,
            vols,
            interpolator,
        })
    }

    /// Quoted volatilities, rows by option tenor.
    pub fn vols(&self) -> &[Vec<f64>] {
        &self.vols
    }

    /// Option times of the rows.
    pub fn option_times(&self) -> &[f64] {
        self.interpolator.xs()
    }

    /// Swap lengths of the columns.
    pub fn swap_lengths(&self) -> &[f64] {
        self.interpolator.ys()
    }
}

impl SwaptionVolatilityStructure for SwaptionVolatilityMatrix {
    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn day_count(&self) -> DayCountConvention {
        self.day_count
    }

    fn option_tenors(&self) -> &[Period] {
        &self.option_tenors
    }

    fn option_dates(&self) -> &[Date] {
        &self.option_dates
    }

    fn swap_tenors(&self) -> &[Period] {
        &self.swap_tenors
    }

    fn volatility(
        &self,
        option_time: f64,
        swap_length: f64,
        _strike: f64,
    ) -> Result<f64, MarketDataError> {
        let vol = self.interpolator.interpolate(option_time, swap_length)?;
        if !(vol > 0.0) {
            return Err(MarketDataError::InvalidVolatility {
                vol,
                option_time,
                swap_length,
            });
        }
        Ok(vol)
    }
}
