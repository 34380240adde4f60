//! Vol-spread cube: ATM volatility plus interpolated spreads.

use super::error::CubeError;
use super::grid::GridCube;
use super::quotes::VolSpreadQuotes;
use tracing::debug;
use volcube_core::market_data::{EpochSnapshot, SwapRateProvider, SwaptionVolatilityStructure};
use volcube_models::smile::SmileSection;

/// Swaption cube built directly from vol-spread quotes.
///
/// The smile at `(t, l)` has one strike per quoted spread, `F + spread`,
/// with volatility `σ_ATM(t, l) + Δσ(t, l, spread)`; `Δσ` is bilinear in
/// the market grid. Strikes at or below zero are dropped. Between strikes
/// the smile is linear in standard deviation.
///
/// # Example
///
/// ```
/// use volcube_core::market_data::{CurveSwapRateProvider, FlatCurve, SwaptionVolatilityMatrix};
/// use volcube_core::types::{Date, DayCountConvention, Period};
/// use volcube_optimiser::cube::{SpreadVolCube, VolSpreadQuotes};
///
/// let reference = Date::from_ymd(2024, 1, 15).unwrap();
/// let tenors = |s: &[&str]| s.iter().map(|t| t.parse().unwrap()).collect::<Vec<Period>>();
/// let atm = SwaptionVolatilityMatrix::new(
///     reference,
///     DayCountConvention::Act365Fixed,
///     tenors(&["1Y", "5Y"]),
///     tenors(&["2Y", "10Y"]),
///     vec![vec![0.25, 0.22], vec![0.20, 0.18]],
///     true,
/// )
/// .unwrap();
/// let swap_rates =
///     CurveSwapRateProvider::new(FlatCurve::new(0.03), reference, DayCountConvention::Act365Fixed);
/// let quotes = VolSpreadQuotes::from_values(
///     tenors(&["1Y", "5Y"]),
///     tenors(&["2Y", "10Y"]),
///     vec![-0.01, 0.0, 0.01],
///     vec![vec![0.02, 0.0, -0.005]; 4],
/// )
/// .unwrap();
///
/// let mut cube = SpreadVolCube::new(atm, swap_rates, quotes);
/// let smile = cube.smile_section(2.0, 5.0).unwrap();
/// let forward = smile.atm_level();
/// assert!(smile.volatility(forward - 0.01).unwrap() > smile.volatility(forward).unwrap());
/// ```
#[derive(Debug)]
pub struct SpreadVolCube<V, S> {
    atm: V,
    swap_rates: S,
    quotes: VolSpreadQuotes,
    extrapolation: bool,
    snapshot: Option<EpochSnapshot>,
    market: Option<GridCube>,
}

impl<V, S> SpreadVolCube<V, S>
where
    V: SwaptionVolatilityStructure,
    S: SwapRateProvider,
{
    /// Create a cube that extrapolates the spreads beyond the quoted grid.
    pub fn new(atm: V, swap_rates: S, quotes: VolSpreadQuotes) -> Self {
        Self {
            atm,
            swap_rates,
            quotes,
            extrapolation: true,
            snapshot: None,
            market: None,
        }
    }

    /// Enable or disable spread extrapolation.
    pub fn with_extrapolation(mut self, extrapolation: bool) -> Self {
        self.extrapolation = extrapolation;
        self.market = None;
        self
    }

    /// ATM volatility structure.
    pub fn atm_structure(&self) -> &V {
        &self.atm
    }

    /// Vol-spread quotes.
    pub fn quotes(&self) -> &VolSpreadQuotes {
        &self.quotes
    }

    /// Reload the market cube if any quote changed.
    ///
    /// # Errors
    ///
    /// Unset quotes or an invalid grid.
    pub fn ensure_fresh(&mut self) -> Result<&GridCube, CubeError> {
        let snapshot = self.quotes.snapshot();
        let market = match self.market.take() {
            Some(market) if self.snapshot.as_ref() == Some(&snapshot) => market,
            previous => {
                self.market = previous;
                let mut market = self.quotes.market_cube(&self.atm, self.extrapolation)?;
                market.ensure_fresh()?;
                debug!(
                    options = market.rows(),
                    swaps = market.cols(),
                    spreads = market.n_layers(),
                    "spread cube reloaded"
                );
                self.snapshot = Some(snapshot);
                market
            }
        };
        Ok(self.market.insert(market))
    }

    /// Smile at `(option_time, swap_length)`.
    ///
    /// # Errors
    ///
    /// Interpolation outside the grid without extrapolation, market data
    /// failures, or no positive strike.
    pub fn smile_section(&mut self, option_time: f64, swap_length: f64) -> Result<SmileSection, CubeError> {
        let option_date = self.atm.option_date_from_time(option_time)?;
        let swap_tenor = self.atm.swap_tenor_from_length(swap_length);
        let forward = self.swap_rates.atm_forward(option_date, swap_tenor)?;
        let atm_vol = self.atm.volatility(option_time, swap_length, forward)?;

        let market = self.ensure_fresh()?;
        let spreads = market.interpolate(option_time, swap_length)?;
        let sqrt_t = option_time.sqrt();

        let (strikes, std_devs): (Vec<f64>, Vec<f64>) = self
            .quotes
            .strike_spreads()
            .iter()
            .zip(&spreads)
            .filter(|(strike_spread, _)| forward + **strike_spread > 0.0)
            .map(|(&strike_spread, &vol_spread)| {
                (forward + strike_spread, sqrt_t * (atm_vol + vol_spread))
            })
            .unzip();

        if strikes.is_empty() {
            return Err(CubeError::InvalidQuotes(format!(
                "no positive strike at option time {option_time}, swap length {swap_length}"
            )));
        }
        Ok(SmileSection::spread(option_time, forward, strikes, std_devs)?)
    }
}
