//! Vol-spread quotes feeding the cubes.

use super::error::CubeError;
use super::grid::GridCube;
use std::sync::Arc;
use volcube_core::market_data::{EpochSnapshot, SimpleQuote, SwaptionVolatilityStructure};
use volcube_core::types::Period;

/// Volatility spreads over ATM, one quote per (option tenor, swap tenor,
/// strike spread).
///
/// Row `i · n_swaps + j` holds the quotes of option tenor `i` and swap
/// tenor `j`, one per strike spread.
///
/// # Example
///
/// ```
/// use volcube_optimiser::cube::VolSpreadQuotes;
///
/// let tenors = |s: &[&str]| s.iter().map(|t| t.parse().unwrap()).collect::<Vec<_>>();
/// let quotes = VolSpreadQuotes::from_values(
///     tenors(&["1Y", "5Y"]),
///     tenors(&["2Y", "10Y"]),
///     vec![-0.01, 0.0, 0.01],
///     vec![vec![0.02, 0.0, -0.005]; 4],
/// )
/// .unwrap();
/// assert_eq!(quotes.atm_index(), 1);
/// assert_eq!(quotes.values(1, 0).unwrap(), vec![0.02, 0.0, -0.005]);
/// ```
#[derive(Debug, Clone)]
pub struct VolSpreadQuotes {
    option_tenors: Vec<Period>,
    swap_tenors: Vec<Period>,
    strike_spreads: Vec<f64>,
    quotes: Vec<Vec<Arc<SimpleQuote>>>,
    atm_index: usize,
}

impl VolSpreadQuotes {
    /// Validate and wrap shared quotes.
    ///
    /// # Errors
    ///
    /// `CubeError::InvalidQuotes` when there are fewer than two option or
    /// swap tenors, tenors or spreads are not strictly increasing, the
    /// spreads lack 0, or the quote matrix is not
    /// `(#options · #swaps) × #spreads`.
    pub fn new(
        option_tenors: Vec<Period>,
        swap_tenors: Vec<Period>,
        strike_spreads: Vec<f64>,
        quotes: Vec<Vec<Arc<SimpleQuote>>>,
    ) -> Result<Self, CubeError> {
        for (name, axis) in [("option tenors", &option_tenors), ("swap tenors", &swap_tenors)] {
            if axis.len() < 2 {
                return Err(CubeError::InvalidQuotes(format!(
                    "need at least 2 {name}, got {}",
                    axis.len()
                )));
            }
            if axis.windows(2).any(|w| !(w[0] < w[1])) {
                return Err(CubeError::InvalidQuotes(format!(
                    "{name} must be strictly increasing"
                )));
            }
        }
        if strike_spreads.windows(2).any(|w| !(w[0] < w[1])) {
            return Err(CubeError::InvalidQuotes(
                "strike spreads must be strictly increasing".to_string(),
            ));
        }
        let atm_index = strike_spreads
            .iter()
            .position(|s| *s == 0.0)
            .ok_or_else(|| CubeError::InvalidQuotes("strike spreads must contain 0".to_string()))?;

        let expected_rows = option_tenors.len() * swap_tenors.len();
        if quotes.len() != expected_rows {
            return Err(CubeError::InvalidQuotes(format!(
                "expected {expected_rows} quote rows (options x swaps), got {}",
                quotes.len()
            )));
        }
        if let Some((r, row)) = quotes
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != strike_spreads.len())
        {
            return Err(CubeError::InvalidQuotes(format!(
                "quote row {r} has {} entries, expected {}",
                row.len(),
                strike_spreads.len()
            )));
        }

        Ok(Self {
            option_tenors,
            swap_tenors,
            strike_spreads,
            quotes,
            atm_index,
        })
    }

    /// Build from plain values, creating one shared quote per value.
    ///
    /// # Errors
    ///
    /// See [`VolSpreadQuotes::new`].
    pub fn from_values(
        option_tenors: Vec<Period>,
        swap_tenors: Vec<Period>,
        strike_spreads: Vec<f64>,
        values: Vec<Vec<f64>>,
    ) -> Result<Self, CubeError> {
        let quotes = values
            .into_iter()
            .map(|row| row.into_iter().map(SimpleQuote::shared).collect())
            .collect();
        Self::new(option_tenors, swap_tenors, strike_spreads, quotes)
    }

    /// Option tenors.
    pub fn option_tenors(&self) -> &[Period] {
        &self.option_tenors
    }

    /// Swap tenors.
    pub fn swap_tenors(&self) -> &[Period] {
        &self.swap_tenors
    }

    /// Strike spreads over the ATM forward.
    pub fn strike_spreads(&self) -> &[f64] {
        &self.strike_spreads
    }

    /// Position of the zero spread.
    pub fn atm_index(&self) -> usize {
        self.atm_index
    }

    /// Shared quotes of node `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if `i` or `j` is outside the quoted grid.
    pub fn row(&self, i: usize, j: usize) -> &[Arc<SimpleQuote>] {
        &self.quotes[i * self.swap_tenors.len() + j]
    }

    /// Current values at node `(i, j)`.
    ///
    /// # Errors
    ///
    /// `CubeError::MarketData` naming the first unset quote.
    pub fn values(&self, i: usize, j: usize) -> Result<Vec<f64>, CubeError> {
        self.row(i, j)
            .iter()
            .zip(&self.strike_spreads)
            .map(|(q, spread)| {
                Ok(q.checked_value(|| {
                    format!(
                        "vol spread {spread} at option {}, swap {}",
                        self.option_tenors[i], self.swap_tenors[j]
                    )
                })?)
            })
            .collect()
    }

    /// Load the current quotes into a cube with one layer per strike spread,
    /// on the option dates and times implied by `atm`.
    ///
    /// # Errors
    ///
    /// Date arithmetic failures, unset quotes, or an invalid grid.
    pub fn market_cube<V>(&self, atm: &V, extrapolation: bool) -> Result<GridCube, CubeError>
    where
        V: SwaptionVolatilityStructure + ?Sized,
    {
        let option_dates = self
            .option_tenors
            .iter()
            .map(|t| atm.option_date_from_tenor(*t))
            .collect::<Result<Vec<_>, _>>()?;
        let option_times = option_dates.iter().map(|d| atm.option_time(*d)).collect();
        let swap_lengths = self.swap_tenors.iter().map(|t| atm.swap_length(*t)).collect();

        let mut cube = GridCube::new(
            option_dates,
            self.swap_tenors.clone(),
            option_times,
            swap_lengths,
            self.strike_spreads.len(),
            extrapolation,
        )?;
        for i in 0..self.option_tenors.len() {
            for j in 0..self.swap_tenors.len() {
                for (k, value) in self.values(i, j)?.into_iter().enumerate() {
                    cube.set_element(k, i, j, value)?;
                }
            }
        }
        Ok(cube)
    }

    /// Epochs of every quote, row by row.
    pub fn snapshot(&self) -> EpochSnapshot {
        EpochSnapshot::capture(self.quotes.iter().flatten())
    }
}
