//! TOML market-input schema shared by the commands.

use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use volcube_core::market_data::{
    CurveSwapRateProvider, FlatCurve, SimpleQuote, SwaptionVolatilityMatrix,
};
use volcube_core::types::{Date, DayCountConvention, Period};
use volcube_optimiser::cube::VolSpreadQuotes;
use volcube_optimiser::market_model::Abcd;

use crate::{CliError, Result};

/// Read and parse a TOML input file.
pub fn load<T>(path: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    if !Path::new(path).exists() {
        return Err(CliError::FileNotFound(path.to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| CliError::Parse {
        path: path.to_string(),
        message: e.to_string(),
    })
}

fn periods(labels: &[String]) -> Result<Vec<Period>> {
    labels
        .iter()
        .map(|s| s.parse::<Period>().map_err(CliError::from))
        .collect()
}

/// Market data for the `cube` command.
#[derive(Debug, Clone, Deserialize)]
pub struct CubeInput {
    /// Valuation date, `YYYY-MM-DD`.
    pub reference_date: String,
    /// Day count for option times.
    #[serde(default = "default_day_count")]
    pub day_count: String,
    /// Continuously compounded flat rate driving the forward swap rates.
    pub flat_rate: f64,
    /// ATM volatility matrix.
    pub atm: AtmInput,
    /// Smile quotes as vol spreads over ATM.
    pub smile: SmileInput,
    /// Points at which to report smiles.
    #[serde(default)]
    pub queries: Vec<QueryInput>,
}

fn default_day_count() -> String {
    "ACT/365F".to_string()
}

/// ATM volatility matrix.
#[derive(Debug, Clone, Deserialize)]
pub struct AtmInput {
    /// Option tenor labels such as `"6M"`.
    pub option_tenors: Vec<String>,
    /// Swap tenor labels.
    pub swap_tenors: Vec<String>,
    /// `vols[i][j]` for option tenor `i` and swap tenor `j`.
    pub vols: Vec<Vec<f64>>,
}

/// Vol-spread smile quotes.
#[derive(Debug, Clone, Deserialize)]
pub struct SmileInput {
    /// Option tenor labels.
    pub option_tenors: Vec<String>,
    /// Swap tenor labels.
    pub swap_tenors: Vec<String>,
    /// Strike spreads over the ATM forward; must contain zero.
    pub strike_spreads: Vec<f64>,
    /// One row per (option, swap) pair, option-major.
    pub spreads: Vec<Vec<f64>>,
}

/// A reporting point on the cube.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryInput {
    /// Option tenor label.
    pub option_tenor: String,
    /// Swap tenor label.
    pub swap_tenor: String,
}

impl CubeInput {
    /// Parsed valuation date.
    pub fn reference(&self) -> Result<Date> {
        Ok(self.reference_date.parse()?)
    }

    /// Parsed day count.
    pub fn day_count(&self) -> Result<DayCountConvention> {
        Ok(self.day_count.parse()?)
    }

    /// ATM matrix, extrapolating beyond its axes.
    pub fn atm_matrix(&self) -> Result<SwaptionVolatilityMatrix> {
        Ok(SwaptionVolatilityMatrix::new(
            self.reference()?,
            self.day_count()?,
            periods(&self.atm.option_tenors)?,
            periods(&self.atm.swap_tenors)?,
            self.atm.vols.clone(),
            true,
        )?)
    }

    /// Forward swap rates off a flat curve.
    pub fn swap_rates(&self) -> Result<CurveSwapRateProvider<FlatCurve<f64>>> {
        Ok(CurveSwapRateProvider::new(
            FlatCurve::new(self.flat_rate),
            self.reference()?,
            self.day_count()?,
        ))
    }

    /// Live quote handles for the smile spreads.
    pub fn quotes(&self) -> Result<VolSpreadQuotes> {
        let rows: Vec<Vec<Arc<SimpleQuote>>> = self
            .smile
            .spreads
            .iter()
            .map(|row| row.iter().map(|v| SimpleQuote::shared(*v)).collect())
            .collect();
        Ok(VolSpreadQuotes::new(
            periods(&self.smile.option_tenors)?,
            periods(&self.smile.swap_tenors)?,
            self.smile.strike_spreads.clone(),
            rows,
        )?)
    }

    /// Query points as `(label, option time, swap length)`.
    ///
    /// Without explicit queries every quoted node is reported.
    pub fn query_points(&self) -> Result<Vec<(String, f64, f64)>> {
        let reference = self.reference()?;
        let day_count = self.day_count()?;
        let pairs: Vec<(String, String)> = if self.queries.is_empty() {
            self.smile
                .option_tenors
                .iter()
                .flat_map(|o| self.smile.swap_tenors.iter().map(move |s| (o.clone(), s.clone())))
                .collect()
        } else {
            self.queries
                .iter()
                .map(|q| (q.option_tenor.clone(), q.swap_tenor.clone()))
                .collect()
        };
        pairs
            .into_iter()
            .map(|(option, swap)| -> Result<(String, f64, f64)> {
                let expiry = reference.advance(option.parse::<Period>()?)?;
                let length = swap.parse::<Period>()?.years();
                Ok((
                    format!("{option}x{swap}"),
                    day_count.year_fraction(reference, expiry),
                    length,
                ))
            })
            .collect()
    }
}

/// Market-model inputs for the `coterminal` command.
#[derive(Debug, Clone, Deserialize)]
pub struct CoterminalInput {
    /// Reset times plus the final payment time.
    pub rate_times: Vec<f64>,
    /// Simple forward rates, one per accrual period.
    pub forward_rates: Vec<f64>,
    /// Caplet volatility targets, one per rate.
    pub caplet_vols: Vec<f64>,
    /// Per-rate displacements; zero when omitted.
    #[serde(default)]
    pub displacements: Option<Vec<f64>>,
    /// Per-rate variance tilt; zero when omitted.
    #[serde(default)]
    pub alpha: Option<Vec<f64>>,
    /// Exponential forward correlation.
    pub correlation: CorrelationInput,
    /// Coterminal swaption variance shape.
    pub variance: VarianceInput,
}

/// Exponential correlation `ρ + (1−ρ)·exp(−β|t_i − t_j|)`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CorrelationInput {
    /// Long-term correlation.
    pub long_term: f64,
    /// Decay speed.
    pub beta: f64,
    /// Number of factors.
    pub factors: usize,
}

/// Coterminal swap-rate volatility description.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum VarianceInput {
    /// Constant volatility per swap rate.
    Flat {
        /// One volatility per rate.
        vols: Vec<f64>,
    },
    /// Common time-homogeneous abcd shape.
    Abcd {
        /// Shape parameters.
        abcd: Abcd,
    },
}

impl CoterminalInput {
    /// Number of forward rates.
    pub fn number_of_rates(&self) -> usize {
        self.forward_rates.len()
    }

    /// Displacements, defaulting to zero.
    pub fn displacements(&self) -> Vec<f64> {
        self.displacements
            .clone()
            .unwrap_or_else(|| vec![0.0; self.number_of_rates()])
    }

    /// Variance tilts, defaulting to zero.
    pub fn alpha(&self) -> Vec<f64> {
        self.alpha
            .clone()
            .unwrap_or_else(|| vec![0.0; self.number_of_rates()])
    }
}
