//! SABR volatility cube.
//!
//! Recalibration runs these stages in order:
//!
//! 1. vol-spread quotes → market cube (one layer per strike spread)
//! 2. market cube + ATM forwards and vols → one quoted smile per node
//! 3. one SABR fit per quoted node → sparse parameter cube
//! 4. sparse cube evaluated on the dense grid (ATM axes merged with the
//!    quoted axes), forwards replaced by the dense node's forward → dense cube
//! 5. optionally, one parameter re-solved per dense node so the SABR ATM
//!    volatility equals the quoted ATM volatility → ATM cube
//!
//! Smile queries interpolate the ATM cube when ATM calibration is on and
//! the dense cube otherwise.

use super::config::CubeConfig;
use super::error::CubeError;
use super::grid::GridCube;
use super::quotes::VolSpreadQuotes;
use tracing::{debug, info};
use volcube_core::market_data::{EpochSnapshot, SwapRateProvider, SwaptionVolatilityStructure};
use volcube_core::math::interpolators::Extrapolation;
use volcube_core::math::solvers::BrentSolver;
use volcube_core::types::{Date, Period};
use volcube_models::calibration::{SabrFitResult, SabrSmileFitter};
use volcube_models::models::{hagan_lognormal_vol, SabrParameter, SabrParams};
use volcube_models::smile::{InterpolatedSmileSection, SmileSection};

/// Layers of a SABR parameter cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLayer {
    /// SABR alpha.
    Alpha = 0,
    /// SABR beta.
    Beta = 1,
    /// SABR nu.
    Nu = 2,
    /// SABR rho.
    Rho = 3,
    /// ATM forward swap rate.
    Forward = 4,
    /// Fit rms error.
    RmsError = 5,
    /// Fit max error.
    MaxError = 6,
}

impl ParameterLayer {
    /// Number of layers in a parameter cube.
    pub const COUNT: usize = 7;

    /// Layer index.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Layer holding `parameter`.
    pub fn of(parameter: SabrParameter) -> Self {
        match parameter {
            SabrParameter::Alpha => ParameterLayer::Alpha,
            SabrParameter::Beta => ParameterLayer::Beta,
            SabrParameter::Nu => ParameterLayer::Nu,
            SabrParameter::Rho => ParameterLayer::Rho,
        }
    }
}

fn params_from_layers(values: &[f64]) -> SabrParams {
    SabrParams {
        alpha: values[ParameterLayer::Alpha.index()],
        beta: values[ParameterLayer::Beta.index()],
        nu: values[ParameterLayer::Nu.index()],
        rho: values[ParameterLayer::Rho.index()],
    }
}

/// Outputs of one recalibration.
#[derive(Debug, Clone)]
pub struct CalibratedCube {
    market: GridCube,
    sparse_smiles: Vec<SmileSection>,
    sparse_fits: Vec<SabrFitResult>,
    sparse_parameters: GridCube,
    dense_parameters: GridCube,
    atm_parameters: Option<GridCube>,
}

impl CalibratedCube {
    /// Market vol-spread cube.
    pub fn market(&self) -> &GridCube {
        &self.market
    }

    /// Parameters fitted at the quoted nodes.
    pub fn sparse_parameters(&self) -> &GridCube {
        &self.sparse_parameters
    }

    /// Parameters on the dense grid.
    pub fn dense_parameters(&self) -> &GridCube {
        &self.dense_parameters
    }

    /// ATM-recalibrated parameters, when ATM calibration is on.
    pub fn atm_parameters(&self) -> Option<&GridCube> {
        self.atm_parameters.as_ref()
    }

    /// Fit diagnostics per quoted node, row-major by (option, swap).
    pub fn sparse_fits(&self) -> &[SabrFitResult] {
        &self.sparse_fits
    }

    /// Cube queried by [`CalibratedCube::smile_section`].
    pub fn query_cube(&self) -> &GridCube {
        self.atm_parameters
            .as_ref()
            .unwrap_or(&self.dense_parameters)
    }

    /// Interpolated SABR parameters and forward at a point.
    ///
    /// # Errors
    ///
    /// * `CubeError::Interpolation` - outside the grid without extrapolation
    /// * `CubeError::InvalidParameters` - interpolated parameters invalid
    pub fn parameters(&self, option_time: f64, swap_length: f64) -> Result<(SabrParams, f64), CubeError> {
        let values = self.query_cube().interpolate(option_time, swap_length)?;
        let params = params_from_layers(&values);
        params.validate().map_err(|source| CubeError::InvalidParameters {
            option_time,
            swap_length,
            source,
        })?;
        Ok((params, values[ParameterLayer::Forward.index()]))
    }

    /// SABR smile at `(option_time, swap_length)`.
    ///
    /// # Errors
    ///
    /// See [`CalibratedCube::parameters`]; also a non-positive time or
    /// forward.
    pub fn smile_section(&self, option_time: f64, swap_length: f64) -> Result<SmileSection, CubeError> {
        let (params, forward) = self.parameters(option_time, swap_length)?;
        Ok(SmileSection::sabr(option_time, forward, params)?)
    }

    /// Quoted smile at node `(i, j)` of the market grid.
    ///
    /// # Errors
    ///
    /// `CubeError::IndexOutOfRange` outside the quoted grid.
    pub fn sparse_smile_section(&self, i: usize, j: usize) -> Result<&SmileSection, CubeError> {
        let (rows, cols) = (self.market.rows(), self.market.cols());
        if i >= rows {
            return Err(CubeError::IndexOutOfRange {
                what: "option",
                index: i,
                len: rows,
            });
        }
        if j >= cols {
            return Err(CubeError::IndexOutOfRange {
                what: "swap",
                index: j,
                len: cols,
            });
        }
        Ok(&self.sparse_smiles[i * cols + j])
    }
}

/// A quoted node waiting to be fitted.
struct SparseNode {
    i: usize,
    j: usize,
    option_tenor: Period,
    swap_tenor: Period,
    section: InterpolatedSmileSection,
}

/// SABR swaption volatility cube over an ATM structure.
///
/// Recalibrates lazily: [`SabrVolCube::ensure_fresh`] reruns every stage
/// when any vol-spread quote changed since the last run and otherwise hands
/// back the cached result.
///
/// # Example
///
/// ```
/// use volcube_core::market_data::{CurveSwapRateProvider, FlatCurve, SwaptionVolatilityMatrix};
/// use volcube_core::types::{Date, DayCountConvention, Period};
/// use volcube_optimiser::cube::{CubeConfig, SabrVolCube, VolSpreadQuotes};
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
/// let spreads = vec![-0.01, -0.005, 0.0, 0.005, 0.01];
/// let smile = vec![0.03, 0.012, 0.0, -0.006, -0.008];
/// let quotes = VolSpreadQuotes::from_values(
///     tenors(&["1Y", "5Y"]),
///     tenors(&["2Y", "10Y"]),
///     spreads,
///     vec![smile; 4],
/// )
/// .unwrap();
///
/// let config = CubeConfig::default().with_fixed_beta(0.5).with_max_error_tolerance(0.01);
/// let mut cube = SabrVolCube::new(atm, swap_rates, quotes, config).unwrap();
/// let smile = cube.smile_section(3.0, 5.0).unwrap();
/// assert!(smile.volatility(smile.atm_level()).unwrap() > 0.0);
/// ```
#[derive(Debug)]
pub struct SabrVolCube<V, S> {
    atm: V,
    swap_rates: S,
    quotes: VolSpreadQuotes,
    config: CubeConfig,
    fitter: SabrSmileFitter,
    snapshot: Option<EpochSnapshot>,
    calibrated: Option<CalibratedCube>,
}

impl<V, S> SabrVolCube<V, S>
where
    V: SwaptionVolatilityStructure,
    S: SwapRateProvider,
{
    /// Create a cube; no calibration happens until the first query.
    ///
    /// # Errors
    ///
    /// `CubeError::InvalidConfig` when the configuration is inconsistent.
    pub fn new(
        atm: V,
        swap_rates: S,
        quotes: VolSpreadQuotes,
        config: CubeConfig,
    ) -> Result<Self, CubeError> {
        config.validate()?;
        Ok(Self {
            atm,
            swap_rates,
            quotes,
            fitter: SabrSmileFitter::new(config.fit),
            config,
            snapshot: None,
            calibrated: None,
        })
    }

    /// ATM volatility structure.
    pub fn atm_structure(&self) -> &V {
        &self.atm
    }

    /// Swap-rate provider.
    pub fn swap_rates(&self) -> &S {
        &self.swap_rates
    }

    /// Vol-spread quotes.
    pub fn quotes(&self) -> &VolSpreadQuotes {
        &self.quotes
    }

    /// Calibration configuration.
    pub fn config(&self) -> &CubeConfig {
        &self.config
    }

    /// Result of the last successful recalibration, if any.
    pub fn calibrated(&self) -> Option<&CalibratedCube> {
        self.calibrated.as_ref()
    }

    /// Recalibrate if any quote changed since the last run.
    ///
    /// On failure the previous result is kept but not marked current, so
    /// the next call tries again.
    ///
    /// # Errors
    ///
    /// Any stage failure; a failed node fit names its option and swap tenor.
    pub fn ensure_fresh(&mut self) -> Result<&CalibratedCube, CubeError> {
        let snapshot = self.quotes.snapshot();
        let cube = match self.calibrated.take() {
            Some(cube) if self.snapshot.as_ref() == Some(&snapshot) => cube,
            previous => {
                self.calibrated = previous;
                let cube = self.recalibrate()?;
                self.snapshot = Some(snapshot);
                cube
            }
        };
        Ok(self.calibrated.insert(cube))
    }

    /// SABR smile at `(option_time, swap_length)`.
    ///
    /// # Errors
    ///
    /// Recalibration or interpolation failure, or invalid interpolated
    /// parameters.
    pub fn smile_section(&mut self, option_time: f64, swap_length: f64) -> Result<SmileSection, CubeError> {
        self.ensure_fresh()?.smile_section(option_time, swap_length)
    }

    /// SABR smile for an option date and swap tenor.
    ///
    /// # Errors
    ///
    /// See [`SabrVolCube::smile_section`].
    pub fn smile_section_for(&mut self, option_date: Date, swap_tenor: Period) -> Result<SmileSection, CubeError> {
        let option_time = self.atm.option_time(option_date);
        let swap_length = self.atm.swap_length(swap_tenor);
        self.smile_section(option_time, swap_length)
    }

    /// Quoted smile at market node `(i, j)`.
    ///
    /// # Errors
    ///
    /// Recalibration failure or an index outside the quoted grid.
    pub fn sparse_smile_section(&mut self, i: usize, j: usize) -> Result<SmileSection, CubeError> {
        self.ensure_fresh()?.sparse_smile_section(i, j).cloned()
    }

    fn recalibrate(&self) -> Result<CalibratedCube, CubeError> {
        let mut market = self
            .quotes
            .market_cube(&self.atm, self.config.market_extrapolation)?;
        market.ensure_fresh()?;
        debug!(
            options = market.rows(),
            swaps = market.cols(),
            spreads = market.n_layers(),
            "market cube loaded"
        );

        let nodes = self.sparse_nodes(&market)?;
        let sparse_fits = fit_nodes(&self.fitter, &nodes)?;
        debug!(nodes = nodes.len(), "sparse smiles fitted");

        let mut sparse_parameters = GridCube::new(
            market.option_dates().to_vec(),
            market.swap_tenors().to_vec(),
            market.option_times().to_vec(),
            market.swap_lengths().to_vec(),
            ParameterLayer::COUNT,
            self.config.parameter_extrapolation,
        )?;
        for (node, fit) in nodes.iter().zip(&sparse_fits) {
            let values = [
                fit.params.alpha,
                fit.params.beta,
                fit.params.nu,
                fit.params.rho,
                node.section.atm_level(),
                fit.rms_error,
                fit.max_error,
            ];
            for (layer, value) in values.into_iter().enumerate() {
                sparse_parameters.set_element(layer, node.i, node.j, value)?;
            }
        }
        sparse_parameters.ensure_fresh()?;

        let mut dense_parameters = self.dense_cube(&sparse_parameters)?;
        dense_parameters.ensure_fresh()?;
        debug!(
            options = dense_parameters.rows(),
            swaps = dense_parameters.cols(),
            "dense parameter cube built"
        );

        let atm_parameters = if self.config.atm_calibrated {
            let mut cube = self.atm_recalibrated(&dense_parameters)?;
            cube.ensure_fresh()?;
            debug!(parameter = ?self.config.atm_parameter, "ATM recalibration done");
            Some(cube)
        } else {
            None
        };

        let sparse_smiles = nodes
            .into_iter()
            .map(|node| SmileSection::Quoted(node.section))
            .collect();

        info!(
            quoted_nodes = sparse_fits.len(),
            atm_calibrated = self.config.atm_calibrated,
            "SABR cube recalibrated"
        );
        Ok(CalibratedCube {
            market,
            sparse_smiles,
            sparse_fits,
            sparse_parameters,
            dense_parameters,
            atm_parameters,
        })
    }

    /// Quoted smile at every market node, row-major.
    fn sparse_nodes(&self, market: &GridCube) -> Result<Vec<SparseNode>, CubeError> {
        let spreads = self.quotes.strike_spreads();
        let mut nodes = Vec::with_capacity(market.rows() * market.cols());

        for (i, (&option_date, &t)) in market
            .option_dates()
            .iter()
            .zip(market.option_times())
            .enumerate()
        {
            for (j, (&swap_tenor, &l)) in market
                .swap_tenors()
                .iter()
                .zip(market.swap_lengths())
                .enumerate()
            {
                let forward = self.swap_rates.atm_forward(option_date, swap_tenor)?;
                let atm_vol = self.atm.volatility(t, l, forward)?;
                let sqrt_t = t.sqrt();

                let (strikes, std_devs): (Vec<f64>, Vec<f64>) = spreads
                    .iter()
                    .enumerate()
                    .filter(|(_, spread)| forward + **spread > 0.0)
                    .map(|(k, &spread)| {
                        (
                            forward + spread,
                            sqrt_t * (atm_vol + market.layers()[k][i][j]),
                        )
                    })
                    .unzip();

                let section =
                    InterpolatedSmileSection::new(t, forward, strikes, std_devs, Extrapolation::Flat)?;
                nodes.push(SparseNode {
                    i,
                    j,
                    option_tenor: self.quotes.option_tenors()[i],
                    swap_tenor,
                    section,
                });
            }
        }
        Ok(nodes)
    }

    /// Sparse parameters evaluated on the merged ATM and quoted axes.
    fn dense_cube(&self, sparse: &GridCube) -> Result<GridCube, CubeError> {
        let atm_times: Vec<f64> = self
            .atm
            .option_dates()
            .iter()
            .map(|d| self.atm.option_time(*d))
            .collect();
        let (option_dates, option_times) = merge_axis(
            self.atm.option_dates(),
            &atm_times,
            sparse.option_dates(),
            sparse.option_times(),
        );
        let atm_lengths: Vec<f64> = self
            .atm
            .swap_tenors()
            .iter()
            .map(|p| self.atm.swap_length(*p))
            .collect();
        let (swap_tenors, swap_lengths) = merge_axis(
            self.atm.swap_tenors(),
            &atm_lengths,
            sparse.swap_tenors(),
            sparse.swap_lengths(),
        );

        let mut dense = GridCube::new(
            option_dates,
            swap_tenors,
            option_times,
            swap_lengths,
            ParameterLayer::COUNT,
            self.config.parameter_extrapolation,
        )?;

        for i in 0..dense.rows() {
            let (option_date, t) = (dense.option_dates()[i], dense.option_times()[i]);
            for j in 0..dense.cols() {
                let (swap_tenor, l) = (dense.swap_tenors()[j], dense.swap_lengths()[j]);
                let mut values = sparse.interpolate(t, l)?;
                params_from_layers(&values)
                    .validate()
                    .map_err(|source| CubeError::InvalidParameters {
                        option_time: t,
                        swap_length: l,
                        source,
                    })?;
                values[ParameterLayer::Forward.index()] =
                    self.swap_rates.atm_forward(option_date, swap_tenor)?;
                for (layer, value) in values.into_iter().enumerate() {
                    dense.set_element(layer, i, j, value)?;
                }
            }
        }
        Ok(dense)
    }

    /// Dense cube with the configured parameter re-solved at every node.
    fn atm_recalibrated(&self, dense: &GridCube) -> Result<GridCube, CubeError> {
        let parameter = self.config.atm_parameter;
        let layer = ParameterLayer::of(parameter).index();
        let solver = BrentSolver::new(self.config.atm_solver);
        let (lower, upper) = parameter_bounds(parameter, self.config.fit.rho_max);
        let mut recalibrated = dense.clone();

        for i in 0..dense.rows() {
            let t = dense.option_times()[i];
            for j in 0..dense.cols() {
                let l = dense.swap_lengths()[j];
                let values: Vec<f64> = dense.layers().iter().map(|m| m[i][j]).collect();
                let params = params_from_layers(&values);
                let forward = values[ParameterLayer::Forward.index()];
                let target = self.atm.volatility(t, l, forward)?;

                let atm_error = |x: f64| {
                    hagan_lognormal_vol(forward, forward, t, &params.with(parameter, x)) - target
                };
                let guess = params.get(parameter);
                let step = (0.1 * guess.abs()).max(1e-4);
                let solved = solver
                    .find_root_from_guess(atm_error, guess, step, lower, upper)
                    .map_err(|source| CubeError::AtmRecalibration {
                        option_time: t,
                        swap_length: l,
                        source,
                    })?;
                recalibrated.set_element(layer, i, j, solved)?;
            }
        }
        Ok(recalibrated)
    }
}

/// Search interval of a parameter during ATM recalibration.
fn parameter_bounds(parameter: SabrParameter, rho_max: f64) -> (f64, f64) {
    match parameter {
        SabrParameter::Alpha => (1e-12, f64::INFINITY),
        SabrParameter::Beta => (0.0, 1.0),
        SabrParameter::Nu => (0.0, f64::INFINITY),
        SabrParameter::Rho => (-rho_max, rho_max),
    }
}

/// Union of two axes sorted by their numeric coordinate; on equal
/// coordinates the first axis' label wins.
fn merge_axis<L: Copy>(
    labels_a: &[L],
    coords_a: &[f64],
    labels_b: &[L],
    coords_b: &[f64],
) -> (Vec<L>, Vec<f64>) {
    let mut points: Vec<(f64, L)> = coords_a
        .iter()
        .copied()
        .zip(labels_a.iter().copied())
        .chain(coords_b.iter().copied().zip(labels_b.iter().copied()))
        .collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    points.dedup_by(|later, earlier| later.0 == earlier.0);
    points.into_iter().map(|(c, l)| (l, c)).unzip()
}

#[cfg(feature = "parallel")]
fn fit_nodes(fitter: &SabrSmileFitter, nodes: &[SparseNode]) -> Result<Vec<SabrFitResult>, CubeError> {
    use rayon::prelude::*;

    nodes.par_iter().map(|node| fit_node(fitter, node)).collect()
}

#[cfg(not(feature = "parallel"))]
fn fit_nodes(fitter: &SabrSmileFitter, nodes: &[SparseNode]) -> Result<Vec<SabrFitResult>, CubeError> {
    nodes.iter().map(|node| fit_node(fitter, node)).collect()
}

fn fit_node(fitter: &SabrSmileFitter, node: &SparseNode) -> Result<SabrFitResult, CubeError> {
    fitter
        .fit_section(&node.section)
        .map_err(|source| CubeError::CellFit {
            option_tenor: node.option_tenor,
            swap_tenor: node.swap_tenor,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use volcube_core::market_data::{CurveSwapRateProvider, FlatCurve, SwaptionVolatilityMatrix};
    use volcube_core::types::DayCountConvention;

    fn tenors(s: &[&str]) -> Vec<Period> {
        s.iter().map(|t| t.parse().unwrap()).collect()
    }

    fn reference() -> Date {
        Date::from_ymd(2024, 1, 15).unwrap()
    }

    fn atm() -> SwaptionVolatilityMatrix {
        SwaptionVolatilityMatrix::new(
            reference(),
            DayCountConvention::Act365Fixed,
            tenors(&["1Y", "2Y", "5Y"]),
            tenors(&["2Y", "5Y", "10Y"]),
            vec![
                vec![0.24, 0.22, 0.20],
                vec![0.22, 0.20, 0.19],
                vec![0.19, 0.18, 0.17],
            ],
            true,
        )
        .unwrap()
    }

    fn swap_rates() -> CurveSwapRateProvider<FlatCurve<f64>> {
        CurveSwapRateProvider::new(FlatCurve::new(0.03), reference(), DayCountConvention::Act365Fixed)
    }

    fn quotes() -> VolSpreadQuotes {
        let smile = vec![0.025, 0.01, 0.0, -0.004, -0.005];
        VolSpreadQuotes::from_values(
            tenors(&["1Y", "5Y"]),
            tenors(&["2Y", "10Y"]),
            vec![-0.01, -0.005, 0.0, 0.005, 0.01],
            vec![smile; 4],
        )
        .unwrap()
    }

    fn cube(config: CubeConfig) -> SabrVolCube<SwaptionVolatilityMatrix, CurveSwapRateProvider<FlatCurve<f64>>> {
        SabrVolCube::new(atm(), swap_rates(), quotes(), config).unwrap()
    }

    fn config() -> CubeConfig {
        CubeConfig::default()
            .with_fixed_beta(0.5)
            .with_max_error_tolerance(0.01)
    }

    // ========================================
    // Helper Tests
    // ========================================

    #[test]
    fn test_merge_axis() {
        let (labels, coords) = merge_axis(&['a', 'c'], &[1.0, 3.0], &['b', 'x', 'd'], &[2.0, 3.0, 4.0]);
        assert_eq!(labels, vec!['a', 'b', 'c', 'd']);
        assert_eq!(coords, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_parameter_layer_indices() {
        assert_eq!(ParameterLayer::of(SabrParameter::Rho).index(), 3);
        assert_eq!(ParameterLayer::MaxError.index(), ParameterLayer::COUNT - 1);
    }

    // ========================================
    // Calibration Stage Tests
    // ========================================

    #[test]
    fn test_dense_grid_merges_axes() {
        let mut c = cube(config());
        let calibrated = c.ensure_fresh().unwrap();
        let dense = calibrated.dense_parameters();
        assert_eq!(dense.rows(), 3);
        assert_eq!(dense.cols(), 3);
        assert_eq!(calibrated.sparse_parameters().rows(), 2);
        assert_eq!(calibrated.sparse_fits().len(), 4);
    }

    #[test]
    fn test_dense_forward_layer_is_replaced() {
        let mut c = cube(config());
        let dense = c.ensure_fresh().unwrap().dense_parameters().clone();
        let provider = swap_rates();
        let forward_layer = &dense.layers()[ParameterLayer::Forward.index()];
        for (i, date) in dense.option_dates().iter().enumerate() {
            for (j, tenor) in dense.swap_tenors().iter().enumerate() {
                assert_eq!(forward_layer[i][j], provider.atm_forward(*date, *tenor).unwrap());
            }
        }
    }

    #[test]
    fn test_atm_recalibration_matches_atm_vol() {
        let mut c = cube(config());
        let calibrated = c.ensure_fresh().unwrap().clone();
        let atm_cube = calibrated.atm_parameters().unwrap();
        let structure = atm();
        for (i, &t) in atm_cube.option_times().iter().enumerate() {
            for (j, &l) in atm_cube.swap_lengths().iter().enumerate() {
                let values: Vec<f64> = atm_cube.layers().iter().map(|m| m[i][j]).collect();
                let forward = values[ParameterLayer::Forward.index()];
                let model = params_from_layers(&values).implied_vol(forward, forward, t).unwrap();
                let quoted = structure.volatility(t, l, forward).unwrap();
                assert_relative_eq!(model, quoted, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_without_atm_calibration_queries_dense() {
        let mut c = cube(config().with_atm_calibration(false, SabrParameter::Alpha));
        let calibrated = c.ensure_fresh().unwrap();
        assert!(calibrated.atm_parameters().is_none());
        assert_eq!(
            calibrated.query_cube().browse(),
            calibrated.dense_parameters().browse()
        );
    }

    #[test]
    fn test_sparse_smile_reproduces_quotes() {
        let mut c = cube(config());
        let smile = c.sparse_smile_section(0, 1).unwrap();
        let forward = smile.atm_level();
        let t = smile.exercise_time();
        let atm_vol = atm().volatility(t, 10.0, forward).unwrap();
        assert_relative_eq!(smile.volatility(forward).unwrap(), atm_vol, epsilon = 1e-14);
        assert_relative_eq!(
            smile.volatility(forward - 0.01).unwrap(),
            atm_vol + 0.025,
            epsilon = 1e-14
        );
        assert!(matches!(
            c.sparse_smile_section(2, 0),
            Err(CubeError::IndexOutOfRange { what: "option", .. })
        ));
    }

    #[test]
    fn test_cell_fit_failure_names_node() {
        let mut c = cube(config().with_max_error_tolerance(1e-12));
        match c.ensure_fresh().unwrap_err() {
            CubeError::CellFit {
                option_tenor,
                swap_tenor,
                ..
            } => {
                assert!(tenors(&["1Y", "5Y"]).contains(&option_tenor));
                assert!(tenors(&["2Y", "10Y"]).contains(&swap_tenor));
            }
            other => panic!("Expected CellFit, got {other:?}"),
        }
        assert!(c.calibrated().is_none());
    }

    // ========================================
    // Lazy Recalibration Tests
    // ========================================

    #[test]
    fn test_recalibrates_only_on_quote_change() {
        let mut c = cube(config());
        let first = c.ensure_fresh().unwrap().dense_parameters().browse();
        let second = c.ensure_fresh().unwrap().dense_parameters().browse();
        assert_eq!(first, second);

        c.quotes().row(0, 0)[0].set_value(0.03);
        let third = c.ensure_fresh().unwrap().dense_parameters().browse();
        assert_ne!(first, third);
    }

    #[test]
    fn test_failed_refresh_keeps_previous_fit() {
        let mut c = cube(config());
        let first = c.ensure_fresh().unwrap().dense_parameters().browse();

        c.quotes().row(0, 0)[0].set_value(f64::NAN);
        assert!(c.ensure_fresh().is_err());
        let kept = c.calibrated().unwrap().dense_parameters().browse();
        assert_eq!(first, kept);

        // still stale, so the next call refits
        c.quotes().row(0, 0)[0].set_value(0.025);
        let refit = c.ensure_fresh().unwrap().dense_parameters().browse();
        assert_eq!(first, refit);
    }

    #[test]
    fn test_smile_section_for_matches_time_query() {
        let mut c = cube(config());
        let date = reference().advance("2Y".parse().unwrap()).unwrap();
        let tenor: Period = "5Y".parse().unwrap();
        let by_date = c.smile_section_for(date, tenor).unwrap();
        let t = atm().option_time(date);
        let by_time = c.smile_section(t, 5.0).unwrap();
        assert_eq!(by_date.volatility(0.035).unwrap(), by_time.volatility(0.035).unwrap());
    }
}
