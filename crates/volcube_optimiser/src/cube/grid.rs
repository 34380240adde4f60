//! Layered 2-D grid over (option time, swap length).

use super::error::CubeError;
use nalgebra::DMatrix;
use volcube_core::math::interpolators::BilinearInterpolator;
use volcube_core::types::{Date, Period};

/// Whether the per-layer interpolators match the stored data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Interpolators reflect the current data.
    Fresh,
    /// Data changed since the interpolators were built.
    Stale,
}

/// A stack of matrices sharing one (option, swap) grid.
///
/// Each layer holds one quantity per node (a strike spread of the market
/// cube, or one SABR parameter of a parameter cube). Rows follow option
/// times, columns swap lengths; both axes stay strictly increasing with at
/// least two points.
///
/// Writes mark the cube [`CacheState::Stale`]. [`GridCube::ensure_fresh`]
/// rebuilds one bilinear interpolator per layer; [`GridCube::interpolate`]
/// reads them without rebuilding and refuses to run on stale data, while
/// [`GridCube::evaluate`] does both.
///
/// # Example
///
/// ```
/// use volcube_core::types::{Date, Period};
/// use volcube_optimiser::cube::GridCube;
///
/// let reference = Date::from_ymd(2024, 1, 15).unwrap();
/// let dates: Vec<Date> = ["1Y", "5Y"]
///     .iter()
///     .map(|t| reference.advance(t.parse().unwrap()).unwrap())
///     .collect();
/// let tenors: Vec<Period> = ["2Y", "10Y"].iter().map(|t| t.parse().unwrap()).collect();
///
/// let mut cube = GridCube::new(dates, tenors, vec![1.0, 5.0], vec![2.0, 10.0], 2, false).unwrap();
/// cube.set_element(1, 0, 1, 0.015).unwrap();
///
/// assert_eq!(cube.evaluate(1.0, 10.0).unwrap(), vec![0.0, 0.015]);
/// assert!(cube.evaluate(0.5, 10.0).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct GridCube {
    option_dates: Vec<Date>,
    swap_tenors: Vec<Period>,
    option_times: Vec<f64>,
    swap_lengths: Vec<f64>,
    layers: Vec<Vec<Vec<f64>>>,
    extrapolation: bool,
    interpolators: Vec<BilinearInterpolator<f64>>,
    state: CacheState,
}

impl GridCube {
    /// Create a cube with every cell zero.
    ///
    /// # Errors
    ///
    /// `CubeError::InvalidGrid` when axis lengths disagree, an axis has
    /// fewer than two points or is not strictly increasing, or `n_layers`
    /// is zero.
    pub fn new(
        option_dates: Vec<Date>,
        swap_tenors: Vec<Period>,
        option_times: Vec<f64>,
        swap_lengths: Vec<f64>,
        n_layers: usize,
        extrapolation: bool,
    ) -> Result<Self, CubeError> {
        if option_dates.len() != option_times.len() {
            return Err(CubeError::InvalidGrid(format!(
                "{} option dates but {} option times",
                option_dates.len(),
                option_times.len()
            )));
        }
        if swap_tenors.len() != swap_lengths.len() {
            return Err(CubeError::InvalidGrid(format!(
                "{} swap tenors but {} swap lengths",
                swap_tenors.len(),
                swap_lengths.len()
            )));
        }
        check_axis("option times", &option_times)?;
        check_axis("swap lengths", &swap_lengths)?;
        if n_layers == 0 {
            return Err(CubeError::InvalidGrid("cube needs at least one layer".to_string()));
        }

        let layers = vec![vec![vec![0.0; swap_lengths.len()]; option_times.len()]; n_layers];
        Ok(Self {
            option_dates,
            swap_tenors,
            option_times,
            swap_lengths,
            layers,
            extrapolation,
            interpolators: Vec::new(),
            state: CacheState::Stale,
        })
    }

    /// Write one cell.
    ///
    /// # Errors
    ///
    /// `CubeError::IndexOutOfRange` for an index outside the cube.
    pub fn set_element(
        &mut self,
        layer: usize,
        row: usize,
        col: usize,
        value: f64,
    ) -> Result<(), CubeError> {
        check_index("layer", layer, self.n_layers())?;
        check_index("row", row, self.rows())?;
        check_index("column", col, self.cols())?;
        self.layers[layer][row][col] = value;
        self.state = CacheState::Stale;
        Ok(())
    }

    /// Write one value per layer at a node, inserting the node's row or
    /// column when its option time or swap length is not on the grid.
    ///
    /// # Errors
    ///
    /// `CubeError::DimensionMismatch` unless `values` has one entry per layer.
    pub fn set_point(
        &mut self,
        option_date: Date,
        swap_tenor: Period,
        option_time: f64,
        swap_length: f64,
        values: &[f64],
    ) -> Result<(), CubeError> {
        if values.len() != self.n_layers() {
            return Err(CubeError::DimensionMismatch {
                expected: format!("{} values", self.n_layers()),
                got: format!("{} values", values.len()),
            });
        }

        let i = self.option_times.partition_point(|&t| t < option_time);
        let j = self.swap_lengths.partition_point(|&l| l < swap_length);
        let new_row = self.option_times.get(i) != Some(&option_time);
        let new_col = self.swap_lengths.get(j) != Some(&swap_length);
        if new_row || new_col {
            self.expand_layers(
                i,
                new_row.then_some((option_date, option_time)),
                j,
                new_col.then_some((swap_tenor, swap_length)),
            )?;
        }

        for (layer, &value) in self.layers.iter_mut().zip(values) {
            layer[i][j] = value;
        }
        self.state = CacheState::Stale;
        Ok(())
    }

    /// Replace layer `i`.
    ///
    /// # Errors
    ///
    /// `CubeError::IndexOutOfRange` or `CubeError::DimensionMismatch`.
    pub fn set_layer(&mut self, i: usize, matrix: Vec<Vec<f64>>) -> Result<(), CubeError> {
        check_index("layer", i, self.n_layers())?;
        self.check_shape(&matrix)?;
        self.layers[i] = matrix;
        self.state = CacheState::Stale;
        Ok(())
    }

    /// Replace every layer.
    ///
    /// # Errors
    ///
    /// `CubeError::DimensionMismatch` for a wrong layer count or shape.
    pub fn set_layers(&mut self, matrices: Vec<Vec<Vec<f64>>>) -> Result<(), CubeError> {
        if matrices.len() != self.n_layers() {
            return Err(CubeError::DimensionMismatch {
                expected: format!("{} layers", self.n_layers()),
                got: format!("{} layers", matrices.len()),
            });
        }
        for matrix in &matrices {
            self.check_shape(matrix)?;
        }
        self.layers = matrices;
        self.state = CacheState::Stale;
        Ok(())
    }

    /// Insert a row before index `i` and/or a column before index `j`.
    ///
    /// A `Some` argument carries the new axis point; existing data shifts
    /// past it and the new cells are zero in every layer.
    ///
    /// # Errors
    ///
    /// `CubeError::IndexOutOfRange` for an index past the end, and
    /// `CubeError::InvalidGrid` when the new point would break the strict
    /// ordering of its axis.
    pub fn expand_layers(
        &mut self,
        i: usize,
        option_point: Option<(Date, f64)>,
        j: usize,
        swap_point: Option<(Period, f64)>,
    ) -> Result<(), CubeError> {
        if let Some((_, t)) = option_point {
            check_index("row", i, self.rows() + 1)?;
            check_insertion("option time", &self.option_times, i, t)?;
        }
        if let Some((_, l)) = swap_point {
            check_index("column", j, self.cols() + 1)?;
            check_insertion("swap length", &self.swap_lengths, j, l)?;
        }

        if let Some((date, t)) = option_point {
            self.option_dates.insert(i, date);
            self.option_times.insert(i, t);
            let cols = self.cols();
            for layer in &mut self.layers {
                layer.insert(i, vec![0.0; cols]);
            }
        }
        if let Some((tenor, l)) = swap_point {
            self.swap_tenors.insert(j, tenor);
            self.swap_lengths.insert(j, l);
            for row in self.layers.iter_mut().flatten() {
                row.insert(j, 0.0);
            }
        }
        self.state = CacheState::Stale;
        Ok(())
    }

    /// Rebuild the layer interpolators if the data changed.
    ///
    /// # Errors
    ///
    /// Interpolator construction failure.
    pub fn ensure_fresh(&mut self) -> Result<(), CubeError> {
        if self.state == CacheState::Fresh {
            return Ok(());
        }
        self.interpolators = self
            .layers
            .iter()
            .map(|layer| {
                BilinearInterpolator::from_rows(&self.option_times, &self.swap_lengths, layer.clone())
                    .map(|interp| interp.with_extrapolation(self.extrapolation))
            })
            .collect::<Result<_, _>>()?;
        self.state = CacheState::Fresh;
        Ok(())
    }

    /// Values of every layer at `(option_time, swap_length)`.
    ///
    /// # Errors
    ///
    /// * `CubeError::StaleInterpolators` - data changed since `ensure_fresh`
    /// * `CubeError::Interpolation` - outside the grid without extrapolation
    pub fn interpolate(&self, option_time: f64, swap_length: f64) -> Result<Vec<f64>, CubeError> {
        if self.state == CacheState::Stale {
            return Err(CubeError::StaleInterpolators);
        }
        self.interpolators
            .iter()
            .map(|interp| Ok(interp.interpolate(option_time, swap_length)?))
            .collect()
    }

    /// [`GridCube::ensure_fresh`] followed by [`GridCube::interpolate`].
    pub fn evaluate(&mut self, option_time: f64, swap_length: f64) -> Result<Vec<f64>, CubeError> {
        self.ensure_fresh()?;
        self.interpolate(option_time, swap_length)
    }

    /// Every layer stacked row-wise into one `(n_layers·rows) × cols` matrix.
    pub fn browse(&self) -> DMatrix<f64> {
        let rows = self.rows();
        DMatrix::from_fn(self.n_layers() * rows, self.cols(), |r, c| {
            self.layers[r / rows][r % rows][c]
        })
    }

    /// Option dates of the rows.
    pub fn option_dates(&self) -> &[Date] {
        &self.option_dates
    }

    /// Swap tenors of the columns.
    pub fn swap_tenors(&self) -> &[Period] {
        &self.swap_tenors
    }

    /// Option times of the rows.
    pub fn option_times(&self) -> &[f64] {
        &self.option_times
    }

    /// Swap lengths of the columns.
    pub fn swap_lengths(&self) -> &[f64] {
        &self.swap_lengths
    }

    /// Layer matrices, indexed `[layer][row][col]`.
    pub fn layers(&self) -> &[Vec<Vec<f64>>] {
        &self.layers
    }

    /// Number of layers.
    pub fn n_layers(&self) -> usize {
        self.layers.len()
    }

    /// Number of option rows.
    pub fn rows(&self) -> usize {
        self.option_times.len()
    }

    /// Number of swap columns.
    pub fn cols(&self) -> usize {
        self.swap_lengths.len()
    }

    /// Interpolator cache state.
    pub fn state(&self) -> CacheState {
        self.state
    }

    /// Whether queries outside the grid are extrapolated.
    pub fn allows_extrapolation(&self) -> bool {
        self.extrapolation
    }

    fn check_shape(&self, matrix: &[Vec<f64>]) -> Result<(), CubeError> {
        let (rows, cols) = (self.rows(), self.cols());
        if matrix.len() != rows || matrix.iter().any(|r| r.len() != cols) {
            return Err(CubeError::DimensionMismatch {
                expected: format!("{rows}x{cols}"),
                got: format!(
                    "{}x{}",
                    matrix.len(),
                    matrix.first().map_or(0, |r| r.len())
                ),
            });
        }
        Ok(())
    }
}

fn check_axis(name: &str, axis: &[f64]) -> Result<(), CubeError> {
    if axis.len() < 2 {
        return Err(CubeError::InvalidGrid(format!(
            "{name} need at least 2 points, got {}",
            axis.len()
        )));
    }
    if let Some(k) = axis.windows(2).position(|w| !(w[0] < w[1])) {
        return Err(CubeError::InvalidGrid(format!(
            "{name} not strictly increasing at index {}",
            k + 1
        )));
    }
    Ok(())
}

fn check_index(what: &'static str, index: usize, len: usize) -> Result<(), CubeError> {
    if index < len {
        Ok(())
    } else {
        Err(CubeError::IndexOutOfRange { what, index, len })
    }
}

fn check_insertion(name: &str, axis: &[f64], index: usize, value: f64) -> Result<(), CubeError> {
    let after_prev = index == 0 || axis[index - 1] < value;
    let before_next = index == axis.len() || value < axis[index];
    if after_prev && before_next {
        Ok(())
    } else {
        Err(CubeError::InvalidGrid(format!(
            "{name} {value} does not fit at index {index}"
        )))
    }
}
