//! Bilinear 2D interpolation on rectangular grids.

use super::traits::{check_increasing, out_of_bounds, segment_index};
use crate::types::InterpolationError;
use num_traits::Float;

/// Bilinear interpolator for 2D grid data.
///
/// The grid is stored as `zs[i][j] = z(xs[i], ys[j])`: rows follow the x
/// axis (option times on a cube layer) and columns the y axis (swap
/// lengths). With extrapolation enabled, queries outside the grid use the
/// nearest edge cell and extend it linearly.
///
/// Evaluating exactly at a node returns the stored value bit for bit.
///
/// # Example
///
/// ```
/// use volcube_core::math::interpolators::BilinearInterpolator;
///
/// let xs = [0.0, 1.0, 2.0];
/// let ys = [0.0, 1.0];
/// let zs = [&[0.0, 1.0][..], &[2.0, 3.0][..], &[4.0, 5.0][..]];
///
/// let interp = BilinearInterpolator::new(&xs, &ys, &zs).unwrap();
/// assert!((interp.interpolate(0.5, 0.5).unwrap() - 1.5_f64).abs() < 1e-12);
/// assert!(interp.interpolate(3.0, 0.5).is_err());
///
/// let extended = interp.with_extrapolation(true);
/// assert!((extended.interpolate(3.0, 0.5).unwrap() - 6.5_f64).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct BilinearInterpolator<T: Float> {
    xs: Vec<T>,
    ys: Vec<T>,
    zs: Vec<Vec<T>>,
    extrapolate: bool,
}

impl<T: Float> BilinearInterpolator<T> {
    /// Construct a bilinear interpolator from grid data.
    ///
    /// # Returns
    ///
    /// * `Err(InterpolationError::InsufficientData)` - Fewer than 2 points on an axis
    /// * `Err(InterpolationError::NonMonotonicData)` - An axis is not strictly increasing
    /// * `Err(InterpolationError::InvalidInput)` - Grid dimensions don't match axis lengths
    pub fn new(xs: &[T], ys: &[T], zs: &[&[T]]) -> Result<Self, InterpolationError> {
        Self::from_rows(xs, ys, zs.iter().map(|row| row.to_vec()).collect())
    }

    /// Construct from owned rows, avoiding the copy made by [`Self::new`].
    pub fn from_rows(xs: &[T], ys: &[T], zs: Vec<Vec<T>>) -> Result<Self, InterpolationError> {
        for axis in [xs, ys] {
            if axis.len() < 2 {
                return Err(InterpolationError::InsufficientData {
                    got: axis.len(),
                    need: 2,
                });
            }
            check_increasing(axis)?;
        }

        if zs.len() != xs.len() {
            return Err(InterpolationError::InvalidInput(format!(
                "Grid rows ({}) must match x-axis length ({})",
                zs.len(),
                xs.len()
            )));
        }
        if let Some((i, row)) = zs.iter().enumerate().find(|(_, r)| r.len() != ys.len()) {
            return Err(InterpolationError::InvalidInput(format!(
                "Grid row {} length ({}) must match y-axis length ({})",
                i,
                row.len(),
                ys.len()
            )));
        }

        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            zs,
            extrapolate: false,
        })
    }

    /// Enables or disables linear extrapolation beyond the grid.
    pub fn with_extrapolation(mut self, extrapolate: bool) -> Self {
        self.extrapolate = extrapolate;
        self
    }

    /// Whether out-of-grid queries are extrapolated.
    #[inline]
    pub fn allows_extrapolation(&self) -> bool {
        self.extrapolate
    }

    /// Interpolate value at point (x, y).
    ///
    /// ```text
    /// z = (1-u)(1-v)*z00 + u*(1-v)*z10 + (1-u)*v*z01 + u*v*z11
    /// ```
    ///
    /// where `u` and `v` are the normalised coordinates within the grid cell.
    /// Outside the grid `u` and `v` leave `[0, 1]` when extrapolating.
    ///
    /// # Returns
    ///
    /// * `Err(InterpolationError::OutOfBounds)` - (x, y) outside the grid and
    ///   extrapolation disabled
    pub fn interpolate(&self, x: T, y: T) -> Result<T, InterpolationError> {
        if !self.extrapolate {
            let (x_min, x_max) = self.domain_x();
            if x < x_min || x > x_max {
                return Err(out_of_bounds(x, x_min, x_max));
            }
            let (y_min, y_max) = self.domain_y();
            if y < y_min || y > y_max {
                return Err(out_of_bounds(y, y_min, y_max));
            }
        }

        let i = segment_index(&self.xs, x);
        let j = segment_index(&self.ys, y);

        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[j], self.ys[j + 1]);

        let z00 = self.zs[i][j];
        let z10 = self.zs[i + 1][j];
        let z01 = self.zs[i][j + 1];
        let z11 = self.zs[i + 1][j + 1];

        let u = (x - x0) / (x1 - x0);
        let v = (y - y0) / (y1 - y0);

        let one = T::one();
        Ok((one - u) * (one - v) * z00 + u * (one - v) * z10 + (one - u) * v * z01 + u * v * z11)
    }

    /// Grid range along x.
    #[inline]
    pub fn domain_x(&self) -> (T, T) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    /// Grid range along y.
    #[inline]
    pub fn domain_y(&self) -> (T, T) {
        (self.ys[0], self.ys[self.ys.len() - 1])
    }

    /// X-axis coordinates.
    #[inline]
    pub fn xs(&self) -> &[T] {
        &self.xs
    }

    /// Y-axis coordinates.
    #[inline]
    pub fn ys(&self) -> &[T] {
        &self.ys
    }

    /// Grid values.
    #[inline]
    pub fn zs(&self) -> &[Vec<T>] {
        &self.zs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn grid() -> BilinearInterpolator<f64> {
        let xs = [0.0, 1.0, 3.0];
        let ys = [1.0, 2.0, 5.0];
        let zs = [
            &[0.10, 0.12, 0.15][..],
            &[0.20, 0.21, 0.25][..],
            &[0.30, 0.33, 0.31][..],
        ];
        BilinearInterpolator::new(&xs, &ys, &zs).unwrap()
    }

    // ========================================
    // Construction Tests
    // ========================================

    #[test]
    fn test_new_insufficient_axis() {
        let zs = [&[1.0, 2.0][..]];
        let result = BilinearInterpolator::new(&[0.0], &[0.0, 1.0], &zs);
        assert_eq!(
            result.unwrap_err(),
            InterpolationError::InsufficientData { got: 1, need: 2 }
        );
    }

    #[test]
    fn test_new_row_mismatch() {
        let zs = [&[1.0, 2.0][..], &[3.0][..]];
        match BilinearInterpolator::new(&[0.0, 1.0], &[0.0, 1.0], &zs).unwrap_err() {
            InterpolationError::InvalidInput(msg) => assert!(msg.contains("row 1")),
            other => panic!("Expected InvalidInput error, got {other:?}"),
        }
    }

    #[test]
    fn test_new_non_increasing_axis() {
        let zs = [&[1.0, 2.0][..], &[3.0, 4.0][..]];
        let result = BilinearInterpolator::new(&[1.0, 1.0], &[0.0, 1.0], &zs);
        assert_eq!(
            result.unwrap_err(),
            InterpolationError::NonMonotonicData { index: 1 }
        );
    }

    // ========================================
    // Interpolation Tests
    // ========================================

    #[test]
    fn test_nodes_are_exact() {
        let interp = grid();
        for (i, &x) in interp.xs().iter().enumerate() {
            for (j, &y) in interp.ys().iter().enumerate() {
                assert_eq!(interp.interpolate(x, y).unwrap(), interp.zs()[i][j]);
            }
        }
    }

    #[test]
    fn test_cell_centre() {
        let interp = grid();
        let expected = (0.10 + 0.12 + 0.20 + 0.21) / 4.0;
        assert_relative_eq!(interp.interpolate(0.5, 1.5).unwrap(), expected, epsilon = 1e-15);
    }

    #[test]
    fn test_out_of_bounds() {
        let interp = grid();
        assert!(interp.interpolate(-0.1, 2.0).is_err());
        assert!(interp.interpolate(1.0, 5.5).is_err());
    }

    // ========================================
    // Extrapolation Tests
    // ========================================

    #[test]
    fn test_extrapolation_extends_edge_cell() {
        let interp = grid().with_extrapolation(true);
        // Along x beyond 3.0 on the y = 1.0 edge: slope (0.30 - 0.20) / 2.0
        assert_relative_eq!(interp.interpolate(5.0, 1.0).unwrap(), 0.40, epsilon = 1e-14);
        // Along y below 1.0 on the x = 0.0 edge: slope 0.02 per unit
        assert_relative_eq!(interp.interpolate(0.0, 0.0).unwrap(), 0.08, epsilon = 1e-14);
    }

    proptest! {
        #[test]
        fn prop_inside_cell_bounded_by_corners(u in 0.0..=1.0_f64, v in 0.0..=1.0_f64) {
            let interp = grid();
            let z = interp.interpolate(u, 1.0 + v).unwrap();
            let lo = 0.10_f64.min(0.12).min(0.20).min(0.21);
            let hi = 0.10_f64.max(0.12).max(0.20).max(0.21);
            prop_assert!(z >= lo - 1e-15 && z <= hi + 1e-15);
        }

        #[test]
        fn prop_extrapolated_matches_interpolated_inside(x in 0.0..=3.0_f64, y in 1.0..=5.0_f64) {
            let plain = grid();
            let extended = grid().with_extrapolation(true);
            prop_assert_eq!(plain.interpolate(x, y).unwrap(), extended.interpolate(x, y).unwrap());
        }
    }
}
