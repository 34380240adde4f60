//! Piecewise linear interpolation with configurable extrapolation.

use super::traits::{check_increasing, out_of_bounds, segment_index};
use super::{Extrapolation, Interpolator};
use crate::types::InterpolationError;
use num_traits::Float;

/// Piecewise linear interpolator over strictly increasing abscissae.
///
/// Smile sections use it to interpolate standard deviations in strike,
/// with flat extrapolation for quoted smiles and linear extrapolation for
/// spread smiles.
///
/// # Example
///
/// ```
/// use volcube_core::math::interpolators::{Extrapolation, Interpolator, LinearInterpolator};
///
/// let interp = LinearInterpolator::new(&[0.0, 1.0, 2.0], &[0.0, 2.0, 4.0])
///     .unwrap()
///     .with_extrapolation(Extrapolation::Flat);
/// assert!((interp.interpolate(0.5).unwrap() - 1.0_f64).abs() < 1e-12);
/// assert_eq!(interp.interpolate(5.0).unwrap(), 4.0);
/// ```
#[derive(Debug, Clone)]
pub struct LinearInterpolator<T: Float> {
    xs: Vec<T>,
    ys: Vec<T>,
    extrapolation: Extrapolation,
}

impl<T: Float> LinearInterpolator<T> {
    /// Construct a linear interpolator from x and y data points.
    ///
    /// # Returns
    ///
    /// * `Err(InterpolationError::InvalidInput)` - Mismatched array lengths
    /// * `Err(InterpolationError::InsufficientData)` - Fewer than 2 data points
    /// * `Err(InterpolationError::NonMonotonicData)` - `xs` not strictly increasing
    pub fn new(xs: &[T], ys: &[T]) -> Result<Self, InterpolationError> {
        if xs.len() != ys.len() {
            return Err(InterpolationError::InvalidInput(format!(
                "xs and ys must have same length: got {} and {}",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() < 2 {
            return Err(InterpolationError::InsufficientData {
                got: xs.len(),
                need: 2,
            });
        }
        check_increasing(xs)?;

        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            extrapolation: Extrapolation::None,
        })
    }

    /// Sets the extrapolation policy.
    pub fn with_extrapolation(mut self, extrapolation: Extrapolation) -> Self {
        self.extrapolation = extrapolation;
        self
    }

    /// Extrapolation policy in force.
    #[inline]
    pub fn extrapolation(&self) -> Extrapolation {
        self.extrapolation
    }

    /// Abscissae.
    #[inline]
    pub fn xs(&self) -> &[T] {
        &self.xs
    }

    /// Ordinates.
    #[inline]
    pub fn ys(&self) -> &[T] {
        &self.ys
    }

    /// Number of data points.
    #[inline]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Always false for a constructed interpolator.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }
}

impl<T: Float> Interpolator<T> for LinearInterpolator<T> {
    fn interpolate(&self, x: T) -> Result<T, InterpolationError> {
        let (x_min, x_max) = self.domain();
        let n = self.xs.len();

        if x < x_min || x > x_max {
            match self.extrapolation {
                Extrapolation::None => return Err(out_of_bounds(x, x_min, x_max)),
                Extrapolation::Flat => {
                    return Ok(if x < x_min { self.ys[0] } else { self.ys[n - 1] });
                }
                Extrapolation::Linear => {}
            }
        }

        let i = segment_index(&self.xs, x);
        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);
        let t = (x - x0) / (x1 - x0);
        Ok(y0 + (y1 - y0) * t)
    }

    #[inline]
    fn domain(&self) -> (T, T) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // ========================================
    // Construction Tests
    // ========================================

    #[test]
    fn test_new_insufficient_data() {
        let result = LinearInterpolator::new(&[1.0], &[2.0]);
        assert_eq!(
            result.unwrap_err(),
            InterpolationError::InsufficientData { got: 1, need: 2 }
        );
    }

    #[test]
    fn test_new_mismatched_lengths() {
        match LinearInterpolator::new(&[0.0, 1.0, 2.0], &[0.0, 1.0]).unwrap_err() {
            InterpolationError::InvalidInput(msg) => assert!(msg.contains("same length")),
            other => panic!("Expected InvalidInput error, got {other:?}"),
        }
    }

    #[test]
    fn test_new_rejects_unsorted() {
        let result = LinearInterpolator::new(&[0.0, 2.0, 1.0], &[0.0, 1.0, 2.0]);
        assert_eq!(
            result.unwrap_err(),
            InterpolationError::NonMonotonicData { index: 2 }
        );
    }

    // ========================================
    // Interpolation Tests
    // ========================================

    #[test]
    fn test_interpolate_at_knots_is_exact() {
        let ys = [0.3, 0.25, 0.21, 0.22];
        let interp = LinearInterpolator::new(&[0.01, 0.02, 0.03, 0.05], &ys).unwrap();
        for (x, y) in [0.01, 0.02, 0.03, 0.05].iter().zip(ys.iter()) {
            assert_eq!(interp.interpolate(*x).unwrap(), *y);
        }
    }

    #[test]
    fn test_interpolate_midpoint() {
        let interp = LinearInterpolator::new(&[0.0, 1.0, 2.0], &[0.0, 2.0, 6.0]).unwrap();
        assert_relative_eq!(interp.interpolate(1.5).unwrap(), 4.0);
    }

    #[test]
    fn test_out_of_bounds_without_extrapolation() {
        let interp = LinearInterpolator::new(&[0.0, 1.0], &[0.0, 1.0]).unwrap();
        match interp.interpolate(1.5).unwrap_err() {
            InterpolationError::OutOfBounds { x, min, max } => {
                assert_eq!((x, min, max), (1.5, 0.0, 1.0));
            }
            other => panic!("Expected OutOfBounds error, got {other:?}"),
        }
    }

    // ========================================
    // Extrapolation Tests
    // ========================================

    #[test]
    fn test_flat_extrapolation() {
        let interp = LinearInterpolator::new(&[1.0, 2.0], &[3.0, 5.0])
            .unwrap()
            .with_extrapolation(Extrapolation::Flat);
        assert_eq!(interp.interpolate(0.0).unwrap(), 3.0);
        assert_eq!(interp.interpolate(10.0).unwrap(), 5.0);
    }

    #[test]
    fn test_linear_extrapolation() {
        let interp = LinearInterpolator::new(&[1.0, 2.0, 3.0], &[3.0, 5.0, 6.0])
            .unwrap()
            .with_extrapolation(Extrapolation::Linear);
        assert_relative_eq!(interp.interpolate(0.0).unwrap(), 1.0);
        assert_relative_eq!(interp.interpolate(5.0).unwrap(), 8.0);
    }

    #[test]
    fn test_with_f32() {
        let interp = LinearInterpolator::new(&[0.0_f32, 1.0], &[0.0_f32, 2.0]).unwrap();
        assert!((interp.interpolate(0.25).unwrap() - 0.5).abs() < 1e-6);
    }
}
