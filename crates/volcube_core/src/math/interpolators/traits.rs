//! Interpolator trait and extrapolation policy.

use crate::types::InterpolationError;
use num_traits::Float;

/// Behaviour of a 1-D interpolator outside its data range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Extrapolation {
    /// Out-of-range queries fail with `InterpolationError::OutOfBounds`.
    #[default]
    None,
    /// Out-of-range queries return the nearest end value.
    Flat,
    /// Out-of-range queries extend the first or last segment.
    Linear,
}

/// Common interface of 1-D interpolators.
pub trait Interpolator<T: Float> {
    /// Interpolated value at `x`.
    fn interpolate(&self, x: T) -> Result<T, InterpolationError>;

    /// Data range `(x_min, x_max)`.
    fn domain(&self) -> (T, T);
}

/// Checks that `xs` is strictly increasing.
pub(crate) fn check_increasing<T: Float>(xs: &[T]) -> Result<(), InterpolationError> {
    match xs.windows(2).position(|w| !(w[0] < w[1])) {
        Some(i) => Err(InterpolationError::NonMonotonicData { index: i + 1 }),
        None => Ok(()),
    }
}

/// Index `i` of the segment `[xs[i], xs[i+1]]` used for `x`, clamped to the
/// first and last segment.
#[inline]
pub(crate) fn segment_index<T: Float>(xs: &[T], x: T) -> usize {
    let pos = xs.partition_point(|&xi| xi <= x);
    pos.saturating_sub(1).min(xs.len() - 2)
}

#[inline]
pub(crate) fn out_of_bounds<T: Float>(x: T, min: T, max: T) -> InterpolationError {
    InterpolationError::OutOfBounds {
        x: x.to_f64().unwrap_or(f64::NAN),
        min: min.to_f64().unwrap_or(f64::NAN),
        max: max.to_f64().unwrap_or(f64::NAN),
    }
}
