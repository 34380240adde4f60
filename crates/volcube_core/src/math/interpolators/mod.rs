//! Interpolation methods used by the cube layers and smile sections.
//!
//! ## Available Interpolators
//!
//! - [`LinearInterpolator`]: Piecewise linear interpolation with an
//!   [`Extrapolation`] policy
//! - [`BilinearInterpolator`]: 2D grid interpolation with optional linear
//!   extrapolation from the edge cells
//!
//! Both are generic over `T: num_traits::Float`.
//!
//! ## Example
//!
//! ```
//! use volcube_core::math::interpolators::{Interpolator, LinearInterpolator};
//!
//! let interp = LinearInterpolator::new(&[0.0, 1.0, 2.0, 3.0], &[0.0, 1.0, 4.0, 9.0]).unwrap();
//! assert_eq!(interp.domain(), (0.0, 3.0));
//! assert!((interp.interpolate(1.5).unwrap() - 2.5_f64).abs() < 1e-10);
//! ```

mod bilinear;
mod linear;
mod traits;

pub use bilinear::BilinearInterpolator;
pub use linear::LinearInterpolator;
pub use traits::{Extrapolation, Interpolator};
