//! Numerical building blocks: interpolation and solvers.
//!
//! - [`interpolators`]: 1-D linear and 2-D bilinear interpolation with
//!   optional extrapolation
//! - [`solvers`]: Brent root-finding and Levenberg-Marquardt least squares

pub mod interpolators;
pub mod solvers;
