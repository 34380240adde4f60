//! Swaption volatility cubes.
//!
//! # Components
//!
//! - [`GridCube`]: layered (option time × swap length) grid with bilinear
//!   interpolation per layer
//! - [`VolSpreadQuotes`]: shared vol-spread quotes over ATM
//! - [`SpreadVolCube`]: ATM volatility plus interpolated spreads
//! - [`SabrVolCube`]: SABR fitted per quoted node, interpolated in
//!   parameter space and optionally recalibrated to ATM
//! - [`CubeConfig`]: fit, extrapolation and ATM recalibration settings
//!
//! Both volatility cubes watch the epochs of their quotes and rebuild on
//! the next query after any quote changes.

mod config;
mod error;
mod grid;
mod quotes;
mod sabr_cube;
mod spread_cube;

pub use config::CubeConfig;
pub use error::CubeError;
pub use grid::{CacheState, GridCube};
pub use quotes::VolSpreadQuotes;
pub use sabr_cube::{CalibratedCube, ParameterLayer, SabrVolCube};
pub use spread_cube::SpreadVolCube;
