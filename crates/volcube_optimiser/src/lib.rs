//! # volcube_optimiser: Volatility Cubes and Market-Model Calibration
//!
//! Solves the inverse problems of the workspace: turning sparse swaption
//! smile quotes into a continuous cube, and swaption and caplet
//! volatilities into market-model factor loadings.
//!
//! ## Architecture Position
//!
//! Layer 3 of the workspace. Depends on `volcube_core` (L1) for grids,
//! solvers and market data and on `volcube_models` (L2) for smile sections
//! and SABR fitting.
//!
//! ## Modules
//!
//! - `cube`: layered grid cube, vol-spread quotes, additive-spread cube and
//!   the SABR cube calibrator with lazy, epoch-driven recalibration
//! - `market_model`: evolution, variance, correlation and curve-state
//!   inputs plus the caplet-coterminal pseudo-root calibration
//!
//! The two modules are independent of each other.
//!
//! ## Example
//!
//! ```rust
//! use volcube_optimiser::cube::GridCube;
//! use volcube_core::types::{Date, Period};
//!
//! let reference = Date::from_ymd(2024, 1, 15).unwrap();
//! let dates = vec![
//!     reference.advance("1Y".parse().unwrap()).unwrap(),
//!     reference.advance("2Y".parse().unwrap()).unwrap(),
//! ];
//! let tenors: Vec<Period> = vec!["5Y".parse().unwrap(), "10Y".parse().unwrap()];
//! let mut cube = GridCube::new(dates, tenors, vec![1.0, 2.0], vec![5.0, 10.0], 1, false).unwrap();
//! cube.set_layer(0, vec![vec![0.1, 0.2], vec![0.3, 0.4]]).unwrap();
//! assert!((cube.evaluate(1.5, 7.5).unwrap()[0] - 0.25).abs() < 1e-15);
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel` (default): fit the sparse SABR nodes with rayon
//! - `serde` (default): serialisable cube configuration

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod cube;
pub mod market_model;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cube::*;
    pub use crate::market_model::*;
}
