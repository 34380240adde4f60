//! # volcube_core: Numeric Foundation for Swaption Volatility Cubes
//!
//! ## Layer 1 (Foundation) Role
//!
//! volcube_core is the bottom layer of the workspace, providing:
//! - Time types: `Date`, `Period`, `DayCountConvention` (`types::time`)
//! - Error types: `DateError`, `InterpolationError`, `SolverError` (`types::error`)
//! - Linear and bilinear interpolation with extrapolation (`math::interpolators`)
//! - Brent and Levenberg-Marquardt solvers (`math::solvers`)
//! - Versioned quotes, yield curves, ATM swaption volatility structures and
//!   swap-rate providers (`market_data`)
//!
//! Layer 1 has no dependencies on other volcube_* crates.
//!
//! ## Usage Examples
//!
//! ```rust
//! use volcube_core::math::interpolators::BilinearInterpolator;
//! use volcube_core::types::{Date, DayCountConvention, Period};
//!
//! let reference = Date::from_ymd(2024, 1, 15).unwrap();
//! let expiry = reference.advance("1Y".parse::<Period>().unwrap()).unwrap();
//! let t = DayCountConvention::Act365Fixed.year_fraction(reference, expiry);
//!
//! let layer = BilinearInterpolator::new(
//!     &[0.5, 2.0],
//!     &[1.0, 10.0],
//!     &[&[0.010, 0.012][..], &[0.008, 0.009][..]],
//! )
//! .unwrap();
//! let spread = layer.interpolate(t, 5.0).unwrap();
//! # assert!(spread > 0.008 && spread < 0.012);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): Serialisation for dates, periods, errors and solver configs

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod market_data;
pub mod math;
pub mod types;
