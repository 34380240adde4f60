//! # volcube_models: Smile Models and Smile Fitting
//!
//! ## Layer 2 (Models) Role
//!
//! Builds on `volcube_core` and provides:
//! - Black price and vega on a forward (`analytical`)
//! - SABR parameters and the Hagan lognormal expansion (`models`)
//! - Smile sections: quoted, additive-spread and SABR, behind one
//!   [`smile::SmileSection`] enum (`smile`)
//! - Per-smile SABR fitting by Levenberg-Marquardt (`calibration`)
//!
//! ## Usage Example
//!
//! ```rust
//! use volcube_models::calibration::{SabrFitConfig, SabrSmileFitter};
//! use volcube_models::smile::SmileSection;
//!
//! let strikes = vec![0.02, 0.025, 0.03, 0.035, 0.04];
//! let vols = [0.27, 0.245, 0.23, 0.222, 0.219];
//! let t: f64 = 2.0;
//! let std_devs: Vec<f64> = vols.iter().map(|v| v * t.sqrt()).collect();
//!
//! let quoted = SmileSection::quoted(t, 0.03, strikes.clone(), std_devs).unwrap();
//! let fitter = SabrSmileFitter::new(SabrFitConfig::default().with_fixed_beta(0.5));
//! let fit = fitter.fit(t, 0.03, &strikes, &vols).unwrap();
//!
//! let sabr = SmileSection::sabr(t, 0.03, fit.params).unwrap();
//! let diff = sabr.volatility(0.03).unwrap() - quoted.volatility(0.03).unwrap();
//! assert!(diff.abs() < 5e-3);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): Serialisation for parameters and fit configuration

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod analytical;
pub mod calibration;
pub mod models;
pub mod smile;
