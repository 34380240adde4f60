//! Forward-rate market-model inputs and caplet-coterminal calibration.
//!
//! # Components
//!
//! - [`EvolutionDescription`]: rate times and evolution steps
//! - [`PiecewiseConstantVariance`]: per-step variance of a rate
//!   ([`FlatVolatilityVariance`], [`AbcdVariance`])
//! - [`CorrelationStructure`]: per-step factor loadings
//!   ([`ExponentialForwardCorrelation`])
//! - [`CurveState`]: forwards, discount ratios, coterminal annuities and swap
//!   rates ([`LmmCurveState`])
//! - [`caplet_coterminal_calibration`]: pseudo-roots matching coterminal
//!   swaption variances and caplet volatilities
//!
//! The module does not depend on the volatility cubes.

mod coterminal;
mod correlation;
mod curve_state;
mod error;
mod evolution;
mod variance;

pub use coterminal::{
    caplet_coterminal_calibration, covariance_from_pseudo_roots, CoterminalCalibration,
    CoterminalSolution, VarianceDiagnostics,
};
pub use correlation::{CorrelationStructure, ExponentialForwardCorrelation};
pub use curve_state::{CurveState, LmmCurveState};
pub use error::CoterminalError;
pub use evolution::EvolutionDescription;
pub use variance::{Abcd, AbcdVariance, FlatVolatilityVariance, PiecewiseConstantVariance};
