//! Smile calibration.
//!
//! [`SabrSmileFitter`] fits SABR parameters to a single quoted smile; the
//! cube calibrators in `volcube_optimiser` run one fit per quoted node.

mod error;
mod sabr;

pub use error::FitError;
pub use sabr::{ParameterFlags, SabrFitConfig, SabrFitResult, SabrGuess, SabrSmileFitter};
