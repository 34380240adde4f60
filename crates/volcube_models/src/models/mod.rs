//! Stochastic volatility models.

pub mod sabr;

pub use sabr::{hagan_lognormal_vol, SabrError, SabrParameter, SabrParams};
