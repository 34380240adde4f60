//! Closed-form option pricing used by smile sections and smile fitting.
//!
//! - [`black`]: Black price and vega on a forward
//! - [`distributions`]: standard normal CDF and PDF

pub mod black;
pub mod distributions;
pub mod error;

pub use black::{black_formula, black_vega, OptionType};
pub use distributions::{norm_cdf, norm_pdf};
pub use error::AnalyticalError;
