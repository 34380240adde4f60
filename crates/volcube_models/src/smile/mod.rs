//! Volatility smile sections.
//!
//! [`SmileSection`] is the single type handed to consumers; its variants
//! wrap an [`InterpolatedSmileSection`] (quoted or spread smiles) or a
//! [`SabrSmileSection`].

mod error;
mod interpolated;
mod sabr;
mod section;

pub use error::SmileError;
pub use interpolated::InterpolatedSmileSection;
pub use sabr::SabrSmileSection;
pub use section::SmileSection;
