//! Yield curves used to compute ATM forward swap rates.
//!
//! - [`YieldCurve`]: discount factor interface with derived zero and forward rates
//! - [`FlatCurve`]: constant continuously compounded rate

mod flat;
mod traits;

pub use flat::FlatCurve;
pub use traits::YieldCurve;
