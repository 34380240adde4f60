//! Market data consumed by the cube calibrators.
//!
//! # Components
//!
//! - [`quote`]: versioned quotes ([`SimpleQuote`]) and epoch snapshots
//! - [`curves`]: yield curve trait and a flat curve
//! - [`surfaces`]: ATM swaption volatility structures
//! - [`swap_rates`]: ATM forward swap rates off a curve
//! - [`error`]: market data error type ([`MarketDataError`])
//!
//! # Example
//!
//! ```
//! use volcube_core::market_data::{FlatCurve, SimpleQuote, YieldCurve};
//!
//! let curve = FlatCurve::new(0.05_f64);
//! assert!((curve.discount_factor(1.0).unwrap() - 0.951229).abs() < 1e-5);
//!
//! let spread = SimpleQuote::shared(0.004);
//! assert_eq!(spread.epoch(), 0);
//! ```

pub mod curves;
pub mod error;
pub mod quote;
pub mod surfaces;
pub mod swap_rates;

pub use curves::{FlatCurve, YieldCurve};
pub use error::MarketDataError;
pub use quote::{EpochSnapshot, SimpleQuote};
pub use surfaces::{SwaptionVolatilityMatrix, SwaptionVolatilityStructure};
pub use swap_rates::{CurveSwapRateProvider, SwapRateProvider};
