//! Core time and error types.
//!
//! This module provides:
//! - `time`: `Date`, `Period`, `TimeUnit` and `DayCountConvention`
//! - `error`: Structured error types for date, interpolation and solver operations
//!
//! Commonly used types are re-exported at this module level.

pub mod error;
pub mod time;

pub use error::{DateError, InterpolationError, SolverError};
pub use time::{Date, DayCountConvention, Period, TimeUnit};
