//! Versioned market quotes.
//!
//! A [`SimpleQuote`] carries a value and an epoch counter that moves on
//! every update. Calibrators record the epochs they consumed in an
//! [`EpochSnapshot`] and recompute only when a later snapshot differs,
//! which replaces observer notification with an explicit pull.

use super::error::MarketDataError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A market quote with a version counter.
///
/// Values are stored as `f64` bits in an atomic, so quotes can be shared
/// across threads through `Arc` and updated without locking. A NaN value
/// marks the quote as unset.
///
/// ```
/// use volcube_core::market_data::SimpleQuote;
///
/// let quote = SimpleQuote::shared(0.01);
/// let before = quote.epoch();
/// quote.set_value(0.012);
/// assert_eq!(quote.value(), 0.012);
/// assert!(quote.epoch() > before);
/// ```
#[derive(Debug)]
pub struct SimpleQuote {
    bits: AtomicU64,
    epoch: AtomicU64,
}

impl SimpleQuote {
    /// Create a quote with an initial value.
    pub fn new(value: f64) -> Self {
        Self {
            bits: AtomicU64::new(value.to_bits()),
            epoch: AtomicU64::new(0),
        }
    }

    /// Create a quote wrapped in an `Arc` for sharing.
    pub fn shared(value: f64) -> Arc<Self> {
        Arc::new(Self::new(value))
    }

    /// Current value.
    #[inline]
    pub fn value(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Current value, or an error naming the quote when it is unset.
    pub fn checked_value(&self, name: impl FnOnce() -> String) -> Result<f64, MarketDataError> {
        let v = self.value();
        if v.is_finite() {
            Ok(v)
        } else {
            Err(MarketDataError::InvalidQuote(name()))
        }
    }

    /// Whether the quote holds a finite value.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.value().is_finite()
    }

    /// Store a new value and advance the epoch; returns the new epoch.
    pub fn set_value(&self, value: f64) -> u64 {
        self.bits.store(value.to_bits(), Ordering::Release);
        self.epoch.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Number of updates applied so far.
    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }
}

/// Epochs of an ordered set of quotes at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EpochSnapshot(Vec<u64>);

impl EpochSnapshot {
    /// Record the current epoch of every quote, in iteration order.
    pub fn capture<'a, I>(quotes: I) -> Self
    where
        I: IntoIterator<Item = &'a Arc<SimpleQuote>>,
    {
        Self(quotes.into_iter().map(|q| q.epoch()).collect())
    }

    /// Number of quotes recorded.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no quote was recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
