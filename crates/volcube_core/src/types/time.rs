//! Dates, tenors and day count conventions used to place quotes on the cube axes.
//!
//! This module provides:
//! - `Date`: Type-safe date wrapper around chrono::NaiveDate
//! - `Period` / `TimeUnit`: Tenors such as `1Y`, `6M` or `2W`
//! - `DayCountConvention`: Act/365F, Act/360 and 30/360 year fractions
//!
//! # Examples
//!
//! ```
//! use volcube_core::types::time::{Date, DayCountConvention, Period};
//!
//! let reference = Date::from_ymd(2024, 1, 15).unwrap();
//! let expiry = reference.advance("6M".parse::<Period>().unwrap()).unwrap();
//! assert_eq!(expiry, Date::from_ymd(2024, 7, 15).unwrap());
//!
//! let t = DayCountConvention::Act365Fixed.year_fraction(reference, expiry);
//! assert!((t - 182.0 / 365.0).abs() < 1e-12);
//! ```

use chrono::{Datelike, Days, Months, NaiveDate};
use std::fmt;
use std::ops::Sub;
use std::str::FromStr;

use super::error::DateError;

/// Serial number of 1899-12-30, the epoch used by spreadsheet date serials.
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Type-safe date wrapper around chrono::NaiveDate.
///
/// Ordered, hashable and convertible to a day serial so that dates can be
/// interpolated as numbers.
///
/// ```
/// use volcube_core::types::time::Date;
///
/// let start = Date::from_ymd(2024, 1, 1).unwrap();
/// let end: Date = "2024-01-11".parse().unwrap();
/// assert_eq!(end - start, 10);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Date(NaiveDate);

impl Date {
    /// Creates a Date from year, month, and day components.
    ///
    /// Returns `Err(DateError::InvalidDate)` for impossible dates.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, DateError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Date)
            .ok_or(DateError::InvalidDate { year, month, day })
    }

    /// Parses a date from ISO 8601 format string (YYYY-MM-DD).
    pub fn parse(s: &str) -> Result<Self, DateError> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Date)
            .map_err(|e| DateError::ParseError(format!("{s}: {e}")))
    }

    /// Builds a date from its day serial (days since 1899-12-30).
    pub fn from_serial(serial: i64) -> Result<Self, DateError> {
        let epoch = Self::epoch();
        let shifted = if serial >= 0 {
            epoch.checked_add_days(Days::new(serial as u64))
        } else {
            epoch.checked_sub_days(Days::new(serial.unsigned_abs()))
        };
        shifted
            .map(Date)
            .ok_or_else(|| DateError::Overflow(format!("serial {serial}")))
    }

    /// Day serial of this date (days since 1899-12-30).
    #[inline]
    pub fn serial(&self) -> i64 {
        (self.0 - Self::epoch()).num_days()
    }

    /// Advances the date by a period.
    ///
    /// Month and year arithmetic clamps to the last day of the target month,
    /// so 31 January advanced by one month lands on the last day of February.
    pub fn advance(&self, period: Period) -> Result<Self, DateError> {
        let overflow = || DateError::Overflow(format!("{} + {}", self, period));
        let n = period.length;
        let moved = match period.unit {
            TimeUnit::Days => shift_days(self.0, i64::from(n)),
            TimeUnit::Weeks => shift_days(self.0, 7 * i64::from(n)),
            TimeUnit::Months => shift_months(self.0, n),
            TimeUnit::Years => n.checked_mul(12).and_then(|m| shift_months(self.0, m)),
        };
        moved.map(Date).ok_or_else(overflow)
    }

    /// Returns the underlying NaiveDate.
    #[inline]
    pub fn into_inner(self) -> NaiveDate {
        self.0
    }

    /// Year component.
    #[inline]
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Month component (1-12).
    #[inline]
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Day-of-month component (1-31).
    #[inline]
    pub fn day(&self) -> u32 {
        self.0.day()
    }

    fn epoch() -> NaiveDate {
        let (y, m, d) = SERIAL_EPOCH;
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
    }
}

fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days as u64))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

fn shift_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    if months >= 0 {
        date.checked_add_months(Months::new(months as u32))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    }
}

impl From<NaiveDate> for Date {
    fn from(date: NaiveDate) -> Self {
        Date(date)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for Date {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Date::parse(s)
    }
}

impl Sub for Date {
    type Output = i64;

    /// Number of calendar days from `rhs` to `self`.
    fn sub(self, rhs: Date) -> i64 {
        (self.0 - rhs.0).num_days()
    }
}

/// Unit of a [`Period`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimeUnit {
    /// Calendar days
    Days,
    /// Weeks of seven days
    Weeks,
    /// Calendar months
    Months,
    /// Calendar years
    Years,
}

impl TimeUnit {
    fn suffix(&self) -> char {
        match self {
            TimeUnit::Days => 'D',
            TimeUnit::Weeks => 'W',
            TimeUnit::Months => 'M',
            TimeUnit::Years => 'Y',
        }
    }
}

/// A tenor: a signed length in a time unit.
///
/// Option expiries and swap tenors are quoted as periods (`1M`, `10Y`).
/// Ordering compares the approximate length in years so that tenors in
/// different units sort naturally.
///
/// ```
/// use volcube_core::types::time::{Period, TimeUnit};
///
/// let p: Period = "18M".parse().unwrap();
/// assert_eq!(p, Period::new(18, TimeUnit::Months));
/// assert_eq!(p.to_string(), "18M");
/// assert!((p.years() - 1.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Period {
    length: i32,
    unit: TimeUnit,
}

impl Period {
    /// Creates a period.
    #[inline]
    pub const fn new(length: i32, unit: TimeUnit) -> Self {
        Self { length, unit }
    }

    /// Period of a whole number of months, expressed in years when exact.
    pub fn from_months(months: i32) -> Self {
        if months != 0 && months % 12 == 0 {
            Self::new(months / 12, TimeUnit::Years)
        } else {
            Self::new(months, TimeUnit::Months)
        }
    }

    /// Length in units.
    #[inline]
    pub fn length(&self) -> i32 {
        self.length
    }

    /// Time unit.
    #[inline]
    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Length in months for month/year periods, `None` for day/week periods.
    pub fn months(&self) -> Option<i32> {
        match self.unit {
            TimeUnit::Months => Some(self.length),
            TimeUnit::Years => self.length.checked_mul(12),
            TimeUnit::Days | TimeUnit::Weeks => None,
        }
    }

    /// Approximate length in years (Act/365 for days and weeks).
    pub fn years(&self) -> f64 {
        let n = f64::from(self.length);
        match self.unit {
            TimeUnit::Days => n / 365.0,
            TimeUnit::Weeks => 7.0 * n / 365.0,
            TimeUnit::Months => n / 12.0,
            TimeUnit::Years => n,
        }
    }
}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Period {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.years()
            .total_cmp(&other.years())
            .then_with(|| self.unit.cmp(&other.unit))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.length, self.unit.suffix())
    }
}

impl FromStr for Period {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let unit = match s.chars().last().map(|c| c.to_ascii_uppercase()) {
            Some('D') => TimeUnit::Days,
            Some('W') => TimeUnit::Weeks,
            Some('M') => TimeUnit::Months,
            Some('Y') => TimeUnit::Years,
            _ => return Err(DateError::ParseError(format!("unknown period unit in '{s}'"))),
        };
        // unit letters are ASCII, so the body ends one byte early
        let length = s[..s.len() - 1]
            .parse::<i32>()
            .map_err(|e| DateError::ParseError(format!("{s}: {e}")))?;
        Ok(Period::new(length, unit))
    }
}

impl TryFrom<String> for Period {
    type Error = DateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}

/// Day count conventions for option-time computation.
///
/// ```
/// use volcube_core::types::time::{Date, DayCountConvention};
///
/// let start = Date::from_ymd(2024, 1, 1).unwrap();
/// let end = Date::from_ymd(2024, 7, 1).unwrap();
/// let yf = DayCountConvention::Act360.year_fraction(start, end);
/// assert!((yf - 182.0 / 360.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DayCountConvention {
    /// Actual/365 Fixed
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "ACT/365F"))]
    Act365Fixed,
    /// Actual/360
    #[cfg_attr(feature = "serde", serde(rename = "ACT/360"))]
    Act360,
    /// 30/360 US bond basis
    #[cfg_attr(feature = "serde", serde(rename = "30/360"))]
    Thirty360,
}

impl DayCountConvention {
    /// Returns the standard convention name.
    pub fn name(&self) -> &'static str {
        match self {
            DayCountConvention::Act365Fixed => "ACT/365F",
            DayCountConvention::Act360 => "ACT/360",
            DayCountConvention::Thirty360 => "30/360",
        }
    }

    /// Signed year fraction between two dates; negative when `end < start`.
    pub fn year_fraction(&self, start: Date, end: Date) -> f64 {
        match self {
            DayCountConvention::Act365Fixed => (end - start) as f64 / 365.0,
            DayCountConvention::Act360 => (end - start) as f64 / 360.0,
            DayCountConvention::Thirty360 => {
                if end < start {
                    return -self.year_fraction(end, start);
                }
                let d1 = start.day().min(30);
                let d2 = if end.day() == 31 && d1 == 30 { 30 } else { end.day() };
                let days = 360 * (end.year() - start.year())
                    + 30 * (end.month() as i32 - start.month() as i32)
                    + (d2 as i32 - d1 as i32);
                f64::from(days) / 360.0
            }
        }
    }
}

impl fmt::Display for DayCountConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DayCountConvention {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACT/365F" | "ACT/365" | "ACT365F" => Ok(DayCountConvention::Act365Fixed),
            "ACT/360" | "ACT360" => Ok(DayCountConvention::Act360),
            "30/360" | "30360" => Ok(DayCountConvention::Thirty360),
            other => Err(DateError::ParseError(format!(
                "unknown day count convention '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // ========================================
    // Date Tests
    // ========================================

    #[test]
    fn test_from_ymd_rejects_invalid() {
        assert!(Date::from_ymd(2024, 2, 29).is_ok());
        assert_eq!(
            Date::from_ymd(2023, 2, 29),
            Err(DateError::InvalidDate {
                year: 2023,
                month: 2,
                day: 29
            })
        );
    }

    #[test]
    fn test_parse_and_display() {
        let d: Date = "2024-06-15".parse().unwrap();
        assert_eq!(d.to_string(), "2024-06-15");
        assert!(Date::parse("15/06/2024").is_err());
    }

    #[test]
    fn test_serial_roundtrip() {
        let d = Date::from_ymd(2024, 1, 1).unwrap();
        assert_eq!(d.serial(), 45292);
        assert_eq!(Date::from_serial(45292).unwrap(), d);
        assert_eq!(Date::from_serial(0).unwrap(), Date::from_ymd(1899, 12, 30).unwrap());
    }

    #[test]
    fn test_advance_months_clamps_to_month_end() {
        let d = Date::from_ymd(2024, 1, 31).unwrap();
        let next = d.advance(Period::new(1, TimeUnit::Months)).unwrap();
        assert_eq!(next, Date::from_ymd(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_advance_days_weeks_years() {
        let d = Date::from_ymd(2024, 3, 1).unwrap();
        assert_eq!(
            d.advance(Period::new(-1, TimeUnit::Days)).unwrap(),
            Date::from_ymd(2024, 2, 29).unwrap()
        );
        assert_eq!(
            d.advance(Period::new(2, TimeUnit::Weeks)).unwrap(),
            Date::from_ymd(2024, 3, 15).unwrap()
        );
        assert_eq!(
            d.advance(Period::new(10, TimeUnit::Years)).unwrap(),
            Date::from_ymd(2034, 3, 1).unwrap()
        );
    }

    // ========================================
    // Period Tests
    // ========================================

    #[test]
    fn test_period_parse() {
        assert_eq!("10Y".parse::<Period>().unwrap(), Period::new(10, TimeUnit::Years));
        assert_eq!("3m".parse::<Period>().unwrap(), Period::new(3, TimeUnit::Months));
        assert!("10X".parse::<Period>().is_err());
        assert!("Y".parse::<Period>().is_err());
    }

    #[test]
    fn test_period_from_months_normalises() {
        assert_eq!(Period::from_months(24), Period::new(2, TimeUnit::Years));
        assert_eq!(Period::from_months(18), Period::new(18, TimeUnit::Months));
        assert_eq!(Period::from_months(24).months(), Some(24));
        assert_eq!(Period::new(2, TimeUnit::Weeks).months(), None);
    }

    #[test]
    fn test_period_ordering() {
        let mut tenors: Vec<Period> = ["5Y", "6M", "1Y", "2W"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        tenors.sort();
        let names: Vec<String> = tenors.iter().map(|p| p.to_string()).collect();
        assert_eq!(names, vec!["2W", "6M", "1Y", "5Y"]);
    }

    // ========================================
    // Day Count Tests
    // ========================================

    #[test]
    fn test_year_fraction_signed() {
        let a = Date::from_ymd(2024, 1, 1).unwrap();
        let b = Date::from_ymd(2025, 1, 1).unwrap();
        assert_relative_eq!(DayCountConvention::Act365Fixed.year_fraction(a, b), 366.0 / 365.0);
        assert_relative_eq!(DayCountConvention::Act365Fixed.year_fraction(b, a), -366.0 / 365.0);
    }

    #[test]
    fn test_thirty_360() {
        let a = Date::from_ymd(2024, 1, 31).unwrap();
        let b = Date::from_ymd(2024, 7, 31).unwrap();
        assert_relative_eq!(DayCountConvention::Thirty360.year_fraction(a, b), 0.5);
        assert_relative_eq!(DayCountConvention::Thirty360.year_fraction(b, a), -0.5);
    }

    #[test]
    fn test_day_count_from_str() {
        assert_eq!(
            "act/360".parse::<DayCountConvention>().unwrap(),
            DayCountConvention::Act360
        );
        assert!("ACT/ACT".parse::<DayCountConvention>().is_err());
    }
}
