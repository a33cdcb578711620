// crates/rgma-core/src/time.rs
// ============================================================================
// Module: R-GMA Time Intervals
// Description: Non-negative time intervals with unit conversion.
// Purpose: Express retention periods, query intervals and timeouts in seconds.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`TimeInterval`] is stored as whole seconds. The server reads every
//! interval as a signed 32-bit integer, so construction rejects any interval
//! whose seconds value would exceed `i32::MAX`.
//! Invariants:
//! - The stored value is never negative.
//! - Conversion to a coarser unit truncates toward zero.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::error::RgmaError;

// ============================================================================
// SECTION: Time Units
// ============================================================================

/// Units accepted when building or reading a [`TimeInterval`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    /// One second.
    Seconds,
    /// Sixty seconds.
    Minutes,
    /// 3600 seconds.
    Hours,
    /// 86400 seconds.
    Days,
}

impl TimeUnit {
    /// Returns the number of seconds in one unit.
    #[must_use]
    pub const fn seconds(self) -> i64 {
        match self {
            Self::Seconds => 1,
            Self::Minutes => 60,
            Self::Hours => 60 * 60,
            Self::Days => 24 * 60 * 60,
        }
    }

    /// Returns the lowercase unit label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Time Interval
// ============================================================================

/// Largest interval the server can represent, in seconds.
pub const MAX_INTERVAL_SECONDS: i64 = i32::MAX as i64;

/// Immutable, non-negative length of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct TimeInterval {
    /// Length in seconds, within `0..=MAX_INTERVAL_SECONDS`.
    seconds: i32,
}

impl TimeInterval {
    /// Builds an interval of `value` units.
    ///
    /// # Errors
    ///
    /// Returns a permanent [`RgmaError`] when `value` is negative or the
    /// interval exceeds [`MAX_INTERVAL_SECONDS`].
    pub fn new(value: i64, unit: TimeUnit) -> Result<Self, RgmaError> {
        if value < 0 {
            return Err(RgmaError::permanent("Time interval may not be negative"));
        }
        if value > MAX_INTERVAL_SECONDS / unit.seconds() {
            return Err(RgmaError::permanent(format!(
                "Interval is larger than {MAX_INTERVAL_SECONDS} seconds"
            )));
        }
        let seconds = i32::try_from(value * unit.seconds()).map_err(|_| {
            RgmaError::permanent(format!("Interval is larger than {MAX_INTERVAL_SECONDS} seconds"))
        })?;
        Ok(Self {
            seconds,
        })
    }

    /// Builds an interval measured in seconds.
    ///
    /// # Errors
    ///
    /// Returns a permanent [`RgmaError`] when `seconds` is out of range.
    pub fn from_seconds(seconds: i64) -> Result<Self, RgmaError> {
        Self::new(seconds, TimeUnit::Seconds)
    }

    /// Returns the length in `unit`, truncated toward zero.
    #[must_use]
    pub fn value_as(self, unit: TimeUnit) -> i64 {
        i64::from(self.seconds) / unit.seconds()
    }

    /// Returns the length in seconds as sent on the wire.
    #[must_use]
    pub const fn as_seconds(self) -> i32 {
        self.seconds
    }
}

impl TryFrom<i64> for TimeInterval {
    type Error = RgmaError;

    fn try_from(seconds: i64) -> Result<Self, Self::Error> {
        Self::from_seconds(seconds)
    }
}

impl From<TimeInterval> for i64 {
    fn from(interval: TimeInterval) -> Self {
        Self::from(interval.seconds)
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.seconds)
    }
}
