//! Analysis timeframes (`24h`, `7d`, `2w`) and the concrete windows they span.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const HOURS_PER_DAY: u32 = 24;
const HOURS_PER_WEEK: u32 = 24 * 7;
const MAX_HOURS: u32 = 30 * HOURS_PER_DAY;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeframeError {
    #[error("timeframe is empty")]
    Empty,

    #[error("invalid timeframe \"{0}\": expected a positive amount followed by h, d, or w (e.g. 24h, 7d)")]
    InvalidFormat(String),

    #[error("timeframe must be greater than zero")]
    Zero,

    #[error("timeframe exceeds the maximum of {max_days} days")]
    TooLong { max_days: u32 },
}

/// A relative analysis span, stored as whole hours.
///
/// Serializes as its canonical label, so `24h` and `1d` are the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timeframe {
    hours: u32,
}

impl Timeframe {
    pub const ONE_DAY: Self = Self {
        hours: HOURS_PER_DAY,
    };

    /// Parse `<amount><unit>` where unit is `h`, `d`, or `w` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`TimeframeError`] for empty, malformed, zero, or over-long input.
    pub fn parse(raw: &str) -> Result<Self, TimeframeError> {
        let trimmed = raw.trim().to_ascii_lowercase();
        if trimmed.is_empty() {
            return Err(TimeframeError::Empty);
        }

        let Some(unit) = trimmed.chars().last() else {
            return Err(TimeframeError::Empty);
        };
        let amount = &trimmed[..trimmed.len() - unit.len_utf8()];
        let multiplier = match unit {
            'h' => 1,
            'd' => HOURS_PER_DAY,
            'w' => HOURS_PER_WEEK,
            _ => return Err(TimeframeError::InvalidFormat(raw.to_string())),
        };

        if amount.is_empty() || !amount.chars().all(|c| c.is_ascii_digit()) {
            return Err(TimeframeError::InvalidFormat(raw.to_string()));
        }

        let too_long = TimeframeError::TooLong {
            max_days: MAX_HOURS / HOURS_PER_DAY,
        };
        let amount: u32 = amount.parse().map_err(|_| too_long.clone())?;
        if amount == 0 {
            return Err(TimeframeError::Zero);
        }

        let hours = amount.checked_mul(multiplier).ok_or(too_long.clone())?;
        if hours > MAX_HOURS {
            return Err(too_long);
        }

        Ok(Self { hours })
    }

    #[must_use]
    pub fn from_hours(hours: u32) -> Option<Self> {
        (1..=MAX_HOURS).contains(&hours).then_some(Self { hours })
    }

    #[must_use]
    pub fn hours(self) -> u32 {
        self.hours
    }

    #[must_use]
    pub fn span(self) -> TimeDelta {
        TimeDelta::hours(i64::from(self.hours))
    }

    /// Canonical label using the largest unit that divides the span evenly.
    #[must_use]
    pub fn label(self) -> String {
        if self.hours % HOURS_PER_WEEK == 0 {
            format!("{}w", self.hours / HOURS_PER_WEEK)
        } else if self.hours % HOURS_PER_DAY == 0 {
            format!("{}d", self.hours / HOURS_PER_DAY)
        } else {
            format!("{}h", self.hours)
        }
    }

    /// The window of this span that ends at `end`.
    #[must_use]
    pub fn window_ending_at(self, end: DateTime<Utc>) -> Window {
        Window {
            start: end - self.span(),
            end,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for Timeframe {
    type Err = TimeframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Timeframe {
    type Error = TimeframeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Timeframe> for String {
    fn from(value: Timeframe) -> Self {
        value.label()
    }
}

/// A bounded interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    #[must_use]
    pub fn midpoint(&self) -> DateTime<Utc> {
        self.start + (self.end - self.start) / 2
    }

    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }

    /// Split at the midpoint into `[start, mid)` and `[mid, end]`.
    #[must_use]
    pub fn halves(&self) -> (Window, Window) {
        let mid = self.midpoint();
        (
            Window {
                start: self.start,
                end: mid,
            },
            Window {
                start: mid,
                end: self.end,
            },
        )
    }
}
