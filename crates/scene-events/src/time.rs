//! Scene Time Types
//!
//! Scene time is a Julian date split into a whole day number and the seconds
//! elapsed within that day, so frame-sized steps never lose precision.
//!
//! # Example
//!
//! ```
//! use scene_events::JulianDate;
//!
//! let t = JulianDate::new(2451545, 43200.0);
//! assert_eq!(t.to_string(), "jd_2451545+43200.000");
//! assert_eq!(t.add_seconds(50_000.0).day_number, 2451546);
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Number of seconds in one Julian day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Julian day number of the J2000 epoch (2000-01-01 12:00 TT).
pub const J2000_DAY_NUMBER: i64 = 2_451_545;

/// A point in scene time.
///
/// Serializes to strings like "jd_2451545+43200.000".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JulianDate {
    /// Whole Julian day number.
    pub day_number: i64,
    /// Seconds into the day, always in `[0, SECONDS_PER_DAY)`.
    pub seconds_of_day: f64,
}

impl JulianDate {
    /// Creates a date, carrying any overflow of `seconds_of_day` into the day number.
    pub fn new(day_number: i64, seconds_of_day: f64) -> Self {
        let carry = (seconds_of_day / SECONDS_PER_DAY).floor();
        let mut seconds = seconds_of_day - carry * SECONDS_PER_DAY;
        let mut day = day_number + carry as i64;
        // floor() can leave seconds == SECONDS_PER_DAY after rounding
        if seconds >= SECONDS_PER_DAY {
            seconds -= SECONDS_PER_DAY;
            day += 1;
        }
        Self {
            day_number: day,
            seconds_of_day: seconds,
        }
    }

    /// The J2000 epoch.
    pub fn j2000() -> Self {
        Self::new(J2000_DAY_NUMBER, 0.0)
    }

    /// Returns a new date `seconds` later (or earlier, if negative).
    pub fn add_seconds(&self, seconds: f64) -> Self {
        Self::new(self.day_number, self.seconds_of_day + seconds)
    }

    /// Seconds from `earlier` to `self`.
    pub fn seconds_since(&self, earlier: &JulianDate) -> f64 {
        (self.day_number - earlier.day_number) as f64 * SECONDS_PER_DAY
            + (self.seconds_of_day - earlier.seconds_of_day)
    }

    /// Total days as a single float. Lossy, for display and coarse math only.
    pub fn total_days(&self) -> f64 {
        self.day_number as f64 + self.seconds_of_day / SECONDS_PER_DAY
    }
}

impl Default for JulianDate {
    fn default() -> Self {
        Self::j2000()
    }
}

impl PartialOrd for JulianDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.day_number.cmp(&other.day_number) {
            Ordering::Equal => self.seconds_of_day.partial_cmp(&other.seconds_of_day),
            ord => Some(ord),
        }
    }
}

impl fmt::Display for JulianDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "jd_{}+{:.3}", self.day_number, self.seconds_of_day)
    }
}

/// Error type for parsing a JulianDate from a string.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseTimeError {
    InvalidFormat(String),
    InvalidDay(String),
    InvalidSeconds(String),
}

impl fmt::Display for ParseTimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseTimeError::InvalidFormat(s) => {
                write!(f, "invalid time format: '{}', expected 'jd_DAY+SECONDS'", s)
            }
            ParseTimeError::InvalidDay(s) => write!(f, "invalid day number: '{}'", s),
            ParseTimeError::InvalidSeconds(s) => write!(f, "invalid seconds: '{}'", s),
        }
    }
}

impl std::error::Error for ParseTimeError {}

impl FromStr for JulianDate {
    type Err = ParseTimeError;

    /// Parses a date from "jd_2451545+43200.000". The seconds part is optional.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .trim()
            .strip_prefix("jd_")
            .ok_or_else(|| ParseTimeError::InvalidFormat(s.to_string()))?;

        let (day_part, seconds_part) = match body.split_once('+') {
            Some((day, seconds)) => (day, Some(seconds)),
            None => (body, None),
        };

        let day_number = day_part
            .parse::<i64>()
            .map_err(|_| ParseTimeError::InvalidDay(day_part.to_string()))?;

        let seconds = match seconds_part {
            Some(part) => {
                let value = part
                    .parse::<f64>()
                    .map_err(|_| ParseTimeError::InvalidSeconds(part.to_string()))?;
                if !value.is_finite() || value < 0.0 {
                    return Err(ParseTimeError::InvalidSeconds(part.to_string()));
                }
                value
            }
            None => 0.0,
        };

        Ok(JulianDate::new(day_number, seconds))
    }
}

// Serialize as a string so scene files stay readable
impl Serialize for JulianDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for JulianDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A closed interval of scene time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: JulianDate,
    pub stop: JulianDate,
}

impl TimeInterval {
    /// Creates a new interval.
    pub fn new(start: JulianDate, stop: JulianDate) -> Self {
        Self { start, stop }
    }

    /// Returns true if `time` lies within the interval, endpoints included.
    pub fn contains(&self, time: &JulianDate) -> bool {
        *time >= self.start && *time <= self.stop
    }
}
