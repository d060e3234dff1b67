//! Wall-clock access and user-supplied time values.
//!
//! Start and stop times may be given either as a bare time of day, which is
//! pinned to a calendar date once at startup, or as a full timestamp.

use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::ClockError;

const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Current wall-clock time in the local timezone.
///
/// This is a pure query; nothing read here is ever written back into a
/// [`TimeSimulator`](crate::simulator::TimeSimulator).
pub fn real_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// A time given on the command line, in a config file or over the control channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ClockTime {
    TimeOfDay(NaiveTime),
    DateTime(NaiveDateTime),
}

impl ClockTime {
    /// Pins a time of day to `date`; full timestamps are returned unchanged.
    pub fn on(&self, date: NaiveDate) -> NaiveDateTime {
        match *self {
            ClockTime::TimeOfDay(time) => date.and_time(time),
            ClockTime::DateTime(datetime) => datetime,
        }
    }

    /// Pins a time of day to the current local date.
    pub fn today(&self) -> NaiveDateTime {
        self.on(real_now().date())
    }
}

impl FromStr for ClockTime {
    type Err = ClockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(datetime) = DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        {
            return Ok(ClockTime::DateTime(datetime));
        }
        TIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
            .map(ClockTime::TimeOfDay)
            .ok_or_else(|| {
                ClockError::InvalidTime(format!(
                    "'{s}' is neither HH:MM[:SS[.ffffff]] nor YYYY-MM-DDTHH:MM:SS[.ffffff]"
                ))
            })
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ClockError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockTime::TimeOfDay(time) => write!(f, "{}", time.format("%H:%M:%S%.f")),
            ClockTime::DateTime(datetime) => write!(f, "{}", datetime.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}
