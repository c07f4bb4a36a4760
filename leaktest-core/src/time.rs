//! Time range handling for windowed queries

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{LeakTestError, LeakTestResult};

/// A query window over measurement time.
///
/// Closed on both ends when `stop` is present; open toward the most
/// recent data when it is absent. Both bounds are normalized to UTC on
/// construction and the range is built fresh per query, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimeRange {
    /// Start bound (inclusive)
    pub start: DateTime<Utc>,
    /// Stop bound (inclusive); the range is open-ended when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// Create a new time range
    pub fn new(start: DateTime<Utc>, stop: Option<DateTime<Utc>>) -> Self {
        Self { start, stop }
    }

    /// Parse a range from client-supplied bound strings
    pub fn parse(start: &str, stop: Option<&str>) -> LeakTestResult<Self> {
        let start = parse_datetime(start)?;
        let stop = match stop {
            Some(raw) => Some(parse_datetime(raw)?),
            None => None,
        };
        Ok(Self { start, stop })
    }

    /// Check whether a timestamp falls inside the window
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        if timestamp < self.start {
            return false;
        }
        match self.stop {
            Some(stop) => timestamp <= stop,
            None => true,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stop {
            Some(stop) => write!(f, "[{} - {}]", self.start.to_rfc3339(), stop.to_rfc3339()),
            None => write!(f, "[{} - most recent]", self.start.to_rfc3339()),
        }
    }
}

/// Parse a client-supplied timestamp, accepting RFC 3339 or a handful of
/// plain formats interpreted as UTC
pub fn parse_datetime(input: &str) -> LeakTestResult<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight));
        }
    }
    Err(LeakTestError::unhandled(format!(
        "Could not parse '{}' as a timestamp.",
        input
    )))
}
