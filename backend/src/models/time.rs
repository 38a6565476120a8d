//! Wall-clock time handling for the single business timezone.
//!
//! All appointment times are naive local date-times; the engine never converts
//! between zones. Intervals are half-open: `[start, end)`.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Build a clock time from hour and minute, clamping invalid input to midnight.
pub fn clock(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// Parse a clock time written as `HH:MM` or `HH:MM:SS`.
pub fn parse_clock_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

/// Parse a business-local date-time.
///
/// Accepts ISO-8601 without an offset (`2024-03-04T10:00`, with optional seconds
/// and fraction), a space-separated variant, or RFC 3339 with an offset. When an
/// offset is present the wall-clock portion is kept as written.
pub fn parse_business_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    const FORMATS: [&str; 5] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_local())
        })
}

/// Serde adapter writing clock times as `HH:MM`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_clock_time(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid clock time '{}'", raw)))
    }
}

/// Half-open wall-clock interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Window starting at `start` and lasting `duration_minutes`.
    pub fn from_start(start: NaiveDateTime, duration_minutes: u32) -> Self {
        Self {
            start,
            end: start + Duration::minutes(i64::from(duration_minutes)),
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    /// Half-open overlap test: `a.start < b.end && a.end > b.start`.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Free minutes between two windows regardless of their order.
    ///
    /// Negative when the windows overlap (the value is minus the overlap length).
    pub fn gap_minutes(&self, other: &TimeWindow) -> i64 {
        if self.end <= other.start {
            (other.start - self.end).num_minutes()
        } else if other.end <= self.start {
            (self.start - other.end).num_minutes()
        } else {
            let overlap_start = self.start.max(other.start);
            let overlap_end = self.end.min(other.end);
            -(overlap_end - overlap_start).num_minutes()
        }
    }

    /// The same window moved by `minutes` (negative moves earlier).
    pub fn shifted(&self, minutes: i64) -> Self {
        Self {
            start: self.start + Duration::minutes(minutes),
            end: self.end + Duration::minutes(minutes),
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}-{}",
            self.start.format("%Y-%m-%d"),
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// Daily opening hours shared by every technician.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessHours {
    #[serde(with = "hhmm")]
    pub open: NaiveTime,
    #[serde(with = "hhmm")]
    pub close: NaiveTime,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            open: clock(7, 0),
            close: clock(19, 0),
        }
    }
}

impl BusinessHours {
    pub fn opening_on(&self, day: NaiveDate) -> NaiveDateTime {
        day.and_time(self.open)
    }

    pub fn closing_on(&self, day: NaiveDate) -> NaiveDateTime {
        day.and_time(self.close)
    }

    /// True when the whole window lies inside the opening hours of its start day.
    ///
    /// Ending exactly at closing time is allowed.
    pub fn contains(&self, window: &TimeWindow) -> bool {
        let day = window.date();
        window.end > window.start
            && window.start >= self.opening_on(day)
            && window.end <= self.closing_on(day)
    }
}
