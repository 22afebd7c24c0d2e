//! Time and timestamp helpers.
//!
//! Rules speak two notions of time: absolute UTC [`Timestamp`]s for
//! bookkeeping (`last_triggered`, history) and local [`WallTime`]s for
//! time-of-day windows and schedules. [`EvaluationTime`] ties the two
//! together for one tick.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDateTime, NaiveTime, Offset, Timelike, Utc, Weekday,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// UTC timestamp used for `last_triggered`, trigger events, snapshots, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// A local wall-clock time with minute precision, written `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WallTime(NaiveTime);

impl WallTime {
    /// Build a wall time from an hour (0–23) and a minute (0–59).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidWallTime`] when either part is out of range.
    pub fn new(hour: u32, minute: u32) -> Result<Self, ValidationError> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Self)
            .ok_or_else(|| ValidationError::InvalidWallTime(format!("{hour}:{minute}")))
    }

    /// Truncate a [`NaiveTime`] to the minute.
    #[must_use]
    pub fn from_time(time: NaiveTime) -> Self {
        Self(time.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(time))
    }

    #[must_use]
    pub fn hour(self) -> u32 {
        self.0.hour()
    }

    #[must_use]
    pub fn minute(self) -> u32 {
        self.0.minute()
    }
}

impl fmt::Display for WallTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for WallTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidWallTime(s.to_string());
        let (hour, minute) = s.split_once(':').ok_or_else(invalid)?;
        if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
            return Err(invalid());
        }
        if !hour.bytes().chain(minute.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let hour: u32 = hour.parse().map_err(|_| invalid())?;
        let minute: u32 = minute.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).map_err(|_| invalid())
    }
}

impl Serialize for WallTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WallTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The instant a tick evaluates at, together with the local UTC offset
/// used for every time condition in that tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationTime {
    now: Timestamp,
    offset: FixedOffset,
}

impl EvaluationTime {
    #[must_use]
    pub fn new(now: Timestamp, offset: FixedOffset) -> Self {
        Self { now, offset }
    }

    /// Evaluate with the local wall clock equal to UTC.
    #[must_use]
    pub fn utc(now: Timestamp) -> Self {
        Self::new(now, Utc.fix())
    }

    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.now
    }

    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Local date and time of this instant.
    #[must_use]
    pub fn local(&self) -> NaiveDateTime {
        self.to_local(self.now)
    }

    /// Local wall-clock time of this instant, truncated to the minute.
    #[must_use]
    pub fn wall_time(&self) -> WallTime {
        WallTime::from_time(self.local().time())
    }

    #[must_use]
    pub fn weekday(&self) -> Weekday {
        self.local().weekday()
    }

    /// Whether `other` falls into the same local minute as this instant.
    #[must_use]
    pub fn same_local_minute(&self, other: Timestamp) -> bool {
        let here = self.local();
        let there = self.to_local(other);
        here.date() == there.date()
            && here.hour() == there.hour()
            && here.minute() == there.minute()
    }

    fn to_local(&self, ts: Timestamp) -> NaiveDateTime {
        ts.with_timezone(&self.offset).naive_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 5, 17, h, m, s).unwrap()
    }

    #[test]
    fn should_return_current_utc_time() {
        let before = Utc::now();
        let ts = now();
        let after = Utc::now();
        assert!(ts >= before);
        assert!(ts <= after);
    }

    #[test]
    fn should_parse_and_display_wall_time() {
        let t: WallTime = "06:05".parse().unwrap();
        assert_eq!(t.hour(), 6);
        assert_eq!(t.minute(), 5);
        assert_eq!(t.to_string(), "06:05");
    }

    #[test]
    fn should_accept_single_digit_hour() {
        let t: WallTime = "6:30".parse().unwrap();
        assert_eq!(t.to_string(), "06:30");
    }

    #[test]
    fn should_reject_malformed_wall_times() {
        for raw in [
            "", "24:00", "12:60", "12", "12:5", "ab:cd", "123:00", "+6:30", "06:+5", " 6:30",
        ] {
            assert!(
                raw.parse::<WallTime>().is_err(),
                "{raw:?} should not parse"
            );
        }
    }

    #[test]
    fn should_reject_signed_wall_time_when_deserializing() {
        let raw = serde_json::json!("+6:30");
        assert!(serde_json::from_value::<WallTime>(raw).is_err());
    }

    #[test]
    fn should_serialize_wall_time_as_string() {
        let t = WallTime::new(22, 0).unwrap();
        assert_eq!(serde_json::to_value(t).unwrap(), serde_json::json!("22:00"));
        let parsed: WallTime = serde_json::from_value(serde_json::json!("22:00")).unwrap();
        assert_eq!(parsed, t);
    }

    #[test]
    fn should_fail_to_deserialize_invalid_wall_time() {
        let result: Result<WallTime, _> = serde_json::from_value(serde_json::json!("25:00"));
        assert!(result.is_err());
    }

    #[test]
    fn should_shift_wall_time_by_offset() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let time = EvaluationTime::new(at(23, 30, 0), offset);
        assert_eq!(time.wall_time().to_string(), "01:30");
        assert_eq!(time.weekday(), Weekday::Sat);
    }

    #[test]
    fn should_truncate_seconds_from_wall_time() {
        let time = EvaluationTime::utc(at(6, 0, 59));
        assert_eq!(time.wall_time(), WallTime::new(6, 0).unwrap());
    }

    #[test]
    fn should_detect_same_local_minute() {
        let time = EvaluationTime::utc(at(6, 0, 40));
        assert!(time.same_local_minute(at(6, 0, 0)));
        assert!(!time.same_local_minute(at(5, 59, 59)));
        assert!(!time.same_local_minute(at(6, 1, 0)));
    }
}
