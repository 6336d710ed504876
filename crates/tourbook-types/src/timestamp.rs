//! Absolute UTC instants with a fixed millisecond precision.
//!
//! [`Timestamp`] is the only time type the store and the query layer
//! handle. Strings appear only at the persistence boundary, through
//! [`Timestamp::to_iso`] and [`Timestamp::parse_iso`]. Sub-millisecond
//! precision is dropped on construction so that formatting and parsing
//! back always yields the same instant.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, SecondsFormat, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A UTC instant truncated to whole milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current instant, read from the system clock.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Wrap a [`DateTime`], dropping anything finer than a millisecond.
    pub fn from_datetime(value: DateTime<Utc>) -> Self {
        Self(value.trunc_subsecs(3))
    }

    /// Build a timestamp from calendar fields interpreted as UTC.
    ///
    /// Returns `None` when the fields do not name a valid instant.
    pub fn from_ymd_hms(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        min: u32,
        sec: u32,
    ) -> Option<Self> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .single()
            .map(Self)
    }

    /// Parse an ISO-8601 / RFC 3339 string carrying an explicit offset.
    ///
    /// Offsets other than `Z` are converted to UTC.
    pub fn parse_iso(value: &str) -> Result<Self, chrono::ParseError> {
        let parsed = DateTime::parse_from_rfc3339(value)?;
        Ok(Self::from_datetime(parsed.with_timezone(&Utc)))
    }

    /// Format as `YYYY-MM-DDTHH:MM:SS.sssZ`.
    pub fn to_iso(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Return the inner [`DateTime`].
    pub const fn into_inner(self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self::from_datetime(value)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso())
    }
}

impl FromStr for Timestamp {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_iso(s)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse_iso(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn formats_with_millis_and_zulu() {
        let ts = Timestamp::from_ymd_hms(2999, 1, 1, 20, 0, 0).unwrap();
        assert_eq!(ts.to_iso(), "2999-01-01T20:00:00.000Z");
    }

    #[test]
    fn parse_normalizes_offsets_to_utc() {
        let ts = Timestamp::parse_iso("2024-06-01T22:30:00+02:00").unwrap();
        assert_eq!(ts.to_iso(), "2024-06-01T20:30:00.000Z");
    }

    #[test]
    fn sub_millisecond_precision_is_dropped() {
        let base = Timestamp::from_ymd_hms(2024, 3, 1, 12, 0, 0).unwrap().into_inner();
        let ts = Timestamp::from_datetime(base + Duration::nanoseconds(1_234_567));
        assert_eq!(ts.to_iso(), "2024-03-01T12:00:00.001Z");
    }

    #[test]
    fn iso_text_round_trips_exactly() {
        let now = Timestamp::now();
        let restored = Timestamp::parse_iso(&now.to_iso()).unwrap();
        assert_eq!(restored, now);
    }

    #[test]
    fn rejects_text_without_offset() {
        assert!(Timestamp::parse_iso("2024-03-01T12:00:00").is_err());
        assert!(Timestamp::parse_iso("yesterday").is_err());
    }

    #[test]
    fn invalid_calendar_fields_yield_none() {
        assert!(Timestamp::from_ymd_hms(2023, 2, 30, 0, 0, 0).is_none());
    }

    #[test]
    fn serde_uses_iso_strings() {
        let ts = Timestamp::from_ymd_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2020-01-01T00:00:00.000Z\"");
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
        assert!(serde_json::from_str::<Timestamp>("12345").is_err());
    }
}
