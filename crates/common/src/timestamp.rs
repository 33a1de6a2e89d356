//! Timestamp utilities.

use chrono::{DateTime, Datelike, SecondsFormat, SubsecRound, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A UTC instant at whole-second precision with consistent serialization.
///
/// Serialized as RFC 3339 with a `Z` suffix, e.g. `2025-03-01T12:00:00Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a new timestamp from the current time.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Create a timestamp from a DateTime<Utc>, dropping sub-second precision.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Timestamp(dt.trunc_subsecs(0))
    }

    /// Get the inner DateTime<Utc>.
    pub fn inner(&self) -> DateTime<Utc> {
        self.0
    }

    /// Format as ISO 8601 string.
    pub fn to_iso8601(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Parse an RFC 3339 string.
    pub fn parse(s: &str) -> crate::Result<Self> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self::from_datetime(dt.with_timezone(&Utc)))
            .map_err(|e| crate::Error::Other(format!("invalid timestamp {:?}: {}", s, e)))
    }

    /// Calendar fields `(year, month, day, hour, minute, second)`.
    pub fn calendar_parts(&self) -> (i32, u32, u32, u32, u32, u32) {
        (
            self.0.year(),
            self.0.month(),
            self.0.day(),
            self.0.hour(),
            self.0.minute(),
            self.0.second(),
        )
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_iso8601())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Timestamp::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed() -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 5).unwrap())
    }

    #[test]
    fn test_timestamp_serialization() {
        let ts = Timestamp::now();
        let json = serde_json::to_string(&ts).unwrap();
        let parsed: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, parsed);
    }

    #[test]
    fn test_second_precision_format() {
        let ts = Timestamp::from_datetime(
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 5).unwrap()
                + chrono::Duration::milliseconds(750),
        );
        assert_eq!(ts.to_iso8601(), "2025-03-01T12:30:05Z");
        assert_eq!(serde_json::to_string(&ts).unwrap(), "\"2025-03-01T12:30:05Z\"");
    }

    #[test]
    fn test_calendar_parts() {
        assert_eq!(fixed().calendar_parts(), (2025, 3, 1, 12, 30, 5));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Timestamp::parse("yesterday").is_err());
    }
}
