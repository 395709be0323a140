//! # Temporal Types — UTC-Only Timestamps
//!
//! `Timestamp` stamps publications, slash records, and head transition
//! records. It is always UTC and truncated to whole seconds, so two records
//! created in the same second compare equal and serialize identically.
//!
//! Non-UTC string inputs are rejected at parse time.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RaidError;

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// From a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse an RFC 3339 string. Only the `Z` suffix is accepted.
    pub fn parse(s: &str) -> Result<Self, RaidError> {
        if !s.ends_with('Z') {
            return Err(RaidError::Timestamp(format!(
                "timestamp must use Z suffix (UTC only), got: {s:?}"
            )));
        }
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|e| RaidError::Timestamp(format!("invalid RFC 3339 timestamp {s:?}: {e}")))?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// From Unix epoch seconds.
    pub fn from_epoch_secs(secs: i64) -> Result<Self, RaidError> {
        DateTime::from_timestamp(secs, 0)
            .map(Self)
            .ok_or_else(|| RaidError::Timestamp(format!("invalid Unix timestamp: {secs}")))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Unix epoch seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Render as `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_now_has_no_subseconds() {
        assert_eq!(Timestamp::now().as_datetime().nanosecond(), 0);
    }

    #[test]
    fn test_from_utc_truncates() {
        let dt = Utc.with_ymd_and_hms(2026, 3, 1, 8, 15, 30).unwrap();
        let ts = Timestamp::from_utc(dt.with_nanosecond(999_000_000).unwrap());
        assert_eq!(ts.to_iso8601(), "2026-03-01T08:15:30Z");
    }

    #[test]
    fn test_parse_rejects_offsets() {
        assert!(Timestamp::parse("2026-03-01T08:15:30+00:00").is_err());
        assert!(Timestamp::parse("2026-03-01T08:15:30-04:00").is_err());
        assert!(Timestamp::parse("garbage").is_err());
    }

    #[test]
    fn test_parse_z_truncates_subseconds() {
        let ts = Timestamp::parse("2026-03-01T08:15:30.250Z").unwrap();
        assert_eq!(ts.to_string(), "2026-03-01T08:15:30Z");
    }

    #[test]
    fn test_epoch_roundtrip() {
        let ts = Timestamp::from_epoch_secs(1_780_000_000).unwrap();
        assert_eq!(ts.epoch_secs(), 1_780_000_000);
    }

    #[test]
    fn test_ordering() {
        let a = Timestamp::from_epoch_secs(10).unwrap();
        let b = Timestamp::from_epoch_secs(11).unwrap();
        assert!(a < b);
    }
}
