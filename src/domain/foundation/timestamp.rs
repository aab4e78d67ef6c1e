//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
///
/// Serialized as integer milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(#[serde(with = "chrono::serde::ts_milliseconds")] DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Creates a timestamp from Unix milliseconds.
    ///
    /// Out-of-range values fall back to the Unix epoch.
    pub fn from_millis(millis: i64) -> Self {
        Self(Utc.timestamp_millis_opt(millis).single().unwrap_or_default())
    }

    /// Returns the timestamp as Unix milliseconds.
    pub fn as_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Checks if this timestamp is after another.
    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Returns the duration from another timestamp to this one.
    ///
    /// Returns negative duration if other is after self.
    pub fn duration_since(&self, other: &Timestamp) -> Duration {
        self.0.signed_duration_since(other.0)
    }

    /// Milliseconds elapsed from `earlier` to this timestamp (negative if
    /// `earlier` is actually later).
    pub fn millis_since(&self, earlier: &Timestamp) -> i64 {
        self.duration_since(earlier).num_milliseconds()
    }

    /// Creates a new timestamp by adding the specified number of milliseconds.
    ///
    /// Negative values subtract.
    pub fn plus_millis(&self, millis: i64) -> Self {
        Self(self.0 + Duration::milliseconds(millis))
    }

    /// Creates a new timestamp by adding the specified number of seconds.
    pub fn plus_secs(&self, secs: i64) -> Self {
        Self(self.0 + Duration::seconds(secs))
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_now_creates_current_time() {
        let before = Utc::now();
        let ts = Timestamp::now();
        let after = Utc::now();

        assert!(ts.as_datetime() >= &before);
        assert!(ts.as_datetime() <= &after);
    }

    #[test]
    fn timestamp_from_millis_roundtrips() {
        let ts = Timestamp::from_millis(1_705_276_800_123);
        assert_eq!(ts.as_millis(), 1_705_276_800_123);
    }

    #[test]
    fn timestamp_serializes_as_integer_millis() {
        let ts = Timestamp::from_millis(1_705_276_800_000);
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "1705276800000");

        let parsed: Timestamp = serde_json::from_str("1705276800000").unwrap();
        assert_eq!(parsed, ts);
    }

    #[test]
    fn timestamp_ordering_works() {
        let ts1 = Timestamp::from_millis(1_000);
        let ts2 = ts1.plus_millis(1);

        assert!(ts1 < ts2);
        assert!(ts1.is_before(&ts2));
        assert!(ts2.is_after(&ts1));
    }

    #[test]
    fn millis_since_is_signed() {
        let a = Timestamp::from_millis(10_000);
        let b = Timestamp::from_millis(12_500);

        assert_eq!(b.millis_since(&a), 2_500);
        assert_eq!(a.millis_since(&b), -2_500);
    }

    #[test]
    fn plus_secs_adds_correctly() {
        let ts = Timestamp::from_millis(1_000).plus_secs(60);
        assert_eq!(ts.as_millis(), 61_000);
    }
}
