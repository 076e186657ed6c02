//! # Epoch Conversion
//!
//! Browser history databases store visit times in three incompatible
//! encodings. Everything downstream of the adapters works in canonical
//! UTC; the raw encodings never leave this module and `adapters`.

use chrono::{DateTime, Utc};

/// Seconds between 1601-01-01 and 1970-01-01 (Chromium epoch offset).
pub const CHROMIUM_UNIX_OFFSET_SECS: i64 = 11_644_473_600;

/// Seconds between 1970-01-01 and 2001-01-01 (Apple Core Data epoch offset).
pub const APPLE_UNIX_OFFSET_SECS: i64 = 978_307_200;

/// The reference zero point and unit of a source-native timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochKind {
    /// Microseconds since 1601-01-01T00:00:00Z (Chrome, Brave, Edge, ...).
    Chromium,
    /// Microseconds since 1970-01-01T00:00:00Z (Firefox, Tor, LibreWolf).
    Mozilla,
    /// Seconds, often fractional, since 2001-01-01T00:00:00Z (Safari).
    AppleCoreData,
}

/// A timestamp as a source database stores it, before normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawTimestamp {
    Micros(i64),
    Seconds(f64),
}

impl EpochKind {
    /// Normalize a source-native timestamp to canonical UTC.
    ///
    /// Total for any numeric input: values that land outside the
    /// representable range (notably pre-1970 instants) map to `None`,
    /// the "invalid" sentinel, never to a panic.
    pub fn to_utc(self, raw: RawTimestamp) -> Option<DateTime<Utc>> {
        match (self, raw) {
            (EpochKind::Chromium, RawTimestamp::Micros(us)) => chromium_to_utc(us),
            (EpochKind::Chromium, RawTimestamp::Seconds(s)) => {
                chromium_to_utc(seconds_to_micros(s)?)
            }
            (EpochKind::Mozilla, RawTimestamp::Micros(us)) => mozilla_to_utc(us),
            (EpochKind::Mozilla, RawTimestamp::Seconds(s)) => {
                mozilla_to_utc(seconds_to_micros(s)?)
            }
            (EpochKind::AppleCoreData, RawTimestamp::Seconds(s)) => apple_to_utc(s),
            (EpochKind::AppleCoreData, RawTimestamp::Micros(us)) => {
                apple_to_utc(us as f64 / 1_000_000.0)
            }
        }
    }
}

/// Microseconds since 1601-01-01 to canonical UTC.
pub fn chromium_to_utc(micros: i64) -> Option<DateTime<Utc>> {
    let unix_micros = micros.checked_sub(CHROMIUM_UNIX_OFFSET_SECS.checked_mul(1_000_000)?)?;
    from_unix_micros(unix_micros)
}

/// Microseconds since the Unix epoch to canonical UTC.
pub fn mozilla_to_utc(micros: i64) -> Option<DateTime<Utc>> {
    from_unix_micros(micros)
}

/// Seconds (possibly fractional) since 2001-01-01 to canonical UTC.
pub fn apple_to_utc(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let unix_micros = seconds_to_micros(seconds)?.checked_add(APPLE_UNIX_OFFSET_SECS * 1_000_000)?;
    from_unix_micros(unix_micros)
}

/// Canonical UTC back to the Chromium encoding, for query push-down.
pub fn utc_to_chromium(t: DateTime<Utc>) -> i64 {
    t.timestamp_micros() + CHROMIUM_UNIX_OFFSET_SECS * 1_000_000
}

/// Canonical UTC back to the Mozilla encoding.
pub fn utc_to_mozilla(t: DateTime<Utc>) -> i64 {
    t.timestamp_micros()
}

/// Canonical UTC back to the Apple Core Data encoding.
pub fn utc_to_apple(t: DateTime<Utc>) -> f64 {
    t.timestamp_micros() as f64 / 1_000_000.0 - APPLE_UNIX_OFFSET_SECS as f64
}

fn seconds_to_micros(seconds: f64) -> Option<i64> {
    let micros = seconds * 1_000_000.0;
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(micros.round() as i64)
}

fn from_unix_micros(micros: i64) -> Option<DateTime<Utc>> {
    if micros < 0 {
        return None;
    }
    let secs = micros.div_euclid(1_000_000);
    let nsecs = (micros.rem_euclid(1_000_000) as u32) * 1000;
    DateTime::<Utc>::from_timestamp(secs, nsecs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn chromium_reference_instant() {
        let t = chromium_to_utc(13_385_000_000_000_000).expect("valid");
        assert_eq!(t, Utc.with_ymd_and_hms(2025, 2, 25, 23, 33, 20).unwrap());
    }

    #[test]
    fn chromium_preserves_microseconds() {
        let t = chromium_to_utc(13_385_000_000_000_042).expect("valid");
        assert_eq!(t.timestamp_subsec_micros(), 42);
    }

    #[test]
    fn mozilla_zero_is_unix_epoch() {
        let t = mozilla_to_utc(0).expect("valid");
        assert_eq!(t, Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn apple_zero_is_2001() {
        let t = apple_to_utc(0.0).expect("valid");
        assert_eq!(t, Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn apple_keeps_fractional_seconds() {
        let t = apple_to_utc(0.5).expect("valid");
        assert_eq!(t.timestamp_subsec_micros(), 500_000);
    }

    #[test]
    fn pre_unix_instants_are_invalid() {
        assert!(chromium_to_utc(0).is_none());
        assert!(chromium_to_utc(1_000_000).is_none());
        assert!(mozilla_to_utc(-1).is_none());
        assert!(apple_to_utc(-978_307_201.0).is_none());
    }

    #[test]
    fn non_finite_apple_input_is_invalid() {
        assert!(apple_to_utc(f64::NAN).is_none());
        assert!(apple_to_utc(f64::INFINITY).is_none());
    }

    #[test]
    fn round_trips_through_native_encodings() {
        let t = Utc.with_ymd_and_hms(2025, 6, 9, 14, 30, 15).unwrap();
        assert_eq!(chromium_to_utc(utc_to_chromium(t)), Some(t));
        assert_eq!(mozilla_to_utc(utc_to_mozilla(t)), Some(t));
        assert_eq!(apple_to_utc(utc_to_apple(t)), Some(t));
    }

    #[test]
    fn epoch_kind_dispatch_matches_free_functions() {
        let raw = RawTimestamp::Micros(13_385_000_000_000_000);
        assert_eq!(
            EpochKind::Chromium.to_utc(raw),
            chromium_to_utc(13_385_000_000_000_000)
        );
        assert_eq!(
            EpochKind::AppleCoreData.to_utc(RawTimestamp::Seconds(1.25)),
            apple_to_utc(1.25)
        );
    }
}
