//! Timestamp and directory-name codec.
//!
//! Snapshot directories are named `v<version>_<timestamp>`. Two timestamp
//! encodings exist on disk:
//!
//! | Format | Example | Written |
//! |--------|---------|---------|
//! | compact | `20250114-093005` | yes |
//! | legacy | `2025-01-14T09-30-05-123Z` | read only |
//!
//! Metadata files carry RFC 3339 timestamps; [`parse_lenient`] accepts all
//! three so a hand-edited descriptor still loads.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use std::fmt;

const COMPACT_FORMAT: &str = "%Y%m%d-%H%M%S";

/// On-disk timestamp encoding of a snapshot directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFormat {
    Compact,
    Legacy,
}

/// Encode a timestamp in the canonical compact form.
pub fn encode(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(COMPACT_FORMAT).to_string()
}

/// Decode a directory-name timestamp in either supported form.
pub fn decode(raw: &str) -> Option<(DateTime<Utc>, TimestampFormat)> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, COMPACT_FORMAT) {
        return Some((Utc.from_utc_datetime(&naive), TimestampFormat::Compact));
    }
    decode_legacy(raw).map(|ts| (ts, TimestampFormat::Legacy))
}

/// Legacy names are ISO-8601 with `:` and `.` replaced by `-`.
fn decode_legacy(raw: &str) -> Option<DateTime<Utc>> {
    let bytes = raw.as_bytes();
    if bytes.len() < 20 || bytes.get(10) != Some(&b'T') {
        return None;
    }

    let mut restored = raw.to_string();
    for (position, replacement) in [(13, ":"), (16, ":"), (19, ".")] {
        if restored.get(position..position + 1) != Some("-") {
            return None;
        }
        restored.replace_range(position..position + 1, replacement);
    }

    DateTime::parse_from_rfc3339(&restored)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Parse a metadata timestamp: RFC 3339, compact or legacy.
pub fn parse_lenient(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .ok()
        .or_else(|| decode(raw).map(|(ts, _)| ts))
}

/// Format a metadata timestamp.
pub fn to_metadata(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Name of a snapshot storage directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotDirName {
    pub version: u32,
    pub timestamp: DateTime<Utc>,
    pub format: TimestampFormat,
}

impl SnapshotDirName {
    /// A canonical (compact) directory name.
    pub fn new(version: u32, timestamp: DateTime<Utc>) -> Self {
        Self {
            version,
            timestamp,
            format: TimestampFormat::Compact,
        }
    }

    /// Parse `v<version>_<timestamp>`.
    pub fn parse(name: &str) -> Option<Self> {
        let rest = name.strip_prefix('v')?;
        let (version, timestamp) = rest.split_once('_')?;
        let version: u32 = version.parse().ok()?;
        if version == 0 {
            return None;
        }
        let (timestamp, format) = decode(timestamp)?;

        Some(Self {
            version,
            timestamp,
            format,
        })
    }
}

impl fmt::Display for SnapshotDirName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}_{}", self.version, encode(&self.timestamp))
    }
}

/// Serde adapter writing RFC 3339 and reading any supported form.
pub(crate) mod rfc3339 {
    use chrono::{DateTime, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_metadata(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_lenient(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

/// Optional variant of [`rfc3339`].
pub(crate) mod rfc3339_option {
    use chrono::{DateTime, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        ts: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => serializer.serialize_some(&super::to_metadata(ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => super::parse_lenient(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}"))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn sample() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 14, 9, 30, 5).unwrap()
    }

    #[test]
    fn test_compact_encoding() {
        assert_eq!(encode(&sample()), "20250114-093005");
        assert_eq!(
            decode("20250114-093005"),
            Some((sample(), TimestampFormat::Compact))
        );
    }

    #[test]
    fn test_legacy_decoding() {
        let (ts, format) = decode("2025-01-14T09-30-05-123Z").unwrap();
        assert_eq!(format, TimestampFormat::Legacy);
        assert_eq!(ts.with_nanosecond(0).unwrap(), sample());
        assert_eq!(ts.nanosecond(), 123_000_000);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(decode("yesterday").is_none());
        assert!(decode("2025-01-14T09:30:05.123Z").is_none());
        assert!(decode("20251314-093005").is_none());
    }

    #[test]
    fn test_lenient_parsing_accepts_every_form() {
        assert_eq!(parse_lenient("2025-01-14T09:30:05Z"), Some(sample()));
        assert_eq!(parse_lenient("2025-01-14T10:30:05+01:00"), Some(sample()));
        assert_eq!(parse_lenient("20250114-093005"), Some(sample()));
        assert!(parse_lenient("2025-01-14T09-30-05-000Z").is_some());
        assert!(parse_lenient("not a time").is_none());
    }

    #[test]
    fn test_both_encodings_normalize_to_comparable_times() {
        let legacy = SnapshotDirName::parse("v1_2025-01-14T09-30-05-000Z").unwrap();
        let compact = SnapshotDirName::parse("v2_20250114-093006").unwrap();
        assert!(legacy.timestamp < compact.timestamp);
    }

    #[test]
    fn test_dir_name_round_trip() {
        let name = SnapshotDirName::new(12, sample());
        assert_eq!(name.to_string(), "v12_20250114-093005");
        assert_eq!(SnapshotDirName::parse("v12_20250114-093005"), Some(name));
    }

    #[test]
    fn test_dir_name_parses_legacy_and_rewrites_compact() {
        let name = SnapshotDirName::parse("v3_2025-01-14T09-30-05-123Z").unwrap();
        assert_eq!(name.version, 3);
        assert_eq!(name.format, TimestampFormat::Legacy);
        assert_eq!(name.to_string(), "v3_20250114-093005");
    }

    #[test]
    fn test_dir_name_rejects_other_directories() {
        assert!(SnapshotDirName::parse(".staging-v3").is_none());
        assert!(SnapshotDirName::parse("v0_20250114-093005").is_none());
        assert!(SnapshotDirName::parse("vx_20250114-093005").is_none());
        assert!(SnapshotDirName::parse("v3").is_none());
        assert!(SnapshotDirName::parse("backup").is_none());
    }

    #[test]
    fn test_metadata_format_uses_millis() {
        assert_eq!(to_metadata(&sample()), "2025-01-14T09:30:05.000Z");
    }
}
