//! The bundle manifest.
//!
//! The manifest is the single index clients download first. It lists every
//! compressed file with its record count, size and SHA-256 checksum.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// File name of the manifest inside a published bundle.
pub const MANIFEST_FILENAME: &str = "manifest.json";

/// Index of one published bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Calendar date of generation, `YYYY-MM-DD`. Shared by all runs of a day.
    pub version: String,
    /// Precise generation time.
    #[serde(with = "timestamp")]
    pub generated: DateTime<Utc>,
    /// Number of endpoints in the catalog.
    pub endpoints: usize,
    /// Sum of record counts over all files.
    pub total_records: u64,
    /// Sum of compressed sizes, in KB rounded to two decimals.
    pub total_size_kb: f64,
    /// Entries keyed by file name, iterated in sorted order.
    pub files: BTreeMap<String, ManifestEntry>,
}

/// One file listed in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Number of logical records in the file; zero if it could not be decoded.
    pub count: u64,
    /// Content digest of the compressed bytes, `sha256:<hex>`.
    pub checksum: String,
    /// Compressed size in KB rounded to two decimals.
    pub size_kb: f64,
}

impl Manifest {
    /// Look up an entry by file name.
    pub fn entry(&self, filename: &str) -> Option<&ManifestEntry> {
        self.files.get(filename)
    }
}

/// ISO-8601 with an explicit `+00:00` offset and microsecond precision.
mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Micros, false))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Manifest {
        let mut files = BTreeMap::new();
        files.insert(
            "kode.json.gz".to_string(),
            ManifestEntry {
                count: 12,
                checksum: "sha256:abc".to_string(),
                size_kb: 1.5,
            },
        );
        Manifest {
            version: "2026-10-15".to_string(),
            generated: Utc.with_ymd_and_hms(2026, 10, 15, 8, 30, 0).unwrap(),
            endpoints: 25,
            total_records: 12,
            total_size_kb: 1.5,
            files,
        }
    }

    #[test]
    fn serializes_wire_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["version"], "2026-10-15");
        assert_eq!(json["generated"], "2026-10-15T08:30:00.000000+00:00");
        assert_eq!(json["endpoints"], 25);
        assert_eq!(json["total_records"], 12);
        assert_eq!(json["files"]["kode.json.gz"]["checksum"], "sha256:abc");
        assert_eq!(json["files"]["kode.json.gz"]["size_kb"], 1.5);
    }

    #[test]
    fn parses_its_own_output() {
        let manifest = sample();
        let json = serde_json::to_string_pretty(&manifest).unwrap();
        let parsed: Manifest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, manifest);
    }
}
