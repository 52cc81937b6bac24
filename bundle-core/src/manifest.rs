//! Manifest generation.
//!
//! The manifest is derived entirely from the compressed artifacts of a run:
//! a SHA-256 digest over each file's bytes, its size, and the number of
//! records it decodes to. It is stamped with the calendar date (one version
//! per day) and the exact generation time.

use std::collections::BTreeMap;

use bundle_types::{CompressedArtifact, Manifest, ManifestEntry};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::catalog::Catalog;
use crate::compress::inflate;

/// Prefix of every checksum string.
pub const CHECKSUM_PREFIX: &str = "sha256:";

/// `sha256:<hex>` digest of `bytes`.
pub fn sha256_checksum(bytes: &[u8]) -> String {
    format!("{CHECKSUM_PREFIX}{}", hex::encode(Sha256::digest(bytes)))
}

/// Whether `bytes` still match the checksum recorded for them.
pub fn verify_checksum(bytes: &[u8], checksum: &str) -> bool {
    sha256_checksum(bytes) == checksum
}

/// Bytes to KB, rounded to two decimals.
pub fn round_kb(bytes: u64) -> f64 {
    (bytes as f64 / 1024.0 * 100.0).round() / 100.0
}

/// Number of logical records in a compressed artifact.
///
/// A JSON array counts its elements, any other JSON value counts as one
/// record, and anything that does not decode counts as zero. A corrupt
/// file therefore shows up as a zero count instead of failing the manifest.
pub fn count_records(bytes: &[u8]) -> u64 {
    let decoded = match inflate(bytes) {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::warn!("Artifact is not valid gzip, counting 0 records: {}", e);
            return 0;
        }
    };
    match serde_json::from_slice::<Value>(&decoded) {
        Ok(Value::Array(items)) => items.len() as u64,
        Ok(_) => 1,
        Err(e) => {
            tracing::warn!("Artifact is not valid JSON, counting 0 records: {}", e);
            0
        }
    }
}

/// Build the manifest for a set of artifacts.
///
/// `endpoints` reports the catalog size, not the number of files.
/// File entries are keyed and iterated by file name.
pub fn build_manifest(
    artifacts: &[CompressedArtifact],
    catalog: &Catalog,
    generated: DateTime<Utc>,
) -> Manifest {
    let mut files = BTreeMap::new();
    let mut total_records = 0u64;
    let mut total_bytes = 0u64;

    for artifact in artifacts {
        let size = artifact.bytes.len() as u64;
        let entry = ManifestEntry {
            count: count_records(&artifact.bytes),
            checksum: sha256_checksum(&artifact.bytes),
            size_kb: round_kb(size),
        };
        tracing::debug!(
            "Manifest entry {}: {} records, {:.2} KB",
            artifact.filename,
            entry.count,
            entry.size_kb
        );
        total_records += entry.count;
        total_bytes += size;
        files.insert(artifact.filename.clone(), entry);
    }

    Manifest {
        version: generated.format("%Y-%m-%d").to_string(),
        generated,
        endpoints: catalog.len(),
        total_records,
        total_size_kb: round_kb(total_bytes),
        files,
    }
}
