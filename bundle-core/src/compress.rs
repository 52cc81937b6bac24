//! Deterministic dataset compression.
//!
//! Records are encoded as compact JSON (non-ASCII kept literal) and then
//! gzip-compressed at the maximum level. The gzip header carries no
//! modification time or file name, so identical records always compress
//! to identical bytes. Manifest checksums depend on this.

use std::io::{Read, Write};

use bundle_types::{CompressedArtifact, NormalizedRecord, ARTIFACT_EXTENSION};
use flate2::read::GzDecoder;
use flate2::{Compression, GzBuilder};

use crate::error::CodecError;

/// Encode records into their canonical compact JSON form.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if a value cannot be serialized.
pub fn encode_records(records: &[NormalizedRecord]) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(records).map_err(CodecError::Encode)
}

/// gzip `data` at the maximum compression level with a fixed header.
///
/// # Errors
///
/// Returns [`CodecError::Gzip`] if the encoder fails.
pub fn gzip(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut encoder = GzBuilder::new()
        .mtime(0)
        .write(Vec::with_capacity(data.len() / 4), Compression::best());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Decompress a gzip stream.
///
/// # Errors
///
/// Returns [`CodecError::Gzip`] if `bytes` is not a valid gzip stream.
pub fn inflate(bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Compress one endpoint's records into its bundle artifact.
///
/// Empty input is valid and yields a small artifact holding `[]`.
///
/// # Errors
///
/// Returns a [`CodecError`] if encoding or compression fails.
pub fn compress(
    endpoint: &str,
    records: &[NormalizedRecord],
) -> Result<CompressedArtifact, CodecError> {
    let encoded = encode_records(records)?;
    compress_encoded(endpoint, &encoded)
}

/// Compress an already encoded record array (e.g. read from the normalized store).
///
/// # Errors
///
/// Returns [`CodecError::Gzip`] if compression fails.
pub fn compress_encoded(endpoint: &str, encoded: &[u8]) -> Result<CompressedArtifact, CodecError> {
    let bytes = gzip(encoded)?;
    Ok(CompressedArtifact::new(
        format!("{endpoint}{ARTIFACT_EXTENSION}"),
        encoded.len() as u64,
        bytes,
    ))
}

/// Decompress and decode an artifact back into records.
///
/// # Errors
///
/// Returns a [`CodecError`] if the bytes are not gzip or not a record array.
pub fn decode_records(bytes: &[u8]) -> Result<Vec<NormalizedRecord>, CodecError> {
    let raw = inflate(bytes)?;
    serde_json::from_slice(&raw).map_err(CodecError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn record(pairs: &[(&str, Value)]) -> NormalizedRecord {
        let mut r = NormalizedRecord::new();
        for (k, v) in pairs {
            r.insert(*k, v.clone());
        }
        r
    }

    fn sample() -> Vec<NormalizedRecord> {
        vec![
            record(&[("kennr", json!("024261-00")), ("mittelname", json!("Pflanzenstärker"))]),
            record(&[("kennr", json!("005678-00")), ("mittelname", Value::Null)]),
        ]
    }

    #[test]
    fn round_trip_restores_records() {
        let records = sample();
        let artifact = compress("mittel", &records).unwrap();
        assert_eq!(decode_records(&artifact.bytes).unwrap(), records);
    }

    #[test]
    fn output_is_byte_identical_for_identical_input() {
        let a = compress("mittel", &sample()).unwrap();
        let b = compress("mittel", &sample()).unwrap();
        assert_eq!(a.bytes, b.bytes);
    }

    #[test]
    fn empty_input_produces_valid_artifact() {
        let artifact = compress("stand", &[]).unwrap();
        assert_eq!(artifact.filename, "stand.json.gz");
        assert_eq!(artifact.original_size_bytes, 2);
        assert!(artifact.compressed_size_bytes > 0);
        assert!(decode_records(&artifact.bytes).unwrap().is_empty());
    }

    #[test]
    fn encoding_is_compact_and_keeps_umlauts() {
        let encoded = encode_records(&sample()).unwrap();
        let text = String::from_utf8(encoded).unwrap();
        assert!(text.contains("Pflanzenstärker"));
        assert!(!text.contains('\n'));
        assert!(!text.contains(": "));
    }

    #[test]
    fn sizes_are_recorded() {
        let records = sample();
        let encoded = encode_records(&records).unwrap();
        let artifact = compress("mittel", &records).unwrap();
        assert_eq!(artifact.original_size_bytes, encoded.len() as u64);
        assert_eq!(artifact.compressed_size_bytes, artifact.bytes.len() as u64);
    }

    #[test]
    fn decoding_garbage_fails() {
        assert!(matches!(decode_records(b"not gzip"), Err(CodecError::Gzip(_))));
        let not_json = gzip(b"{{{").unwrap();
        assert!(matches!(decode_records(&not_json), Err(CodecError::Decode(_))));
    }
}
