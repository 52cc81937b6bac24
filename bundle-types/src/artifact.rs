//! Compressed dataset artifacts.

/// File extension of every compressed dataset in the bundle.
pub const ARTIFACT_EXTENSION: &str = ".json.gz";

/// One gzip-compressed dataset, derived from exactly one normalized record set.
#[derive(Clone, PartialEq, Eq)]
pub struct CompressedArtifact {
    /// File name inside the bundle, `{endpoint}.json.gz`.
    pub filename: String,
    /// Size of the encoded JSON before compression.
    pub original_size_bytes: u64,
    /// Size of the compressed bytes.
    pub compressed_size_bytes: u64,
    /// The compressed bytes.
    pub bytes: Vec<u8>,
}

impl CompressedArtifact {
    /// Wrap compressed bytes, deriving the compressed size from them.
    pub fn new(filename: impl Into<String>, original_size_bytes: u64, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            original_size_bytes,
            compressed_size_bytes: bytes.len() as u64,
            bytes,
        }
    }

    /// Endpoint name the file was produced for.
    pub fn endpoint_name(&self) -> &str {
        self.filename
            .strip_suffix(ARTIFACT_EXTENSION)
            .unwrap_or(&self.filename)
    }

    /// Space saved by compression, in percent. Zero for empty input.
    pub fn ratio_percent(&self) -> f64 {
        if self.original_size_bytes == 0 {
            return 0.0;
        }
        (1.0 - self.compressed_size_bytes as f64 / self.original_size_bytes as f64) * 100.0
    }
}

impl std::fmt::Debug for CompressedArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompressedArtifact")
            .field("filename", &self.filename)
            .field("original_size_bytes", &self.original_size_bytes)
            .field("compressed_size_bytes", &self.compressed_size_bytes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_and_ratio() {
        let artifact = CompressedArtifact::new("kode.json.gz", 1000, vec![0u8; 250]);
        assert_eq!(artifact.compressed_size_bytes, 250);
        assert_eq!(artifact.endpoint_name(), "kode");
        assert!((artifact.ratio_percent() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ratio_of_empty_input_is_zero() {
        let artifact = CompressedArtifact::new("x.json.gz", 0, vec![1, 2, 3]);
        assert_eq!(artifact.ratio_percent(), 0.0);
    }

    #[test]
    fn debug_omits_bytes() {
        let artifact = CompressedArtifact::new("x.json.gz", 10, vec![7u8; 4]);
        let debug = format!("{:?}", artifact);
        assert!(debug.contains("x.json.gz"));
        assert!(debug.contains("compressed_size_bytes: 4"));
        assert!(!debug.contains(" bytes:"));
        assert!(!debug.contains("[7, 7"));
    }
}
