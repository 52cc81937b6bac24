//! Error types for bundle-core.

use thiserror::Error;

/// Catalog construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Two descriptors share a name.
    #[error("duplicate endpoint name: {name}")]
    DuplicateEndpoint {
        /// The repeated name.
        name: String,
    },
}

/// Encoding, compression and decoding errors.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Records could not be serialized to JSON.
    #[error("encoding failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Decompressed bytes are not a JSON record array.
    #[error("decoding failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// gzip stream error.
    #[error("gzip error: {0}")]
    Gzip(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CatalogError::DuplicateEndpoint {
            name: "kode".into(),
        };
        assert_eq!(err.to_string(), "duplicate endpoint name: kode");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CatalogError>();
        assert_send_sync::<CodecError>();
    }
}
