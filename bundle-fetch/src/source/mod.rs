//! Page source abstraction.
//!
//! This module provides a pluggable layer for requesting one page of an
//! endpoint (HTTP against the real upstream, mock for testing).
//!
//! # Design
//!
//! A source performs exactly one request per call and never retries.
//! It returns either the page's records or a [`PageError`] tagged with the
//! fault class; retry and pagination decisions belong to the
//! [`Fetcher`](crate::Fetcher).
//!
//! Data faults (a body that is not JSON, or has no `items` array) are not
//! errors: the page is reported as empty, which ends pagination.
//!
//! # Example
//!
//! ```ignore
//! let source = HttpPageSource::new(HttpSourceConfig::default())?;
//! let records = source.fetch_page("/kode/", 1000, 0).await?;
//! ```

mod http;
mod mock;

pub use http::{HttpPageSource, HttpSourceConfig, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
pub use mock::{MockPageSource, PageRequest};

use async_trait::async_trait;
use bundle_types::{PageError, RawRecord};
use serde_json::Value;

/// Requests single pages of upstream records.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch up to `limit` records of the endpoint at `path`, starting at `offset`.
    async fn fetch_page(
        &self,
        path: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<RawRecord>, PageError>;
}

/// Extract the records of a page body.
///
/// Returns an empty page, with a warning, when the body is not JSON or has
/// no `items` array. Non-object items are skipped.
pub fn parse_page(path: &str, body: &[u8]) -> Vec<RawRecord> {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Malformed JSON from {}, treating page as empty: {}", path, e);
            return Vec::new();
        }
    };
    match value.get("items").and_then(Value::as_array) {
        Some(items) => items
            .iter()
            .filter_map(|item| item.as_object().cloned())
            .collect(),
        None => {
            tracing::warn!("Response from {} has no items array, treating page as empty", path);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_items_array() {
        let body = br#"{"items":[{"KENNR":"1"},{"KENNR":"2"}],"hasMore":false}"#;
        let records = parse_page("/mittel/", body);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["KENNR"], "1");
    }

    #[test]
    fn malformed_json_is_an_empty_page() {
        assert!(parse_page("/mittel/", b"<html>oops</html>").is_empty());
    }

    #[test]
    fn missing_items_is_an_empty_page() {
        assert!(parse_page("/mittel/", br#"{"rows":[]}"#).is_empty());
    }

    #[test]
    fn non_object_items_are_skipped() {
        let records = parse_page("/x/", br#"{"items":[1,{"A":1},"s"]}"#);
        assert_eq!(records.len(), 1);
    }
}
