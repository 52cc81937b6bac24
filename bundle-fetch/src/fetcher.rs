//! Paginated Fetcher - all records of one endpoint.
//!
//! Walks an endpoint page by page with a [`PageCursor`] and retries each
//! page request according to a [`RetryPolicy`]. The result is
//! all-or-nothing: either every page was fetched, or a [`FetchError`]
//! reports the failing page and the records that were discarded.
//!
//! ```text
//! Fetcher ── RequestLimiter ── PageSource ── upstream
//!    │
//!    └── bundle-core (PageCursor, RetryPolicy)
//! ```

use std::time::Duration;

use bundle_core::{PageCursor, PageStep, RetryDecision, RetryPolicy};
use bundle_types::{EndpointDescriptor, PageError, RawRecord, RawRecordSet};
use thiserror::Error;

use crate::limits::RequestLimiter;
use crate::source::PageSource;

/// Unrecoverable failure while fetching an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{endpoint}: page at offset {offset} failed after {attempts} attempt(s): {source}"
)]
pub struct FetchError {
    /// Endpoint name.
    pub endpoint: String,
    /// Offset of the page that failed.
    pub offset: usize,
    /// Attempts made for that page.
    pub attempts: u32,
    /// Records fetched from earlier pages and thrown away.
    pub discarded: usize,
    /// The last error observed.
    pub source: PageError,
}

/// Fetcher settings.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Records requested per page (`limit`).
    pub page_size: usize,
    /// Per-page retry policy.
    pub retry: RetryPolicy,
    /// Pause between consecutive pages of one endpoint.
    pub page_pause: Duration,
    /// Aggregate outbound request rate.
    pub requests_per_second: u32,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            page_size: 1000,
            retry: RetryPolicy::default(),
            page_pause: Duration::from_millis(100),
            requests_per_second: 10,
        }
    }
}

/// A page request that ran out of attempts.
struct PageFailure {
    error: PageError,
    attempts: u32,
}

/// Fetches complete record sets from a [`PageSource`].
#[derive(Debug)]
pub struct Fetcher<S> {
    source: S,
    settings: FetchSettings,
    limiter: RequestLimiter,
}

impl<S: PageSource> Fetcher<S> {
    /// Create a fetcher with its own request limiter.
    pub fn new(source: S, settings: FetchSettings) -> Self {
        let limiter = RequestLimiter::new(settings.requests_per_second);
        Self::with_limiter(source, settings, limiter)
    }

    /// Create a fetcher that shares an existing request limiter.
    pub fn with_limiter(source: S, settings: FetchSettings, limiter: RequestLimiter) -> Self {
        Self {
            source,
            settings,
            limiter,
        }
    }

    /// Current settings.
    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// Limiter every request waits on.
    pub fn limiter(&self) -> &RequestLimiter {
        &self.limiter
    }

    /// Fetch every record of `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] when a page fails with a client fault or
    /// exhausts its retries. Records from earlier pages are discarded.
    pub async fn fetch(&self, endpoint: &EndpointDescriptor) -> Result<RawRecordSet, FetchError> {
        let mut cursor = PageCursor::new(self.settings.page_size);
        let mut records: Vec<RawRecord> = Vec::new();

        loop {
            let offset = cursor.offset();
            let page = self
                .fetch_page_with_retry(&endpoint.path, cursor.page_size(), offset)
                .await
                .map_err(|failure| {
                    if !records.is_empty() {
                        tracing::warn!(
                            "Discarding {} records already fetched for {}",
                            records.len(),
                            endpoint.name
                        );
                    }
                    FetchError {
                        endpoint: endpoint.name.clone(),
                        offset,
                        attempts: failure.attempts,
                        discarded: records.len(),
                        source: failure.error,
                    }
                })?;

            let returned = page.len();
            records.extend(page);
            tracing::debug!(
                "{}: offset {} returned {} records ({} total)",
                endpoint.name,
                offset,
                returned,
                records.len()
            );

            match cursor.advance(returned) {
                PageStep::Done => break,
                PageStep::Next { .. } => {
                    if !self.settings.page_pause.is_zero() {
                        tokio::time::sleep(self.settings.page_pause).await;
                    }
                }
            }
        }

        Ok(RawRecordSet::new(endpoint.name.clone(), records))
    }

    /// Fetch a single record of `endpoint` (one page of size one).
    ///
    /// Used by test mode to smoke-test every endpoint cheaply.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] when the request fails.
    pub async fn fetch_sample(
        &self,
        endpoint: &EndpointDescriptor,
    ) -> Result<RawRecordSet, FetchError> {
        let records = self
            .fetch_page_with_retry(&endpoint.path, 1, 0)
            .await
            .map_err(|failure| FetchError {
                endpoint: endpoint.name.clone(),
                offset: 0,
                attempts: failure.attempts,
                discarded: 0,
                source: failure.error,
            })?;
        Ok(RawRecordSet::new(endpoint.name.clone(), records))
    }

    /// Request one page, retrying transient faults.
    async fn fetch_page_with_retry(
        &self,
        path: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<RawRecord>, PageFailure> {
        let retry = &self.settings.retry;
        let mut attempt = 1;

        loop {
            self.limiter.acquire().await;

            let error = match self.source.fetch_page(path, limit, offset).await {
                Ok(records) => return Ok(records),
                Err(error) => error,
            };

            match retry.decide(&error, attempt) {
                RetryDecision::RetryAfter(wait) => {
                    tracing::warn!(
                        "{} offset {}: {} (attempt {}/{}), retrying in {:?}",
                        path,
                        offset,
                        error,
                        attempt,
                        retry.max_attempts(),
                        wait
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                RetryDecision::Fail => {
                    return Err(PageFailure {
                        error,
                        attempts: attempt,
                    })
                }
            }
        }
    }
}
