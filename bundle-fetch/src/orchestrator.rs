//! Sync Orchestrator - one run over the whole catalog.
//!
//! Endpoints are fetched in catalog order by a bounded pool of at most
//! `concurrency` in-flight fetches. All fetches share the fetcher's
//! request limiter; retry state stays per page request. Results are
//! reported in catalog order regardless of completion order.
//!
//! A failing endpoint never aborts the run: it is logged and recorded as
//! an empty set. The run completes once every endpoint has either
//! succeeded or failed.

use std::collections::BTreeMap;
use std::time::Duration;

use bundle_core::Catalog;
use bundle_types::{EndpointDescriptor, RawRecordSet};
use futures_util::stream::{self, StreamExt};
use tokio::time::Instant;

use crate::fetcher::Fetcher;
use crate::source::PageSource;

/// Result of one endpoint within a run.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointOutcome {
    /// Endpoint name.
    pub name: String,
    /// Records fetched (zero on failure).
    pub records: usize,
    /// Wall time spent on the endpoint.
    pub elapsed: Duration,
    /// Failure description, if the endpoint failed.
    pub error: Option<String>,
}

impl EndpointOutcome {
    /// Whether the endpoint was fetched completely.
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Default)]
pub struct SyncRun {
    /// Record set per endpoint name. Failed endpoints map to an empty set.
    pub records: BTreeMap<String, RawRecordSet>,
    /// Per-endpoint outcomes in catalog order.
    pub outcomes: Vec<EndpointOutcome>,
    /// Wall time of the whole run.
    pub elapsed: Duration,
}

impl SyncRun {
    /// Total records over all endpoints.
    pub fn total_records(&self) -> usize {
        self.outcomes.iter().map(|o| o.records).sum()
    }

    /// Number of endpoints fetched completely.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    /// Names of failed endpoints, in catalog order.
    pub fn failed(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.succeeded())
            .map(|o| o.name.as_str())
            .collect()
    }
}

/// Drives a [`Fetcher`] over a catalog.
#[derive(Debug)]
pub struct Orchestrator<S> {
    fetcher: Fetcher<S>,
    concurrency: usize,
}

impl<S: PageSource> Orchestrator<S> {
    /// Create an orchestrator fetching up to `concurrency` endpoints at once.
    ///
    /// A concurrency of one (or zero) fetches strictly sequentially.
    pub fn new(fetcher: Fetcher<S>, concurrency: usize) -> Self {
        Self {
            fetcher,
            concurrency: concurrency.max(1),
        }
    }

    /// The fetcher used for every endpoint.
    pub fn fetcher(&self) -> &Fetcher<S> {
        &self.fetcher
    }

    /// Fetch every endpoint of `catalog`.
    ///
    /// In `test_mode` each endpoint is asked for a single record only.
    pub async fn run(&self, catalog: &Catalog, test_mode: bool) -> SyncRun {
        let start = Instant::now();
        let total = catalog.len();
        tracing::info!(
            "Syncing {} endpoints (concurrency {}{})",
            total,
            self.concurrency,
            if test_mode { ", test mode" } else { "" }
        );

        let results: Vec<(EndpointOutcome, RawRecordSet)> = stream::iter(catalog.endpoints())
            .enumerate()
            .map(|(index, endpoint)| self.sync_endpoint(index + 1, total, endpoint, test_mode))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut run = SyncRun::default();
        for (outcome, set) in results {
            run.records.insert(outcome.name.clone(), set);
            run.outcomes.push(outcome);
        }
        run.elapsed = start.elapsed();

        tracing::info!(
            "Sync finished: {}/{} endpoints, {} records in {:.1}s",
            run.succeeded(),
            total,
            run.total_records(),
            run.elapsed.as_secs_f64()
        );
        let failed = run.failed();
        if !failed.is_empty() {
            tracing::warn!("Failed endpoints: {}", failed.join(", "));
        }
        run
    }

    async fn sync_endpoint(
        &self,
        index: usize,
        total: usize,
        endpoint: &EndpointDescriptor,
        test_mode: bool,
    ) -> (EndpointOutcome, RawRecordSet) {
        let start = Instant::now();
        tracing::debug!(
            "[{}/{}] {} (group {}): {}",
            index,
            total,
            endpoint.name,
            endpoint.priority_group,
            endpoint.description
        );

        let result = if test_mode {
            self.fetcher.fetch_sample(endpoint).await
        } else {
            self.fetcher.fetch(endpoint).await
        };
        let elapsed = start.elapsed();

        match result {
            Ok(set) => {
                tracing::info!(
                    "[{}/{}] {}: {} records in {:.1}s",
                    index,
                    total,
                    endpoint.name,
                    set.len(),
                    elapsed.as_secs_f64()
                );
                let outcome = EndpointOutcome {
                    name: endpoint.name.clone(),
                    records: set.len(),
                    elapsed,
                    error: None,
                };
                (outcome, set)
            }
            Err(e) => {
                tracing::error!("[{}/{}] {} failed: {}", index, total, endpoint.name, e);
                let outcome = EndpointOutcome {
                    name: endpoint.name.clone(),
                    records: 0,
                    elapsed,
                    error: Some(e.to_string()),
                };
                (outcome, RawRecordSet::empty(endpoint.name.clone()))
            }
        }
    }
}
