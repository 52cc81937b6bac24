//! Fetch every catalog endpoint into the raw store.

use anyhow::{Context, Result};
use bundle_core::Catalog;
use bundle_fetch::{Fetcher, HttpPageSource, Orchestrator, PageSource, RequestLimiter, SyncRun};

use crate::config::Config;
use crate::store::DataLayout;

/// Options of the fetch stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Request a single record per endpoint.
    pub test_mode: bool,
    /// Fail when the run fetched no records at all.
    pub fail_on_empty: bool,
}

/// Build the orchestrator for the real upstream.
///
/// Every worker draws from one request limiter, so `requests_per_second`
/// bounds the whole run regardless of `concurrency`.
pub fn http_orchestrator(config: &Config) -> Result<Orchestrator<HttpPageSource>> {
    let source =
        HttpPageSource::new(config.http_source()).context("Failed to build HTTP client")?;
    let limiter = RequestLimiter::new(config.fetch.requests_per_second);
    let fetcher = Fetcher::with_limiter(source, config.fetch_settings(), limiter);
    Ok(Orchestrator::new(fetcher, config.fetch.concurrency))
}

/// Run the fetch command against the configured upstream.
pub async fn run(
    config: &Config,
    layout: &DataLayout,
    catalog: &Catalog,
    options: FetchOptions,
) -> Result<SyncRun> {
    tracing::info!("Fetching from {}", config.upstream.base_url);
    let orchestrator = http_orchestrator(config)?;
    fetch_with(&orchestrator, layout, catalog, options).await
}

/// Fetch with any page source and write one raw file per endpoint.
///
/// Failed endpoints are written as empty files, replacing earlier data.
pub async fn fetch_with<S: PageSource>(
    orchestrator: &Orchestrator<S>,
    layout: &DataLayout,
    catalog: &Catalog,
    options: FetchOptions,
) -> Result<SyncRun> {
    let settings = orchestrator.fetcher().settings();
    tracing::info!(
        "Page size {}, {} attempts per page, {} requests/s",
        if options.test_mode { 1 } else { settings.page_size },
        settings.retry.max_attempts(),
        orchestrator.fetcher().limiter().per_second()
    );
    let run = orchestrator.run(catalog, options.test_mode).await;

    for set in run.records.values() {
        let path = layout.write_raw(set).await?;
        tracing::debug!("Saved {} ({} records)", path.display(), set.len());
    }
    tracing::info!(
        "Saved {} raw files to {}",
        run.records.len(),
        layout.raw_dir().display()
    );

    if options.fail_on_empty && run.total_records() == 0 {
        anyhow::bail!("No records fetched from any of {} endpoints", catalog.len());
    }
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_core::RetryPolicy;
    use bundle_fetch::{FetchSettings, MockPageSource};
    use bundle_types::{EndpointDescriptor, PageError, RawRecord};
    use serde_json::json;
    use std::time::Duration;
    use tempfile::tempdir;

    fn orchestrator(source: &MockPageSource) -> Orchestrator<MockPageSource> {
        let settings = FetchSettings {
            page_size: 10,
            retry: RetryPolicy::new(2, Duration::from_millis(1)),
            page_pause: Duration::ZERO,
            requests_per_second: 10_000,
        };
        Orchestrator::new(Fetcher::new(source.clone(), settings), 1)
    }

    fn catalog() -> Catalog {
        Catalog::new(vec![
            EndpointDescriptor::new("a", "/a/", 1, "A"),
            EndpointDescriptor::new("b", "/b/", 2, "B"),
        ])
        .unwrap()
    }

    fn records(n: usize) -> Vec<RawRecord> {
        (0..n)
            .map(|i| json!({ "ID": i }).as_object().cloned().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn writes_one_raw_file_per_endpoint() {
        let dir = tempdir().unwrap();
        let layout = DataLayout::new(dir.path(), dir.path().join("bundle"));
        let source = MockPageSource::new();
        source.serve("/a/", records(15));
        source.fail_always("/b/", PageError::Client { status: 404 });

        let run = fetch_with(&orchestrator(&source), &layout, &catalog(), FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(run.total_records(), 15);
        let raw = layout.read_raw().await.unwrap();
        assert_eq!(raw["a"].len(), 15);
        assert!(raw["b"].is_empty());
    }

    #[tokio::test]
    async fn empty_run_succeeds_unless_asked_to_fail() {
        let dir = tempdir().unwrap();
        let layout = DataLayout::new(dir.path(), dir.path().join("bundle"));
        let source = MockPageSource::new();
        source.fail_always("/a/", PageError::Server { status: 500 });
        source.fail_always("/b/", PageError::Server { status: 500 });
        let orchestrator = orchestrator(&source);

        let run = fetch_with(&orchestrator, &layout, &catalog(), FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(run.succeeded(), 0);

        let strict = FetchOptions {
            fail_on_empty: true,
            ..FetchOptions::default()
        };
        let err = fetch_with(&orchestrator, &layout, &catalog(), strict)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No records fetched"));
    }

    #[tokio::test]
    async fn test_mode_fetches_one_record() {
        let dir = tempdir().unwrap();
        let layout = DataLayout::new(dir.path(), dir.path().join("bundle"));
        let source = MockPageSource::new();
        source.serve("/a/", records(15));
        source.serve("/b/", records(3));
        let options = FetchOptions {
            test_mode: true,
            ..FetchOptions::default()
        };

        let run = fetch_with(&orchestrator(&source), &layout, &catalog(), options)
            .await
            .unwrap();

        assert_eq!(run.total_records(), 2);
        assert_eq!(source.requests().len(), 2);
    }

    #[test]
    fn http_orchestrator_uses_configured_limits() {
        let mut config = Config::default();
        config.fetch.requests_per_second = 7;
        config.fetch.page_size = 250;

        let orchestrator = http_orchestrator(&config).unwrap();

        assert_eq!(orchestrator.fetcher().limiter().per_second(), 7);
        assert_eq!(orchestrator.fetcher().settings().page_size, 250);
    }
}
