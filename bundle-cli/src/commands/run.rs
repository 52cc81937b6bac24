//! Run the whole pipeline: fetch, transform, compress, manifest.

use anyhow::Result;
use bundle_core::{Catalog, RuleRegistry};
use bundle_fetch::{Orchestrator, PageSource, SyncRun};
use bundle_types::Manifest;
use chrono::{DateTime, Utc};
use tokio::time::Instant;

use super::compress::CompressionTotals;
use super::fetch::{self, FetchOptions};
use super::{compress, manifest, transform};
use crate::config::Config;
use crate::store::DataLayout;

/// What one full pipeline run produced.
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    /// Fetch results per endpoint.
    pub sync: SyncRun,
    /// Compression totals.
    pub compression: CompressionTotals,
    /// The published manifest.
    pub manifest: Manifest,
}

/// Run every stage against the configured upstream.
pub async fn run(
    config: &Config,
    layout: &DataLayout,
    catalog: &Catalog,
    registry: &RuleRegistry,
    options: FetchOptions,
) -> Result<PipelineSummary> {
    let orchestrator = fetch::http_orchestrator(config)?;
    pipeline(&orchestrator, layout, catalog, registry, options, Utc::now()).await
}

/// Run every stage with any page source.
pub async fn pipeline<S: PageSource>(
    orchestrator: &Orchestrator<S>,
    layout: &DataLayout,
    catalog: &Catalog,
    registry: &RuleRegistry,
    options: FetchOptions,
    generated: DateTime<Utc>,
) -> Result<PipelineSummary> {
    let start = Instant::now();

    tracing::info!("Step 1/4: fetch");
    let sync = fetch::fetch_with(orchestrator, layout, catalog, options).await?;

    tracing::info!("Step 2/4: transform");
    transform::run(layout, registry).await?;

    tracing::info!("Step 3/4: compress");
    let artifacts = compress::run(layout).await?;
    let compression = CompressionTotals::of(&artifacts);

    tracing::info!("Step 4/4: manifest");
    let manifest = manifest::run(layout, catalog, generated).await?;

    tracing::info!(
        "Pipeline finished in {:.1}s: {}/{} endpoints, {} records, {:.2} KB ({:.1}% saved)",
        start.elapsed().as_secs_f64(),
        sync.succeeded(),
        catalog.len(),
        manifest.total_records,
        manifest.total_size_kb,
        compression.ratio_percent()
    );

    Ok(PipelineSummary {
        sync,
        compression,
        manifest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::verify;
    use bundle_core::{PassThrough, RetryPolicy};
    use bundle_fetch::{FetchSettings, Fetcher, MockPageSource};
    use bundle_types::{EndpointDescriptor, PageError, RawRecord};
    use chrono::TimeZone;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::tempdir;

    fn records(n: usize, tag: &str) -> Vec<RawRecord> {
        (0..n)
            .map(|i| {
                json!({ "ID": i, "TAG": tag })
                    .as_object()
                    .cloned()
                    .unwrap()
            })
            .collect()
    }

    fn orchestrator(source: &MockPageSource) -> Orchestrator<MockPageSource> {
        let settings = FetchSettings {
            page_size: 1000,
            retry: RetryPolicy::new(3, Duration::from_millis(1)),
            page_pause: Duration::ZERO,
            requests_per_second: 10_000,
        };
        Orchestrator::new(Fetcher::new(source.clone(), settings), 1)
    }

    fn catalog(names: &[&str]) -> Catalog {
        Catalog::new(
            names
                .iter()
                .map(|name| EndpointDescriptor::new(*name, format!("/{name}/"), 1, *name))
                .collect(),
        )
        .unwrap()
    }

    fn identity(names: &[&str]) -> RuleRegistry {
        let mut registry = RuleRegistry::new();
        for name in names {
            registry.register(PassThrough::new(*name));
        }
        registry
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 15, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn two_pages_end_to_end() {
        let dir = tempdir().unwrap();
        let layout = DataLayout::new(dir.path().join("data"), dir.path().join("public"));
        let source = MockPageSource::new();
        source.serve("/X/", records(1400, "a"));

        let summary = pipeline(
            &orchestrator(&source),
            &layout,
            &catalog(&["X"]),
            &identity(&["X"]),
            FetchOptions::default(),
            at(5),
        )
        .await
        .unwrap();

        assert_eq!(source.requests().len(), 2);
        assert_eq!(summary.sync.total_records(), 1400);
        assert_eq!(summary.manifest.files["X.json.gz"].count, 1400);
        assert_eq!(summary.manifest.total_records, 1400);
        assert_eq!(summary.compression.files, 1);
        assert!(verify::run(&layout).await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn failing_endpoint_does_not_fail_the_run() {
        let dir = tempdir().unwrap();
        let layout = DataLayout::new(dir.path().join("data"), dir.path().join("public"));
        let source = MockPageSource::new();
        source.serve("/X/", records(10, "a"));
        source.fail_always("/Y/", PageError::Server { status: 500 });

        let summary = pipeline(
            &orchestrator(&source),
            &layout,
            &catalog(&["X", "Y"]),
            &identity(&["X", "Y"]),
            FetchOptions::default(),
            at(5),
        )
        .await
        .unwrap();

        assert_eq!(source.requests_for("/Y/").len(), 3);
        assert_eq!(summary.sync.failed(), vec!["Y"]);
        assert_eq!(summary.manifest.endpoints, 2);
        assert_eq!(summary.manifest.files["Y.json.gz"].count, 0);
        assert_eq!(summary.manifest.files["X.json.gz"].count, 10);
    }

    #[tokio::test]
    async fn same_day_runs_share_version() {
        let dir = tempdir().unwrap();
        let layout = DataLayout::new(dir.path().join("data"), dir.path().join("public"));
        let catalog = catalog(&["X", "Z"]);
        let registry = identity(&["X", "Z"]);

        let source = MockPageSource::new();
        source.serve("/X/", records(20, "a"));
        source.serve("/Z/", records(5, "z"));
        let morning = pipeline(
            &orchestrator(&source),
            &layout,
            &catalog,
            &registry,
            FetchOptions::default(),
            at(6),
        )
        .await
        .unwrap()
        .manifest;

        // Upstream changes X between runs
        source.serve("/X/", records(20, "b"));
        let evening = pipeline(
            &orchestrator(&source),
            &layout,
            &catalog,
            &registry,
            FetchOptions::default(),
            at(22),
        )
        .await
        .unwrap()
        .manifest;

        assert_eq!(morning.version, evening.version);
        assert_ne!(morning.generated, evening.generated);
        assert_ne!(
            morning.files["X.json.gz"].checksum,
            evening.files["X.json.gz"].checksum
        );
        assert_eq!(
            morning.files["Z.json.gz"].checksum,
            evening.files["Z.json.gz"].checksum
        );
        assert_eq!(layout.read_manifest().await.unwrap(), evening);
    }

    #[tokio::test]
    async fn fail_on_empty_stops_before_transform() {
        let dir = tempdir().unwrap();
        let layout = DataLayout::new(dir.path().join("data"), dir.path().join("public"));
        let source = MockPageSource::new();
        source.fail_always("/X/", PageError::Client { status: 403 });
        let options = FetchOptions {
            fail_on_empty: true,
            ..FetchOptions::default()
        };

        let result = pipeline(
            &orchestrator(&source),
            &layout,
            &catalog(&["X"]),
            &identity(&["X"]),
            options,
            at(5),
        )
        .await;

        assert!(result.is_err());
        assert!(!layout.transformed_dir().exists());
        assert!(!layout.publish_dir().exists());
    }
}
