//! Build the manifest and publish the bundle.

use anyhow::Result;
use bundle_core::{build_manifest, Catalog};
use bundle_types::Manifest;
use chrono::{DateTime, Utc};

use crate::store::DataLayout;

/// Run the manifest command.
///
/// Reads every compressed artifact, builds the manifest stamped with
/// `generated`, and swaps artifacts plus manifest into the publish directory.
pub async fn run(
    layout: &DataLayout,
    catalog: &Catalog,
    generated: DateTime<Utc>,
) -> Result<Manifest> {
    let compressed_dir = layout.compressed_dir();
    if !tokio::fs::try_exists(&compressed_dir).await.unwrap_or(false) {
        anyhow::bail!(
            "Compressed directory {} not found (run compress first)",
            compressed_dir.display()
        );
    }

    let artifacts = layout.read_compressed().await?;
    if artifacts.is_empty() {
        anyhow::bail!("No compressed files in {}", compressed_dir.display());
    }

    let manifest = build_manifest(&artifacts, catalog, generated);
    for (filename, entry) in &manifest.files {
        tracing::info!(
            "  {:35} {:>8} records  {:>8.2} KB",
            filename,
            entry.count,
            entry.size_kb
        );
    }

    layout.publish(&artifacts, &manifest).await?;
    tracing::info!(
        "Published version {} to {}: {} files, {} records, {:.2} KB",
        manifest.version,
        layout.publish_dir().display(),
        manifest.files.len(),
        manifest.total_records,
        manifest.total_size_kb
    );
    Ok(manifest)
}
