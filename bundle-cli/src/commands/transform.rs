//! Normalize the raw store into the transformed store.

use anyhow::Result;
use bundle_core::RuleRegistry;
use std::collections::BTreeMap;

use crate::store::DataLayout;

/// Run the transform command. Returns the record count per endpoint.
pub async fn run(
    layout: &DataLayout,
    registry: &RuleRegistry,
) -> Result<BTreeMap<String, usize>> {
    let raw = layout.read_raw().await?;
    if raw.is_empty() {
        anyhow::bail!(
            "No raw data found in {} (run fetch first)",
            layout.raw_dir().display()
        );
    }
    tracing::info!("Transforming {} raw files", raw.len());

    let normalized = registry.transform_all(&raw);

    let mut counts = BTreeMap::new();
    for (name, records) in &normalized {
        layout.write_transformed(name, records).await?;
        counts.insert(name.clone(), records.len());
    }

    tracing::info!(
        "Transformed {} files, {} records",
        counts.len(),
        counts.values().sum::<usize>()
    );
    Ok(counts)
}
