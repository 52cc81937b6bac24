//! Compress the transformed store into bundle artifacts.

use anyhow::{Context, Result};
use bundle_core::compress;
use bundle_types::CompressedArtifact;

use crate::store::DataLayout;

/// Size totals of one compress run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompressionTotals {
    /// Number of artifacts written.
    pub files: usize,
    /// Encoded size before compression.
    pub original_bytes: u64,
    /// Size after compression.
    pub compressed_bytes: u64,
}

impl CompressionTotals {
    /// Totals over a set of artifacts.
    pub fn of(artifacts: &[CompressedArtifact]) -> Self {
        artifacts.iter().fold(Self::default(), |acc, a| Self {
            files: acc.files + 1,
            original_bytes: acc.original_bytes + a.original_size_bytes,
            compressed_bytes: acc.compressed_bytes + a.compressed_size_bytes,
        })
    }

    /// Space saved, in percent. Zero for empty input.
    pub fn ratio_percent(&self) -> f64 {
        if self.original_bytes == 0 {
            return 0.0;
        }
        (1.0 - self.compressed_bytes as f64 / self.original_bytes as f64) * 100.0
    }
}

fn kb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0
}

/// Run the compress command.
pub async fn run(layout: &DataLayout) -> Result<Vec<CompressedArtifact>> {
    let sets = layout.read_transformed().await?;
    if sets.is_empty() {
        anyhow::bail!(
            "No normalized data found in {} (run transform first)",
            layout.transformed_dir().display()
        );
    }

    let mut artifacts = Vec::with_capacity(sets.len());
    for (name, records) in sets {
        let artifact =
            compress(&name, &records).with_context(|| format!("Failed to compress {name}"))?;
        layout.write_compressed(&artifact).await?;
        tracing::info!(
            "  {:30} {:8.1} KB -> {:8.1} KB ({:5.1}%)",
            name,
            kb(artifact.original_size_bytes),
            kb(artifact.compressed_size_bytes),
            artifact.ratio_percent()
        );
        artifacts.push(artifact);
    }

    let totals = CompressionTotals::of(&artifacts);
    tracing::info!(
        "Compressed {} files: {:.1} KB -> {:.1} KB ({:.1}% saved)",
        totals.files,
        kb(totals.original_bytes),
        kb(totals.compressed_bytes),
        totals.ratio_percent()
    );
    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_core::decode_records;
    use bundle_types::NormalizedRecord;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn fails_without_normalized_data() {
        let dir = tempdir().unwrap();
        let layout = DataLayout::new(dir.path(), dir.path().join("bundle"));
        assert!(run(&layout).await.is_err());
    }

    #[tokio::test]
    async fn compresses_every_file() {
        let dir = tempdir().unwrap();
        let layout = DataLayout::new(dir.path(), dir.path().join("bundle"));
        let mut record = NormalizedRecord::new();
        record.insert("kennr", json!("024261-00"));
        let records = vec![record; 200];
        layout.write_transformed("mittel", &records).await.unwrap();
        layout.write_transformed("stand", &[]).await.unwrap();

        let artifacts = run(&layout).await.unwrap();

        let names: Vec<_> = artifacts.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["mittel.json.gz", "stand.json.gz"]);
        let on_disk = std::fs::read(layout.compressed_dir().join("mittel.json.gz")).unwrap();
        assert_eq!(decode_records(&on_disk).unwrap(), records);

        let totals = CompressionTotals::of(&artifacts);
        assert_eq!(totals.files, 2);
        assert!(totals.ratio_percent() > 50.0);
    }

    #[tokio::test]
    async fn recompressing_is_byte_identical() {
        let dir = tempdir().unwrap();
        let layout = DataLayout::new(dir.path(), dir.path().join("bundle"));
        let mut record = NormalizedRecord::new();
        record.insert("wirkstoffname", json!("Glyphosat"));
        layout.write_transformed("wirkstoff", &[record]).await.unwrap();

        let first = run(&layout).await.unwrap();
        let second = run(&layout).await.unwrap();
        assert_eq!(first[0].bytes, second[0].bytes);
    }

    #[test]
    fn ratio_of_nothing_is_zero() {
        assert_eq!(CompressionTotals::default().ratio_percent(), 0.0);
    }
}
