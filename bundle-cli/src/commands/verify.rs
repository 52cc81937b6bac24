//! Check the published bundle against its manifest.

use anyhow::Result;
use bundle_core::{count_records, verify_checksum};

use crate::store::DataLayout;

/// Result of checking every file listed in the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Manifest version that was checked.
    pub version: String,
    /// Files checked.
    pub checked: usize,
    /// Listed files that are not present.
    pub missing: Vec<String>,
    /// Files whose bytes no longer match the checksum.
    pub mismatched: Vec<String>,
    /// Files whose record count differs from the manifest.
    pub miscounted: Vec<String>,
}

impl VerifyReport {
    /// Whether every listed file is present and intact.
    pub fn is_ok(&self) -> bool {
        self.missing.is_empty() && self.mismatched.is_empty() && self.miscounted.is_empty()
    }
}

/// Run the verify command.
pub async fn run(layout: &DataLayout) -> Result<VerifyReport> {
    let manifest = layout.read_manifest().await?;
    let mut report = VerifyReport {
        version: manifest.version.clone(),
        ..VerifyReport::default()
    };

    for (filename, entry) in &manifest.files {
        report.checked += 1;
        let bytes = match layout.read_published(filename).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("{}: {:#}", filename, e);
                report.missing.push(filename.clone());
                continue;
            }
        };
        if !verify_checksum(&bytes, &entry.checksum) {
            tracing::error!("{}: checksum mismatch", filename);
            report.mismatched.push(filename.clone());
            continue;
        }
        let count = count_records(&bytes);
        if count != entry.count {
            tracing::error!(
                "{}: {} records, manifest lists {}",
                filename,
                count,
                entry.count
            );
            report.miscounted.push(filename.clone());
        }
    }

    if report.is_ok() {
        tracing::info!(
            "Bundle {} verified: {} files intact",
            report.version,
            report.checked
        );
    }
    Ok(report)
}
