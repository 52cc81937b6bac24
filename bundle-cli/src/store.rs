//! On-disk layout of the pipeline stores.
//!
//! ```text
//! <data_dir>/
//!   raw/<endpoint>.json            pretty JSON array, as fetched
//!   transformed/<endpoint>.json    compact JSON array of normalized records
//!   compressed/<endpoint>.json.gz  bundle artifacts
//! <publish_dir>/
//!   <endpoint>.json.gz
//!   manifest.json
//! ```
//!
//! Every file is written to a temporary sibling, synced and renamed into
//! place. The publish directory is replaced as a whole: the new bundle is
//! assembled in `<publish_dir>.staging` and swapped in by rename, so the
//! published manifest never references a file that is not there.

use anyhow::{Context, Result};
use bundle_core::{encode_records, inflate};
use bundle_types::{
    CompressedArtifact, Manifest, NormalizedRecord, RawRecord, RawRecordSet, ARTIFACT_EXTENSION,
    MANIFEST_FILENAME,
};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::config::Config;

const JSON_EXTENSION: &str = ".json";

/// Paths of the raw, transformed, compressed and published stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
    publish: PathBuf,
}

impl DataLayout {
    /// Layout rooted at `data_dir`, publishing to `publish_dir`.
    pub fn new(data_dir: impl Into<PathBuf>, publish_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: data_dir.into(),
            publish: publish_dir.into(),
        }
    }

    /// Layout described by the configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.output.data_dir.clone(), config.publish_dir())
    }

    /// Raw store directory.
    pub fn raw_dir(&self) -> PathBuf {
        self.root.join("raw")
    }

    /// Normalized store directory.
    pub fn transformed_dir(&self) -> PathBuf {
        self.root.join("transformed")
    }

    /// Compressed artifact directory.
    pub fn compressed_dir(&self) -> PathBuf {
        self.root.join("compressed")
    }

    /// Published bundle directory.
    pub fn publish_dir(&self) -> &Path {
        &self.publish
    }

    /// Published manifest path.
    pub fn manifest_path(&self) -> PathBuf {
        self.publish.join(MANIFEST_FILENAME)
    }

    /// Whether the data stores live inside the publish directory.
    ///
    /// Publishing replaces that directory as a whole, so such a layout
    /// would delete the stores on every run.
    pub fn publish_contains_data(&self) -> bool {
        is_within(&self.root, &self.publish)
    }

    // =========================================================================
    // Raw store
    // =========================================================================

    /// Write one endpoint's raw records.
    pub async fn write_raw(&self, set: &RawRecordSet) -> Result<PathBuf> {
        let path = self
            .raw_dir()
            .join(format!("{}{JSON_EXTENSION}", set.endpoint_name));
        let data = serde_json::to_vec_pretty(&set.records)
            .with_context(|| format!("Failed to encode raw records for {}", set.endpoint_name))?;
        write_atomic(&path, &data).await?;
        Ok(path)
    }

    /// Read every raw record set, keyed by endpoint name.
    pub async fn read_raw(&self) -> Result<BTreeMap<String, RawRecordSet>> {
        let mut sets = BTreeMap::new();
        for (name, path) in list_files(&self.raw_dir(), JSON_EXTENSION).await? {
            let data = read(&path).await?;
            let records: Vec<RawRecord> = serde_json::from_slice(&data)
                .with_context(|| format!("Invalid raw data in {}", path.display()))?;
            sets.insert(name.clone(), RawRecordSet::new(name, records));
        }
        Ok(sets)
    }

    // =========================================================================
    // Normalized store
    // =========================================================================

    /// Write one endpoint's normalized records (compact JSON).
    pub async fn write_transformed(
        &self,
        endpoint: &str,
        records: &[NormalizedRecord],
    ) -> Result<PathBuf> {
        let path = self
            .transformed_dir()
            .join(format!("{endpoint}{JSON_EXTENSION}"));
        let data = encode_records(records)
            .with_context(|| format!("Failed to encode normalized records for {endpoint}"))?;
        write_atomic(&path, &data).await?;
        Ok(path)
    }

    /// Read every normalized record set, in endpoint name order.
    pub async fn read_transformed(&self) -> Result<Vec<(String, Vec<NormalizedRecord>)>> {
        let mut sets = Vec::new();
        for (name, path) in list_files(&self.transformed_dir(), JSON_EXTENSION).await? {
            let data = read(&path).await?;
            let records: Vec<NormalizedRecord> = serde_json::from_slice(&data)
                .with_context(|| format!("Invalid normalized data in {}", path.display()))?;
            sets.push((name, records));
        }
        Ok(sets)
    }

    // =========================================================================
    // Compressed store
    // =========================================================================

    /// Write one artifact.
    pub async fn write_compressed(&self, artifact: &CompressedArtifact) -> Result<PathBuf> {
        let path = self.compressed_dir().join(&artifact.filename);
        write_atomic(&path, &artifact.bytes).await?;
        Ok(path)
    }

    /// Read every artifact, in file name order.
    ///
    /// The original size is recovered by decompressing; an artifact that
    /// does not decompress reports an original size of zero.
    pub async fn read_compressed(&self) -> Result<Vec<CompressedArtifact>> {
        let mut artifacts = Vec::new();
        for (name, path) in list_files(&self.compressed_dir(), ARTIFACT_EXTENSION).await? {
            let bytes = read(&path).await?;
            let original = inflate(&bytes).map_or(0, |data| data.len() as u64);
            artifacts.push(CompressedArtifact::new(
                format!("{name}{ARTIFACT_EXTENSION}"),
                original,
                bytes,
            ));
        }
        Ok(artifacts)
    }

    // =========================================================================
    // Published bundle
    // =========================================================================

    /// Replace the published bundle with `artifacts` plus `manifest`.
    pub async fn publish(
        &self,
        artifacts: &[CompressedArtifact],
        manifest: &Manifest,
    ) -> Result<()> {
        if self.publish_contains_data() {
            anyhow::bail!(
                "Refusing to publish into {}: it contains the data directory {}",
                self.publish.display(),
                self.root.display()
            );
        }
        let staging = sibling(&self.publish, "staging")?;
        let previous = sibling(&self.publish, "previous")?;

        remove_dir_if_exists(&staging).await?;
        tokio::fs::create_dir_all(&staging)
            .await
            .with_context(|| format!("Failed to create {}", staging.display()))?;

        for artifact in artifacts {
            write_atomic(&staging.join(&artifact.filename), &artifact.bytes).await?;
        }
        let manifest_json =
            serde_json::to_vec_pretty(manifest).context("Failed to encode manifest")?;
        write_atomic(&staging.join(MANIFEST_FILENAME), &manifest_json).await?;

        remove_dir_if_exists(&previous).await?;
        if tokio::fs::try_exists(&self.publish).await.unwrap_or(false) {
            tokio::fs::rename(&self.publish, &previous)
                .await
                .with_context(|| format!("Failed to move aside {}", self.publish.display()))?;
        }
        tokio::fs::rename(&staging, &self.publish)
            .await
            .with_context(|| format!("Failed to publish {}", self.publish.display()))?;
        sync_directory(&parent_dir(&self.publish)).await?;

        if let Err(e) = remove_dir_if_exists(&previous).await {
            tracing::warn!("Could not remove previous bundle: {:#}", e);
        }
        Ok(())
    }

    /// Read the published manifest.
    pub async fn read_manifest(&self) -> Result<Manifest> {
        let path = self.manifest_path();
        let data = read(&path).await?;
        serde_json::from_slice(&data)
            .with_context(|| format!("Invalid manifest {}", path.display()))
    }

    /// Read a published file.
    pub async fn read_published(&self, filename: &str) -> Result<Vec<u8>> {
        read(&self.publish.join(filename)).await
    }
}

/// Write `data` to `path` atomically (temp file, fsync, rename, fsync dir).
pub async fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let dir = parent_dir(path);
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let temp_path = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&temp_path)
        .await
        .with_context(|| format!("Failed to create {}", temp_path.display()))?;
    file.write_all(data)
        .await
        .with_context(|| format!("Failed to write {}", temp_path.display()))?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(&temp_path, path)
        .await
        .with_context(|| format!("Failed to rename into {}", path.display()))?;
    sync_directory(&dir).await
}

/// List `<stem><suffix>` files of `dir`, sorted by stem.
///
/// A missing directory lists as empty.
pub async fn list_files(dir: &Path, suffix: &str) -> Result<Vec<(String, PathBuf)>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("Failed to list {}", dir.display())),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(stem) = name.strip_suffix(suffix) {
            if !stem.is_empty() && entry.file_type().await?.is_file() {
                files.push((stem.to_string(), entry.path()));
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Whether `inner` is `outer` or lies below it.
///
/// Both paths are made absolute and `.`/`..` are resolved lexically, so
/// neither has to exist.
pub fn is_within(inner: &Path, outer: &Path) -> bool {
    normalize(inner).starts_with(normalize(outer))
}

fn normalize(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    };
    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

async fn read(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Directory containing `path`; `.` for a bare relative name.
fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn sibling(dir: &Path, suffix: &str) -> Result<PathBuf> {
    let name = dir
        .file_name()
        .with_context(|| format!("{} has no directory name", dir.display()))?;
    Ok(dir.with_file_name(format!("{}.{suffix}", name.to_string_lossy())))
}

async fn remove_dir_if_exists(dir: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", dir.display())),
    }
}

#[cfg(unix)]
async fn sync_directory(dir: &Path) -> Result<()> {
    let dir = tokio::fs::File::open(dir)
        .await
        .with_context(|| format!("Failed to open {}", dir.display()))?;
    dir.sync_all().await?;
    Ok(())
}

#[cfg(not(unix))]
async fn sync_directory(_dir: &Path) -> Result<()> {
    Ok(())
}
