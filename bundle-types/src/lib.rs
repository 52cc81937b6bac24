//! # bundle-types
//!
//! Data model shared by every stage of the PSM dataset bundle pipeline.
//!
//! This crate provides the foundational types used across all bundle crates:
//! - [`EndpointDescriptor`] - One upstream dataset source and its ordering metadata
//! - [`RawRecord`], [`RawRecordSet`] - Opaque upstream records, one set per endpoint
//! - [`NormalizedRecord`] - A record reshaped into its endpoint's declared schema
//! - [`CompressedArtifact`] - One gzip-compressed dataset file
//! - [`Manifest`], [`ManifestEntry`] - The versioned bundle index
//! - [`PageError`] - Typed classification of page request faults

#![warn(missing_docs)]
#![warn(clippy::all)]

mod artifact;
mod endpoint;
mod error;
mod manifest;
mod records;

pub use artifact::{CompressedArtifact, ARTIFACT_EXTENSION};
pub use endpoint::EndpointDescriptor;
pub use error::PageError;
pub use manifest::{Manifest, ManifestEntry, MANIFEST_FILENAME};
pub use records::{NormalizedRecord, RawRecord, RawRecordSet};
