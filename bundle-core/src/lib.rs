//! # bundle-core
//!
//! Pure logic for the PSM bundle pipeline (no network I/O, instant tests).
//!
//! This crate implements the ordering, retry, transformation, compression
//! and manifest algorithms without touching the network, enabling fast
//! unit tests.
//!
//! ## Design Philosophy
//!
//! Every function here is a function of its input:
//! - The catalog order is a stable total order
//! - Retry decisions are computed, not slept
//! - Compression is byte-for-byte deterministic
//! - The manifest takes the generation time as a parameter
//!
//! The actual I/O (HTTP, sleeping, files) is performed by `bundle-fetch`
//! and the CLI, which interpret the decisions produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod compress;
pub mod error;
pub mod manifest;
pub mod pagination;
pub mod retry;
pub mod transform;

pub use catalog::Catalog;
pub use compress::{compress, decode_records, encode_records, inflate};
pub use error::{CatalogError, CodecError};
pub use manifest::{build_manifest, count_records, round_kb, sha256_checksum, verify_checksum};
pub use pagination::{PageCursor, PageStep};
pub use retry::{RetryDecision, RetryPolicy};
pub use transform::{FieldProjection, FieldSource, PassThrough, RuleRegistry, TransformRule};
