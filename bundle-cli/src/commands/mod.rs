//! CLI command implementations.
//!
//! Each pipeline stage reads the previous stage's store and writes its
//! own, so stages can be run one at a time or chained by `run`.

pub mod compress;
pub mod endpoints;
pub mod fetch;
pub mod manifest;
pub mod run;
pub mod transform;
pub mod verify;
