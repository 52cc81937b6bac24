//! # bundle-fetch
//!
//! Fetching side of the PSM bundle pipeline.
//!
//! This crate performs all network I/O: it walks the endpoint catalog,
//! pages through every endpoint and retries transient faults. Policy
//! decisions (page cursor, backoff) come from `bundle-core`.
//!
//! ## Features
//!
//! - **Source Abstraction**: Pluggable page source (HTTP, mock)
//! - **All-or-nothing Fetches**: An endpoint yields every record or none
//! - **Bounded Concurrency**: Worker pool over endpoints with a shared rate limiter
//!
//! ## Example
//!
//! ```ignore
//! use bundle_core::Catalog;
//! use bundle_fetch::{FetchSettings, Fetcher, HttpPageSource, HttpSourceConfig, Orchestrator};
//!
//! let source = HttpPageSource::new(HttpSourceConfig::default())?;
//! let orchestrator = Orchestrator::new(Fetcher::new(source, FetchSettings::default()), 1);
//!
//! let run = orchestrator.run(&Catalog::bvl(), false).await;
//! println!("{} records", run.total_records());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod fetcher;
pub mod limits;
pub mod orchestrator;
pub mod source;

pub use fetcher::{FetchError, FetchSettings, Fetcher};
pub use limits::RequestLimiter;
pub use orchestrator::{EndpointOutcome, Orchestrator, SyncRun};
pub use source::{
    parse_page, HttpPageSource, HttpSourceConfig, MockPageSource, PageRequest, PageSource,
    DEFAULT_BASE_URL, DEFAULT_USER_AGENT,
};
