//! # psm-bundle
//!
//! Syncs the BVL plant protection product API into a versioned,
//! checksummed bundle of gzip-compressed JSON files.
//!
//! ## Commands
//!
//! - `endpoints`: List the endpoint catalog in processing order
//! - `fetch`: Fetch every endpoint into `<data_dir>/raw`
//! - `transform`: Normalize raw records into `<data_dir>/transformed`
//! - `compress`: Compress normalized records into `<data_dir>/compressed`
//! - `manifest`: Build `manifest.json` and publish the bundle
//! - `run`: All four stages in order
//! - `verify`: Check the published bundle against its manifest
//!
//! ## Example
//!
//! ```bash
//! # Smoke test: one record per endpoint
//! psm-bundle run --test
//!
//! # Full sync with a config file
//! psm-bundle --config psm.toml run --fail-on-empty
//!
//! # Check what clients will download
//! psm-bundle verify
//! ```

use anyhow::{Context, Result};
use bundle_core::{Catalog, RuleRegistry};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod store;

use commands::fetch::FetchOptions;
use commands::{compress, endpoints, fetch, manifest, run, transform, verify};
use config::Config;
use store::DataLayout;

/// Sync the BVL plant protection API into a compressed, checksummed bundle.
#[derive(Parser, Debug)]
#[command(name = "psm-bundle")]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML configuration file (defaults apply when omitted)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Data directory, overrides `output.data_dir`
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the endpoint catalog in processing order
    Endpoints,

    /// Fetch every endpoint into the raw store
    Fetch {
        /// Fetch a single record per endpoint
        #[arg(long)]
        test: bool,

        /// Exit with an error when no records were fetched at all
        #[arg(long)]
        fail_on_empty: bool,
    },

    /// Normalize raw records
    Transform,

    /// Compress normalized records
    Compress,

    /// Build the manifest and publish the bundle
    Manifest,

    /// Run fetch, transform, compress and manifest in order
    Run {
        /// Fetch a single record per endpoint
        #[arg(long)]
        test: bool,

        /// Exit with an error when no records were fetched at all
        #[arg(long)]
        fail_on_empty: bool,
    },

    /// Check the published bundle against its manifest
    Verify,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load(cli.config.as_deref()).context("Invalid configuration")?;
    if let Some(dir) = cli.data_dir {
        config.output.data_dir = dir;
        config.validate().context("Invalid configuration")?;
    }
    let layout = DataLayout::from_config(&config);

    let catalog = Catalog::bvl();
    let registry = RuleRegistry::bvl();
    for name in registry.missing_for(&catalog) {
        tracing::warn!("Endpoint {} has no transform rule", name);
    }

    match cli.command {
        Commands::Endpoints => {
            endpoints::run(&catalog, &registry)?;
        }
        Commands::Fetch {
            test,
            fail_on_empty,
        } => {
            let options = FetchOptions {
                test_mode: test,
                fail_on_empty,
            };
            fetch::run(&config, &layout, &catalog, options).await?;
        }
        Commands::Transform => {
            transform::run(&layout, &registry).await?;
        }
        Commands::Compress => {
            compress::run(&layout).await?;
        }
        Commands::Manifest => {
            manifest::run(&layout, &catalog, Utc::now()).await?;
        }
        Commands::Run {
            test,
            fail_on_empty,
        } => {
            let options = FetchOptions {
                test_mode: test,
                fail_on_empty,
            };
            run::run(&config, &layout, &catalog, &registry, options).await?;
        }
        Commands::Verify => {
            let report = verify::run(&layout).await?;
            if !report.is_ok() {
                anyhow::bail!(
                    "Bundle {} is inconsistent: {} missing, {} mismatched, {} miscounted",
                    report.version,
                    report.missing.len(),
                    report.mismatched.len(),
                    report.miscounted.len()
                );
            }
        }
    }

    Ok(())
}

/// Install the log subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
