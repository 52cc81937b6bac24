//! Configuration loading for psm-bundle.
//!
//! Configuration is loaded once from an optional TOML file. Every section
//! and key falls back to its default, so an empty file (or no file at all)
//! reproduces the reference behaviour against the BVL API.

use bundle_core::RetryPolicy;
use bundle_fetch::{FetchSettings, HttpSourceConfig, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::store::is_within;

/// Root configuration for psm-bundle.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Upstream API configuration.
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Fetch, retry and pacing configuration.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Output directory configuration.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Upstream API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL all endpoint paths are appended to.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Static client identifier header (default: PSM-Desk-DB/1.0).
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Timeout for every request in seconds (default: 60).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Fetch, retry and pacing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Records per page (default: 1000).
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Attempts per page request, including the first (default: 3).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay of the backoff in milliseconds (default: 2000).
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Pause between pages in milliseconds (default: 100).
    #[serde(default = "default_page_pause_ms")]
    pub page_pause_ms: u64,
    /// Endpoints fetched at once (default: 1, sequential).
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Outbound requests per second across all endpoints (default: 10).
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

/// Output directory configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root of the raw, transformed and compressed stores (default: data).
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Published bundle directory (default: `<data_dir>/bundle`).
    ///
    /// Must not be `data_dir` itself or one of its ancestors.
    pub publish_dir: Option<PathBuf>,
}

// Default value functions
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_page_size() -> usize {
    1000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_page_pause_ms() -> u64 {
    100
}

fn default_concurrency() -> usize {
    1
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            page_pause_ms: default_page_pause_ms(),
            concurrency: default_concurrency(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            publish_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load from `path` if given, otherwise use defaults, then validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or a value is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall or disable the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream.base_url.trim().is_empty() {
            return Err(ConfigError::invalid("upstream.base_url", "must not be empty"));
        }
        if self.upstream.timeout_secs == 0 {
            return Err(ConfigError::invalid("upstream.timeout_secs", "must be > 0"));
        }
        if self.fetch.page_size == 0 {
            return Err(ConfigError::invalid("fetch.page_size", "must be > 0"));
        }
        if self.fetch.max_retries == 0 {
            return Err(ConfigError::invalid("fetch.max_retries", "must be > 0"));
        }
        if self.fetch.concurrency == 0 {
            return Err(ConfigError::invalid("fetch.concurrency", "must be > 0"));
        }
        if self.fetch.requests_per_second == 0 {
            return Err(ConfigError::invalid("fetch.requests_per_second", "must be > 0"));
        }
        if is_within(&self.output.data_dir, &self.publish_dir()) {
            return Err(ConfigError::invalid(
                "output.publish_dir",
                "must not be or contain output.data_dir",
            ));
        }
        Ok(())
    }

    /// Published bundle directory.
    pub fn publish_dir(&self) -> PathBuf {
        self.output
            .publish_dir
            .clone()
            .unwrap_or_else(|| self.output.data_dir.join("bundle"))
    }

    /// Settings for the HTTP page source.
    pub fn http_source(&self) -> HttpSourceConfig {
        HttpSourceConfig {
            base_url: self.upstream.base_url.clone(),
            user_agent: self.upstream.user_agent.clone(),
            timeout: Duration::from_secs(self.upstream.timeout_secs),
        }
    }

    /// Settings for the fetcher.
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            page_size: self.fetch.page_size,
            retry: RetryPolicy::new(
                self.fetch.max_retries,
                Duration::from_millis(self.fetch.retry_delay_ms),
            ),
            page_pause: Duration::from_millis(self.fetch.page_pause_ms),
            requests_per_second: self.fetch.requests_per_second,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// A value is out of range.
    #[error("invalid config value {key}: {reason}")]
    Invalid {
        /// Dotted key of the offending value.
        key: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: &'static str) -> Self {
        Self::Invalid { key, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.upstream.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.upstream.user_agent, "PSM-Desk-DB/1.0");
        assert_eq!(config.fetch.page_size, 1000);
        assert_eq!(config.fetch.max_retries, 3);
        assert_eq!(config.publish_dir(), PathBuf::from("data/bundle"));
    }

    #[test]
    fn config_from_toml_string() {
        let toml = r#"
[upstream]
base_url = "http://localhost:8080/api"
timeout_secs = 5

[fetch]
page_size = 250
max_retries = 5
retry_delay_ms = 500
concurrency = 4

[output]
data_dir = "/srv/psm"
publish_dir = "/srv/www/psm"
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.upstream.base_url, "http://localhost:8080/api");
        assert_eq!(config.upstream.user_agent, "PSM-Desk-DB/1.0");
        assert_eq!(config.fetch.page_size, 250);
        assert_eq!(config.fetch.concurrency, 4);
        assert_eq!(config.fetch.page_pause_ms, 100);
        assert_eq!(config.publish_dir(), PathBuf::from("/srv/www/psm"));

        let settings = config.fetch_settings();
        assert_eq!(settings.page_size, 250);
        assert_eq!(settings.retry.max_attempts(), 5);
        assert_eq!(settings.retry.base_delay(), Duration::from_millis(500));
        assert_eq!(config.http_source().timeout, Duration::from_secs(5));
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.fetch.retry_delay_ms, 2000);
        assert_eq!(config.upstream.timeout_secs, 60);
        assert_eq!(config.output.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn rejects_zero_values() {
        for toml in [
            "[fetch]\npage_size = 0",
            "[fetch]\nmax_retries = 0",
            "[fetch]\nconcurrency = 0",
            "[fetch]\nrequests_per_second = 0",
            "[upstream]\ntimeout_secs = 0",
            "[upstream]\nbase_url = \"  \"",
        ] {
            let config: Config = toml::from_str(toml).unwrap();
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid { .. })),
                "{toml}"
            );
        }
    }

    #[test]
    fn rejects_publish_dir_holding_the_data_dir() {
        for toml in [
            "[output]\npublish_dir = \"data\"",
            "[output]\ndata_dir = \"/srv/psm/data\"\npublish_dir = \"/srv/psm\"",
            "[output]\ndata_dir = \"out/data\"\npublish_dir = \"out/data/../data/\"",
        ] {
            let config: Config = toml::from_str(toml).unwrap();
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("output.publish_dir"), "{toml}");
        }

        let config: Config =
            toml::from_str("[output]\ndata_dir = \"data\"\npublish_dir = \"data/public\"").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/psm.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn load_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("psm.toml");
        std::fs::write(&path, "[fetch]\npage_size = \"many\"").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("psm.toml"));
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.fetch.requests_per_second, 10);
    }
}
