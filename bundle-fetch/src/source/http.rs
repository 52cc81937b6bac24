//! HttpPageSource - the real upstream over HTTPS.
//!
//! Requests `{base_url}{path}?limit={limit}&offset={offset}` with
//! `Accept: application/json` and a static `User-Agent`. Every request is
//! bounded by the configured timeout.

use super::{parse_page, PageSource};
use async_trait::async_trait;
use bundle_types::{PageError, RawRecord};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use std::time::Duration;

/// Base URL of the BVL plant protection product API.
pub const DEFAULT_BASE_URL: &str = "https://psm-api.bvl.bund.de/ords/psm/api-v1";

/// Client identifier sent with every request.
pub const DEFAULT_USER_AGENT: &str = "PSM-Desk-DB/1.0";

/// Configuration for HttpPageSource.
#[derive(Clone, Debug)]
pub struct HttpSourceConfig {
    /// Upstream base URL, without a trailing slash.
    pub base_url: String,
    /// Static client identifier header.
    pub user_agent: String,
    /// Timeout for a whole request, including the body.
    pub timeout: Duration,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Page source backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
    base_url: String,
}

impl HttpPageSource {
    /// Create a source from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: HttpSourceConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(config.user_agent)
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL of one page request.
    pub fn page_url(&self, path: &str, limit: usize, offset: usize) -> String {
        format!("{}{}?limit={}&offset={}", self.base_url, path, limit, offset)
    }
}

fn transport_error(e: reqwest::Error) -> PageError {
    if e.is_timeout() {
        PageError::Transport(format!("timeout: {e}"))
    } else if e.is_connect() {
        PageError::Transport(format!("connect: {e}"))
    } else {
        PageError::Transport(e.to_string())
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(
        &self,
        path: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<RawRecord>, PageError> {
        let url = self.page_url(path, limit, offset);
        tracing::debug!("GET {}", url);

        let response = self.client.get(&url).send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PageError::from_status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(transport_error)?;
        Ok(parse_page(path, &body))
    }
}
