//! Mock page source for testing.
//!
//! Serves whole datasets page by page, replays scripted responses, injects
//! failures, and records every request for verification.

use super::PageSource;
use async_trait::async_trait;
use bundle_types::{PageError, RawRecord};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// One request received by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Endpoint path.
    pub path: String,
    /// Requested page size.
    pub limit: usize,
    /// Requested offset.
    pub offset: usize,
}

type Scripted = VecDeque<Result<Vec<RawRecord>, PageError>>;

/// Mock page source for testing.
///
/// For each request the mock answers, in order of precedence:
/// 1. the persistent failure set with [`fail_always`](Self::fail_always)
/// 2. the next scripted response queued with [`queue_page`](Self::queue_page)
///    or [`queue_error`](Self::queue_error)
/// 3. the matching slice of the dataset set with [`serve`](Self::serve)
/// 4. an empty page
#[derive(Debug, Default)]
pub struct MockPageSource {
    inner: Arc<Mutex<MockPageSourceInner>>,
}

#[derive(Debug, Default)]
struct MockPageSourceInner {
    datasets: HashMap<String, Vec<RawRecord>>,
    scripted: HashMap<String, Scripted>,
    failures: HashMap<String, PageError>,
    requests: Vec<PageRequest>,
}

impl MockPageSource {
    /// Create a new mock source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `records` for `path`, sliced by `limit` and `offset`.
    pub fn serve(&self, path: &str, records: Vec<RawRecord>) {
        let mut inner = self.inner.lock().unwrap();
        inner.datasets.insert(path.to_string(), records);
    }

    /// Queue a page to be returned by the next request for `path`.
    pub fn queue_page(&self, path: &str, records: Vec<RawRecord>) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .scripted
            .entry(path.to_string())
            .or_default()
            .push_back(Ok(records));
    }

    /// Queue an error to be returned by the next request for `path`.
    pub fn queue_error(&self, path: &str, error: PageError) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .scripted
            .entry(path.to_string())
            .or_default()
            .push_back(Err(error));
    }

    /// Fail every request for `path` with `error`.
    pub fn fail_always(&self, path: &str, error: PageError) {
        let mut inner = self.inner.lock().unwrap();
        inner.failures.insert(path.to_string(), error);
    }

    /// Get all requests received so far.
    pub fn requests(&self) -> Vec<PageRequest> {
        let inner = self.inner.lock().unwrap();
        inner.requests.clone()
    }

    /// Get the requests received for one path.
    pub fn requests_for(&self, path: &str) -> Vec<PageRequest> {
        let inner = self.inner.lock().unwrap();
        inner
            .requests
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }
}

impl Clone for MockPageSource {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl PageSource for MockPageSource {
    async fn fetch_page(
        &self,
        path: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<RawRecord>, PageError> {
        let mut inner = self.inner.lock().unwrap();

        inner.requests.push(PageRequest {
            path: path.to_string(),
            limit,
            offset,
        });

        if let Some(error) = inner.failures.get(path) {
            return Err(error.clone());
        }

        if let Some(response) = inner.scripted.get_mut(path).and_then(VecDeque::pop_front) {
            return response;
        }

        Ok(inner
            .datasets
            .get(path)
            .map(|records| records.iter().skip(offset).take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
