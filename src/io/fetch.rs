use std::{collections::HashMap, sync::Arc, time::Duration};

use futures_util::{FutureExt as _, future::BoxFuture};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;

use crate::foundation::error::{ColorizerError, ColorizerResult};

/// Default budget for a single request before it is aborted.
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 2000;

/// Source of raw bytes addressed by URL.
///
/// Implementations perform exactly one attempt per call; retries are a caller decision.
pub trait Fetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ColorizerResult<Vec<u8>>>;
}

/// HTTP(S) fetcher. Non-2xx responses are errors.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ColorizerResult<Vec<u8>>> {
        async move {
            // Protocol-relative URLs have no page to inherit a scheme from.
            let target = match url.strip_prefix("//") {
                Some(rest) => format!("https://{rest}"),
                None => url.to_string(),
            };
            let resp = self
                .client
                .get(&target)
                .send()
                .await
                .map_err(|e| ColorizerError::fetch(url, e))?;
            let status = resp.status();
            if !status.is_success() {
                return Err(ColorizerError::fetch(url, format!("HTTP {status}")));
            }
            let bytes = resp
                .bytes()
                .await
                .map_err(|e| ColorizerError::fetch(url, e))?;
            Ok(bytes.to_vec())
        }
        .boxed()
    }
}

/// Local filesystem fetcher accepting plain paths and `file://` URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsFetcher;

impl Fetcher for FsFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ColorizerResult<Vec<u8>>> {
        async move {
            let path = url.strip_prefix("file://").unwrap_or(url);
            tokio::fs::read(path)
                .await
                .map_err(|e| ColorizerError::fetch(url, e))
        }
        .boxed()
    }
}

/// In-memory fetcher for embedded datasets. Counts every request per URL.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    files: Mutex<HashMap<String, Vec<u8>>>,
    requests: Mutex<HashMap<String, usize>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.lock().insert(url.into(), bytes.into());
    }

    pub fn insert_json(&self, url: impl Into<String>, value: &serde_json::Value) {
        self.insert(url, value.to_string());
    }

    /// Number of times `url` was requested, whether or not it existed.
    pub fn request_count(&self, url: &str) -> usize {
        self.requests.lock().get(url).copied().unwrap_or(0)
    }

    pub fn total_requests(&self) -> usize {
        self.requests.lock().values().sum()
    }
}

impl Fetcher for MemoryFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ColorizerResult<Vec<u8>>> {
        async move {
            *self.requests.lock().entry(url.to_string()).or_insert(0) += 1;
            // Yield once so concurrent callers interleave like real I/O.
            tokio::task::yield_now().await;
            self.files
                .lock()
                .get(url)
                .cloned()
                .ok_or_else(|| ColorizerError::fetch(url, "not found"))
        }
        .boxed()
    }
}

/// A [`Fetcher`] plus the abort-based timeout applied to every request.
#[derive(Clone)]
pub struct FetchClient {
    fetcher: Arc<dyn Fetcher>,
    timeout: Duration,
}

impl std::fmt::Debug for FetchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchClient")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl FetchClient {
    pub fn new(fetcher: Arc<dyn Fetcher>, timeout: Duration) -> Self {
        Self { fetcher, timeout }
    }

    /// HTTP for web URLs, filesystem for everything else.
    pub fn for_url(url: &str, timeout: Duration) -> Self {
        if is_url(url) {
            Self::new(Arc::new(HttpFetcher::new()), timeout)
        } else {
            Self::new(Arc::new(FsFetcher), timeout)
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch `url`, failing with [`ColorizerError::Timeout`] once the budget is spent.
    pub async fn get(&self, url: &str) -> ColorizerResult<Vec<u8>> {
        match tokio::time::timeout(self.timeout, self.fetcher.fetch(url)).await {
            Ok(result) => result,
            Err(_) => {
                let timeout_ms = self.timeout.as_millis() as u64;
                tracing::warn!(url, timeout_ms, "fetch timed out");
                Err(ColorizerError::timeout(url, timeout_ms))
            }
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> ColorizerResult<T> {
        let bytes = self.get(url).await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ColorizerError::decode(format!("invalid JSON in '{url}': {e}")))
    }
}

/// Trim whitespace and drop one trailing `/`.
pub fn format_path(input: &str) -> String {
    let trimmed = input.trim();
    trimmed.strip_suffix('/').unwrap_or(trimmed).trim().to_string()
}

/// Join a base URL (or directory) and a relative file name.
pub fn resolve_url(base: &str, rel: &str) -> String {
    format!("{}/{}", format_path(base), rel)
}

/// `true` for web resources (`http://`, `https://`) and protocol-relative `//` URLs.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://") || input.starts_with("//")
}

pub fn is_json(path: &str) -> bool {
    path.ends_with(".json")
}

/// Everything before the last `/`, or `"."` when there is none.
pub fn parent_url(url: &str) -> String {
    match format_path(url).rsplit_once('/') {
        Some((dir, _)) => dir.to_string(),
        None => ".".to_string(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/io/fetch.rs"]
mod tests;
