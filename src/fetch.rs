//! Resource fetching for hit-region documents and registries
//!
//! Everything the runtime reads at navigation time goes through
//! [`ResourceFetcher`], so the loader never cares whether a document came from
//! an HTTP server, the asset directory or memory.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::sync::lock;

/// Status and body of a fetched resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self { status: 200, body: body.into() }
    }

    pub fn not_found() -> Self {
        Self { status: 404, body: String::new() }
    }

    /// 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Source of documents referenced by the registry.
///
/// `Err` means the transport failed (connection refused, timeout, unreadable
/// file). A reachable server answering 404 is an `Ok` with that status.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchResponse>;
}

pub(crate) fn is_http(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// HTTP fetcher with caching disabled
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: Option<reqwest::Url>,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent("hitscreen/0.1")
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, base_url: None })
    }

    /// Resolve relative references against `base_url`
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        let url = reqwest::Url::parse(base_url)
            .with_context(|| format!("Invalid base URL: {}", base_url))?;
        self.base_url = Some(url);
        Ok(self)
    }

    fn resolve(&self, url: &str) -> Result<reqwest::Url> {
        match &self.base_url {
            Some(base) => base.join(url).with_context(|| format!("Cannot resolve {} against {}", url, base)),
            None => reqwest::Url::parse(url).with_context(|| format!("Invalid URL: {}", url)),
        }
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        let resolved = self.resolve(url)?;
        log::debug!("GET {}", resolved);

        let response = self.client
            .get(resolved.clone())
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await
            .with_context(|| format!("Request to {} failed", resolved))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read body from {}", resolved))?;

        Ok(FetchResponse { status, body })
    }
}

/// Reads documents from an asset directory
#[derive(Debug, Clone)]
pub struct FileFetcher {
    base_dir: PathBuf,
}

impl FileFetcher {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn resolve(&self, url: &str) -> PathBuf {
        let trimmed = url.trim().trim_start_matches("file://");
        let path = Path::new(trimmed);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(trimmed.trim_start_matches("./"))
        }
    }
}

#[async_trait]
impl ResourceFetcher for FileFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        let path = self.resolve(url);
        match tokio::fs::read_to_string(&path).await {
            Ok(body) => Ok(FetchResponse::ok(body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No such asset: {:?}", path);
                Ok(FetchResponse::not_found())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to read {:?}", path)),
        }
    }
}

/// Routes `http(s)://` references to HTTP and everything else to the asset
/// directory, unless the HTTP side has a base URL for relative references
pub struct DefaultFetcher {
    http: HttpFetcher,
    files: FileFetcher,
}

impl DefaultFetcher {
    pub fn new(http: HttpFetcher, files: FileFetcher) -> Self {
        Self { http, files }
    }
}

#[async_trait]
impl ResourceFetcher for DefaultFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        if is_http(url) || self.http.base_url.is_some() {
            self.http.fetch(url).await
        } else {
            self.files.fetch(url).await
        }
    }
}

#[derive(Debug, Clone)]
enum MemoryEntry {
    Response(FetchResponse),
    Failure(String),
}

/// In-memory documents, for embedding and tests.
///
/// Unknown URLs answer 404. [`MemoryFetcher::fail`] registers a transport
/// failure and [`MemoryFetcher::delay`] holds a response back.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    entries: Mutex<HashMap<String, MemoryEntry>>,
    delays: Mutex<HashMap<String, Duration>>,
    fetches: AtomicUsize,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200 at `url`
    pub fn insert(&self, url: &str, body: impl Into<String>) -> &Self {
        self.respond(url, FetchResponse::ok(body))
    }

    pub fn respond(&self, url: &str, response: FetchResponse) -> &Self {
        lock(&self.entries).insert(url.to_string(), MemoryEntry::Response(response));
        self
    }

    /// Make `url` fail at the transport level
    pub fn fail(&self, url: &str, reason: &str) -> &Self {
        lock(&self.entries).insert(url.to_string(), MemoryEntry::Failure(reason.to_string()));
        self
    }

    /// Hold the response for `url` back by `delay`
    pub fn delay(&self, url: &str, delay: Duration) -> &Self {
        lock(&self.delays).insert(url.to_string(), delay);
        self
    }

    /// Total number of fetches served
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceFetcher for MemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let delay = lock(&self.delays).get(url).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let entry = lock(&self.entries).get(url).cloned();
        match entry {
            Some(MemoryEntry::Response(response)) => Ok(response),
            Some(MemoryEntry::Failure(reason)) => Err(anyhow::anyhow!("{}: {}", url, reason)),
            None => Ok(FetchResponse::not_found()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_detection() {
        assert!(is_http("https://example.com/a.json"));
        assert!(is_http("HTTP://example.com/a.json"));
        assert!(!is_http("hitboxes/menu.json"));
        assert!(!is_http("file:///tmp/a.json"));
    }

    #[test]
    fn test_file_fetcher_resolves_relative_paths() {
        let fetcher = FileFetcher::new("/srv/assets");
        assert_eq!(fetcher.resolve("./hitboxes/menu.json"), PathBuf::from("/srv/assets/hitboxes/menu.json"));
        assert_eq!(fetcher.resolve("/abs/menu.json"), PathBuf::from("/abs/menu.json"));
    }

    #[tokio::test]
    async fn test_file_fetcher_missing_file_is_404() {
        let dir = std::env::temp_dir().join(format!("hitscreen-fetch-{}", rand::random::<u64>()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("menu.json"), r#"{"hitboxes":[]}"#).await.unwrap();

        let fetcher = FileFetcher::new(dir.clone());
        let found = fetcher.fetch("menu.json").await.unwrap();
        assert!(found.is_success());
        assert_eq!(found.body, r#"{"hitboxes":[]}"#);

        let missing = fetcher.fetch("nope.json").await.unwrap();
        assert_eq!(missing.status, 404);

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn test_memory_fetcher_serves_and_fails() {
        let fetcher = MemoryFetcher::new();
        fetcher.insert("a.json", "{}").fail("b.json", "connection reset");

        assert_eq!(fetcher.fetch("a.json").await.unwrap(), FetchResponse::ok("{}"));
        assert!(fetcher.fetch("b.json").await.is_err());
        assert_eq!(fetcher.fetch("c.json").await.unwrap().status, 404);
        assert_eq!(fetcher.fetch_count(), 3);
    }
}
