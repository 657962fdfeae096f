//! Fetch-on-miss cache for downloaded artifacts (adapter weights etc).
//!
//! Artifacts are keyed by the SHA-256 of their source URL. The cache lock
//! is never held across a download, so a slow fetch does not block hits
//! for other artifacts.

use nightjar_core::download::Downloader;
use nightjar_core::error::ArtifactError;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::bounded::BoundedCache;

/// Content-addressed key for an artifact URL (lowercase hex SHA-256).
pub fn cache_key(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}

pub struct ArtifactCacheManager {
    cache: Mutex<BoundedCache<String, Arc<Vec<u8>>>>,
    downloader: Arc<dyn Downloader>,
}

impl ArtifactCacheManager {
    pub fn new(capacity: usize, downloader: Arc<dyn Downloader>) -> Self {
        Self {
            cache: Mutex::new(BoundedCache::new(capacity)),
            downloader,
        }
    }

    /// Return the bytes behind `url`, downloading them on a cache miss.
    ///
    /// Failed or empty downloads are never cached, so the next fetch for
    /// the same URL tries the network again.
    pub async fn fetch(&self, url: &str) -> Result<Arc<Vec<u8>>, ArtifactError> {
        let key = cache_key(url);

        if let Some(bytes) = self.cache.lock().await.get(&key) {
            debug!(key = %key, "Artifact cache hit");
            return Ok(Arc::clone(bytes));
        }

        debug!(url, "Artifact cache miss, downloading");
        let bytes = self.downloader.download(url).await?;
        if bytes.is_empty() {
            return Err(ArtifactError::EmptyPayload {
                url: url.to_string(),
            });
        }

        let bytes = Arc::new(bytes);
        let size = bytes.len();
        if let Some(evicted) = self.cache.lock().await.set(key.clone(), Arc::clone(&bytes)) {
            info!(evicted = %evicted, "Evicted least recently used artifact");
        }
        info!(key = %key, size, "Artifact cached");
        Ok(bytes)
    }

    /// Drop the artifact for `url`. Returns whether it was cached.
    pub async fn remove(&self, url: &str) -> bool {
        self.cache.lock().await.remove(&cache_key(url)).is_some()
    }

    pub async fn clear(&self) {
        self.cache.lock().await.clear();
    }

    /// Whether `url` is cached. Does not affect recency.
    pub async fn contains(&self, url: &str) -> bool {
        self.cache.lock().await.contains(&cache_key(url))
    }

    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.lock().await.is_empty()
    }

    pub async fn capacity(&self) -> usize {
        self.cache.lock().await.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex as StdMutex;

    /// Serves `url` bytes back, failing for URLs in `failing`.
    struct MockDownloader {
        calls: StdMutex<Vec<String>>,
        failing: StdMutex<HashSet<String>>,
        empty: bool,
    }

    impl MockDownloader {
        fn new() -> Self {
            Self {
                calls: StdMutex::new(Vec::new()),
                failing: StdMutex::new(HashSet::new()),
                empty: false,
            }
        }

        fn fail(&self, url: &str) {
            self.failing.lock().unwrap().insert(url.to_string());
        }

        fn recover(&self, url: &str) {
            self.failing.lock().unwrap().remove(url);
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Downloader for MockDownloader {
        async fn download(&self, url: &str) -> Result<Vec<u8>, ArtifactError> {
            self.calls.lock().unwrap().push(url.to_string());
            if self.failing.lock().unwrap().contains(url) {
                return Err(ArtifactError::Download {
                    url: url.to_string(),
                    reason: "connection reset".into(),
                });
            }
            if self.empty {
                return Ok(Vec::new());
            }
            Ok(url.as_bytes().to_vec())
        }
    }

    #[test]
    fn cache_key_is_sha256_hex() {
        let key = cache_key("https://example.com/adapter.bin");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, cache_key("https://example.com/adapter.bin"));
        assert_ne!(key, cache_key("https://example.com/other.bin"));
    }

    #[tokio::test]
    async fn hit_skips_download() {
        let downloader = Arc::new(MockDownloader::new());
        let manager = ArtifactCacheManager::new(3, downloader.clone());

        let first = manager.fetch("https://a").await.unwrap();
        let second = manager.fetch("https://a").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(downloader.call_count(), 1);
    }

    #[tokio::test]
    async fn failed_download_is_not_cached() {
        let downloader = Arc::new(MockDownloader::new());
        let manager = ArtifactCacheManager::new(3, downloader.clone());

        downloader.fail("https://a");
        assert!(manager.fetch("https://a").await.is_err());
        assert!(!manager.contains("https://a").await);

        downloader.recover("https://a");
        let bytes = manager.fetch("https://a").await.unwrap();
        assert_eq!(bytes.as_slice(), b"https://a");
        assert_eq!(downloader.call_count(), 2);
    }

    #[tokio::test]
    async fn empty_download_is_rejected() {
        let downloader = Arc::new(MockDownloader {
            empty: true,
            ..MockDownloader::new()
        });
        let manager = ArtifactCacheManager::new(3, downloader);

        let err = manager.fetch("https://a").await.unwrap_err();
        assert!(matches!(err, ArtifactError::EmptyPayload { .. }));
        assert!(manager.is_empty().await);
    }

    #[tokio::test]
    async fn least_recently_used_artifact_is_evicted() {
        let downloader = Arc::new(MockDownloader::new());
        let manager = ArtifactCacheManager::new(3, downloader.clone());

        for url in ["https://a", "https://b", "https://c"] {
            manager.fetch(url).await.unwrap();
        }
        manager.fetch("https://a").await.unwrap();
        manager.fetch("https://d").await.unwrap();

        assert_eq!(manager.len().await, 3);
        assert!(manager.contains("https://a").await);
        assert!(!manager.contains("https://b").await);
        assert_eq!(downloader.call_count(), 4);
    }

    #[tokio::test]
    async fn remove_forces_redownload() {
        let downloader = Arc::new(MockDownloader::new());
        let manager = ArtifactCacheManager::new(3, downloader.clone());

        manager.fetch("https://a").await.unwrap();
        assert!(manager.remove("https://a").await);
        assert!(!manager.remove("https://a").await);
        manager.fetch("https://a").await.unwrap();
        assert_eq!(downloader.call_count(), 2);
    }
}
