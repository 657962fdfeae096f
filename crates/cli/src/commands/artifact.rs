//! `nightjar artifact`: fetch an artifact through the cache.

use nightjar_config::AppConfig;
use nightjar_memory::{ArtifactCacheManager, cache_key};
use nightjar_providers::HttpDownloader;
use std::path::PathBuf;
use std::sync::Arc;

pub async fn run(url: &str, output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let downloader = Arc::new(HttpDownloader::new(
        config.artifacts.max_bytes,
        config.provider.request_timeout(),
    ));
    let cache = ArtifactCacheManager::new(config.artifacts.capacity, downloader);

    let bytes = cache.fetch(url).await?;
    println!("{}  {} bytes", cache_key(url), bytes.len());

    if let Some(path) = output {
        tokio::fs::write(&path, bytes.as_slice()).await?;
        println!("Written to {}", path.display());
    }

    Ok(())
}
