//! Streaming HTTP implementation of the artifact download collaborator.

use async_trait::async_trait;
use futures::StreamExt;
use nightjar_core::download::Downloader;
use nightjar_core::error::ArtifactError;
use std::time::Duration;
use tracing::debug;

/// Downloads artifacts over HTTP, refusing bodies larger than `max_bytes`.
///
/// Only a completely received body is returned; any error mid-stream
/// discards what was read so far.
pub struct HttpDownloader {
    client: reqwest::Client,
    max_bytes: u64,
}

impl HttpDownloader {
    pub fn new(max_bytes: u64, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, max_bytes }
    }

    fn too_large(&self, url: &str) -> ArtifactError {
        ArtifactError::TooLarge {
            url: url.to_string(),
            limit: self.max_bytes,
        }
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str) -> Result<Vec<u8>, ArtifactError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ArtifactError::Download {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArtifactError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes)
        {
            return Err(self.too_large(url));
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ArtifactError::Download {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
            if (body.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(self.too_large(url));
            }
            body.extend_from_slice(&chunk);
        }

        if body.is_empty() {
            return Err(ArtifactError::EmptyPayload {
                url: url.to_string(),
            });
        }

        debug!(url, bytes = body.len(), "Artifact downloaded");
        Ok(body)
    }
}
