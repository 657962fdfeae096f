//! Download collaborator used by the artifact cache on a miss.

use async_trait::async_trait;
use crate::error::ArtifactError;

#[async_trait]
pub trait Downloader: Send + Sync {
    /// Fetch the complete body behind `url`.
    ///
    /// Must only return `Ok` for a fully received body; partial transfers
    /// are errors.
    async fn download(&self, url: &str) -> std::result::Result<Vec<u8>, ArtifactError>;
}
