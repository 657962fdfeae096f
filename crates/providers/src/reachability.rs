//! Cheap reachability probe for the inference service.

use async_trait::async_trait;
use nightjar_core::network::Reachability;
use std::time::Duration;
use tracing::debug;

/// Considers the service reachable if a `HEAD` request to `url` gets any
/// HTTP response within the timeout, whatever its status.
pub struct HttpReachability {
    client: reqwest::Client,
    url: String,
}

impl HttpReachability {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Reachability for HttpReachability {
    async fn is_reachable(&self) -> bool {
        match self.client.head(&self.url).send().await {
            Ok(resp) => {
                debug!(url = %self.url, status = resp.status().as_u16(), "Service reachable");
                true
            }
            Err(e) => {
                debug!(url = %self.url, error = %e, "Service unreachable");
                false
            }
        }
    }
}
