//! Reachability collaborator: a cheap probe run before every remote call.

use async_trait::async_trait;

#[async_trait]
pub trait Reachability: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

/// A probe with a fixed answer. Useful for offline mode and tests.
pub struct StaticReachability(pub bool);

#[async_trait]
impl Reachability for StaticReachability {
    async fn is_reachable(&self) -> bool {
        self.0
    }
}
