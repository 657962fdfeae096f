//! Bounded in-memory storage for Nightjar.
//!
//! Two independent resource domains live here, each behind its own lock:
//! the conversation window and the artifact cache. Both are built on the
//! same [`BoundedCache`].

pub mod artifact;
pub mod bounded;
pub mod conversation;

pub use artifact::{ArtifactCacheManager, cache_key};
pub use bounded::BoundedCache;
pub use conversation::InMemoryConversationStore;
