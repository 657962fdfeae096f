//! The request pipeline of Nightjar.
//!
//! A request flows through three stages:
//!
//! 1. **Check** that the remote service is usable (reachable, not disabled)
//! 2. **Build** a prompt from the input plus recent history under a token budget
//! 3. **Predict** remotely, or fall back to the local recommender on any failure
//!
//! [`HybridOrchestrator::respond`] never fails: the worst case is a local
//! recommendation.

pub mod context;
pub mod hybrid;
pub mod recommend;

pub use context::{ContextBudgetBuilder, estimate_tokens};
pub use hybrid::{FallbackReason, HybridOrchestrator, Reply, ReplySource};
pub use recommend::KeywordRecommender;
