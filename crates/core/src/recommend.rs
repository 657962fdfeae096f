//! Local heuristic collaborator used when the remote path is unusable.

use serde::{Deserialize, Serialize};

/// What the caller asked and the situation it was asked in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationContext {
    /// The emotion or free-form query
    pub query: String,

    /// Extra situational context (time of day, activity, ...)
    #[serde(default)]
    pub context: String,
}

impl RecommendationContext {
    pub fn new(query: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            context: context.into(),
        }
    }
}

/// A rule-based recommender that never fails.
///
/// Synchronous on purpose: it runs entirely on-device and must always
/// produce something usable.
pub trait LocalRecommender: Send + Sync {
    fn recommend(&self, context: &RecommendationContext) -> String;
}
