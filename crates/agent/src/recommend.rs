//! Keyword-based local recommender.

use nightjar_core::recommend::{LocalRecommender, RecommendationContext};

/// Preset returned when no keyword matches.
pub const DEFAULT_PRESET: &str = "[Calm Night] Rain:60, Wind:30, Fan:20";

/// Maps emotion keywords to sound-mix presets.
///
/// Matching is case-insensitive over both the query and the context; the
/// first rule with a matching keyword wins.
pub struct KeywordRecommender {
    rules: Vec<(Vec<String>, String)>,
}

impl KeywordRecommender {
    pub fn new() -> Self {
        let rules = [
            (
                &["anxious", "anxiety", "stress", "nervous", "불안", "스트레스"][..],
                "[Deep Breath] Ocean:70, Rain:40, Wind:20",
            ),
            (
                &["sad", "lonely", "down", "우울", "슬퍼"][..],
                "[Warm Blanket] Fireplace:60, Rain:50, Piano:30",
            ),
            (
                &["angry", "frustrated", "화나", "짜증"][..],
                "[Cool Down] Stream:70, Forest:50, Wind:30",
            ),
            (
                &["tired", "exhausted", "insomnia", "can't sleep", "awake", "피곤", "잠이"][..],
                "[Slow Drift] Rain:80, Wind:60, Fan:40",
            ),
            (
                &["focus", "study", "work", "집중"][..],
                "[Steady Focus] Fan:60, Cafe:40, Rain:30",
            ),
            (
                &["happy", "excited", "기뻐", "신나"][..],
                "[Easy Evening] Birds:50, Stream:40, Wind:20",
            ),
        ];

        Self {
            rules: rules
                .iter()
                .map(|(keywords, preset)| {
                    (
                        keywords.iter().map(|k| k.to_string()).collect(),
                        preset.to_string(),
                    )
                })
                .collect(),
        }
    }

    /// Add a rule that takes priority over the built-in ones.
    pub fn with_rule(mut self, keywords: &[&str], preset: impl Into<String>) -> Self {
        let keywords = keywords.iter().map(|k| k.to_lowercase()).collect();
        self.rules.insert(0, (keywords, preset.into()));
        self
    }
}

impl Default for KeywordRecommender {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalRecommender for KeywordRecommender {
    fn recommend(&self, context: &RecommendationContext) -> String {
        let haystack = format!("{} {}", context.query, context.context).to_lowercase();
        self.rules
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| haystack.contains(k.as_str())))
            .map(|(_, preset)| preset.clone())
            .unwrap_or_else(|| DEFAULT_PRESET.to_string())
    }
}
