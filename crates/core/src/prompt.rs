//! Prompt and model-parameter value objects passed from the context
//! builder to the prediction client.

use serde::{Deserialize, Serialize};

/// A prompt assembled under a token budget.
///
/// Created per request by the context builder and consumed once by a
/// [`Predictor`](crate::Predictor). Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetedPrompt {
    /// The text sent to the model
    pub final_text: String,

    /// Estimated token count of `final_text`
    pub estimated_tokens: usize,

    /// Whether history had to be shrunk to fit the ceiling
    pub was_compressed: bool,
}

impl BudgetedPrompt {
    /// A prompt carrying raw text with no history attached.
    pub fn raw(text: impl Into<String>, estimated_tokens: usize) -> Self {
        Self {
            final_text: text.into(),
            estimated_tokens,
            was_compressed: false,
        }
    }
}

/// Sampling parameters forwarded to the inference service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Nucleus sampling mass
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Optional system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

fn default_max_tokens() -> u32 {
    400
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
            system_prompt: None,
        }
    }
}
