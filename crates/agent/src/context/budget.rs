//! Context budget builder.
//!
//! Combines the new user input with recent conversation turns, switching
//! to a smaller window of turns when the estimated total exceeds the
//! ceiling. Compression is a single step: if the compressed prompt is
//! still over budget it is sent anyway, since the input itself is never
//! cut.

use chrono::{DateTime, Duration, Utc};
use nightjar_config::TokenBudget;
use nightjar_core::error::MemoryError;
use nightjar_core::history::ConversationHistory;
use nightjar_core::message::ConversationTurn;
use nightjar_core::prompt::BudgetedPrompt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::context::token::estimate_tokens;

pub struct ContextBudgetBuilder {
    history: Arc<dyn ConversationHistory>,
    budget: TokenBudget,
}

impl ContextBudgetBuilder {
    pub fn new(history: Arc<dyn ConversationHistory>, budget: TokenBudget) -> Self {
        Self { history, budget }
    }

    pub fn budget(&self) -> &TokenBudget {
        &self.budget
    }

    /// Build a prompt for `input` as of now.
    pub async fn build(&self, input: &str, ceiling: usize) -> BudgetedPrompt {
        self.build_at(input, ceiling, Utc::now()).await
    }

    /// Build a prompt for `input`, treating `now` as the current instant.
    ///
    /// Identical history snapshots and arguments always yield identical
    /// prompts.
    pub async fn build_at(
        &self,
        input: &str,
        ceiling: usize,
        now: DateTime<Utc>,
    ) -> BudgetedPrompt {
        let turns = self.recent_raw_turns(now).await;
        if turns.is_empty() {
            return BudgetedPrompt {
                final_text: input.to_string(),
                estimated_tokens: estimate_tokens(input),
                was_compressed: false,
            };
        }

        let history_tokens = estimate_tokens(&render_turns(&turns));
        let input_tokens = estimate_tokens(input);

        if history_tokens + input_tokens <= ceiling {
            let final_text = format!(
                "Previous conversation:\n{}\n\nCurrent user input:\n{input}",
                render_turns(&turns)
            );
            return BudgetedPrompt {
                estimated_tokens: estimate_tokens(&final_text),
                final_text,
                was_compressed: false,
            };
        }

        let keep = self.budget.compressed_window.min(turns.len());
        let recent = &turns[turns.len() - keep..];
        let final_text = if recent.is_empty() {
            input.to_string()
        } else {
            format!(
                "Recent conversation:\n{}\n\nCurrent user input:\n{input}",
                render_turns(recent)
            )
        };
        let estimated_tokens = estimate_tokens(&final_text);

        debug!(
            history_tokens,
            input_tokens,
            ceiling,
            kept_turns = keep,
            estimated_tokens,
            "Conversation history compressed"
        );
        if estimated_tokens > ceiling {
            warn!(
                estimated_tokens,
                ceiling, "Prompt still exceeds token budget after compression"
            );
        }

        BudgetedPrompt {
            final_text,
            estimated_tokens,
            was_compressed: true,
        }
    }

    /// Clear the history collaborator's cached window.
    pub async fn reset_window(&self) -> Result<(), MemoryError> {
        self.history.reset_window().await
    }

    /// Newest turns that fall inside the raw window, oldest first.
    async fn recent_raw_turns(&self, now: DateTime<Utc>) -> Vec<ConversationTurn> {
        let turns = match self.history.recent_turns(self.budget.history_window).await {
            Ok(turns) => turns,
            Err(e) => {
                warn!(error = %e, "Conversation history unavailable, building without it");
                return Vec::new();
            }
        };

        let cutoff = now - Duration::days(i64::from(self.budget.recent_raw_window_days));
        turns
            .into_iter()
            .filter(|turn| turn.created_at >= cutoff)
            .collect()
    }
}

/// Render turns as `"<role-label>: <content>"` lines.
fn render_turns(turns: &[ConversationTurn]) -> String {
    turns
        .iter()
        .map(ConversationTurn::render)
        .collect::<Vec<_>>()
        .join("\n")
}
