//! Predictor trait: the abstraction over remote inference backends.
//!
//! A predictor takes a budgeted prompt plus sampling parameters and
//! produces exactly one terminal outcome: the normalized output text or a
//! classified [`PredictionError`].

use async_trait::async_trait;
use crate::error::PredictionError;
use crate::prompt::{BudgetedPrompt, ModelParams};

#[async_trait]
pub trait Predictor: Send + Sync {
    /// A human-readable name for this backend (e.g. "replicate").
    fn name(&self) -> &str;

    /// Run one prediction to completion.
    async fn predict(
        &self,
        prompt: &BudgetedPrompt,
        params: &ModelParams,
    ) -> std::result::Result<String, PredictionError>;
}
