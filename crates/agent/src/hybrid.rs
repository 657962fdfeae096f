//! Hybrid remote/local orchestrator.
//!
//! Tries the remote predictor first and degrades to the local recommender
//! whenever the remote path is unusable. Remote failures are logged and
//! reported through [`ReplySource`], never returned as errors.

use nightjar_core::error::FailureKind;
use nightjar_core::network::Reachability;
use nightjar_core::prediction::Predictor;
use nightjar_core::prompt::ModelParams;
use nightjar_core::recommend::{LocalRecommender, RecommendationContext};
use nightjar_providers::{RecoveryAction, RetryPolicy};
use nightjar_telemetry::UsageTracker;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::context::{ContextBudgetBuilder, estimate_tokens};
use crate::recommend::DEFAULT_PRESET;

/// Why a reply came from the local recommender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// The reachability probe failed
    Unreachable,
    /// Remote access was disabled earlier in the session
    RemoteDisabled,
    /// The remote prediction failed
    Failure(FailureKind),
    /// The remote prediction succeeded with blank text
    EmptyOutput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Remote,
    Local { reason: FallbackReason },
}

/// A user-facing answer and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

impl Reply {
    pub fn is_remote(&self) -> bool {
        self.source == ReplySource::Remote
    }
}

pub struct HybridOrchestrator {
    predictor: Arc<dyn Predictor>,
    builder: ContextBudgetBuilder,
    reachability: Arc<dyn Reachability>,
    recommender: Arc<dyn LocalRecommender>,
    params: ModelParams,
    ceiling: usize,
    policy: RetryPolicy,
    usage: Option<Arc<UsageTracker>>,
    remote_disabled: AtomicBool,
}

impl HybridOrchestrator {
    pub fn new(
        predictor: Arc<dyn Predictor>,
        builder: ContextBudgetBuilder,
        reachability: Arc<dyn Reachability>,
        recommender: Arc<dyn LocalRecommender>,
    ) -> Self {
        let ceiling = builder.budget().max_prompt_tokens;
        Self {
            predictor,
            builder,
            reachability,
            recommender,
            params: ModelParams::default(),
            ceiling,
            policy: RetryPolicy::default(),
            usage: None,
            remote_disabled: AtomicBool::new(false),
        }
    }

    pub fn with_params(mut self, params: ModelParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_ceiling(mut self, ceiling: usize) -> Self {
        self.ceiling = ceiling;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_usage(mut self, usage: Arc<UsageTracker>) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Whether remote access was disabled for this session.
    pub fn remote_disabled(&self) -> bool {
        self.remote_disabled.load(Ordering::Relaxed)
    }

    /// Answer `query`. Never fails.
    pub async fn respond(&self, query: &str, context: &str) -> String {
        self.respond_detailed(query, context).await.text
    }

    /// Answer `query`, reporting whether the answer came from the remote
    /// service or the local recommender.
    pub async fn respond_detailed(&self, query: &str, context: &str) -> Reply {
        let request_id = Uuid::new_v4();
        let span = info_span!("respond", %request_id);
        self.respond_inner(query, context).instrument(span).await
    }

    async fn respond_inner(&self, query: &str, context: &str) -> Reply {
        let request = RecommendationContext::new(query, context);

        if self.remote_disabled() {
            return self.local(&request, FallbackReason::RemoteDisabled);
        }

        if !self.reachability.is_reachable().await {
            info!("Remote service unreachable, using local recommender");
            return self.local(&request, FallbackReason::Unreachable);
        }

        let input = compose_input(query, context);
        let mut context_reset = false;

        loop {
            let prompt = self.builder.build(&input, self.ceiling).await;
            debug!(
                predictor = self.predictor.name(),
                estimated_tokens = prompt.estimated_tokens,
                was_compressed = prompt.was_compressed,
                "Sending prompt"
            );

            let error = match self.predictor.predict(&prompt, &self.params).await {
                Ok(text) if text.trim().is_empty() => {
                    warn!("Remote prediction returned no text");
                    return self.local(&request, FallbackReason::EmptyOutput);
                }
                Ok(text) => {
                    if let Some(usage) = &self.usage {
                        usage.record(prompt.estimated_tokens, estimate_tokens(&text));
                    }
                    info!(chars = text.len(), "Remote reply");
                    return Reply {
                        text,
                        source: ReplySource::Remote,
                    };
                }
                Err(e) => e,
            };

            let kind = error.kind();
            match self.policy.decide(kind) {
                RecoveryAction::ResetContext if !context_reset => {
                    warn!(error = %error, "Prompt too large, resetting conversation window");
                    if let Err(e) = self.builder.reset_window().await {
                        warn!(error = %e, "Failed to reset conversation window");
                    }
                    context_reset = true;
                    continue;
                }
                RecoveryAction::DisableRemote => {
                    warn!(error = %error, "Credential rejected, disabling remote for this session");
                    self.remote_disabled.store(true, Ordering::Relaxed);
                }
                _ => {}
            }

            warn!(%kind, error = %error, "Remote prediction failed, using local recommender");
            return self.local(&request, FallbackReason::Failure(kind));
        }
    }

    fn local(&self, request: &RecommendationContext, reason: FallbackReason) -> Reply {
        let text = self.recommender.recommend(request);
        let text = if text.trim().is_empty() {
            DEFAULT_PRESET.to_string()
        } else {
            text
        };
        debug!(?reason, "Local reply");
        Reply {
            text,
            source: ReplySource::Local { reason },
        }
    }
}

/// The text handed to the budget builder for a query and its context.
fn compose_input(query: &str, context: &str) -> String {
    let context = context.trim();
    if context.is_empty() {
        query.to_string()
    } else {
        format!("{query}\n\nContext: {context}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nightjar_config::TokenBudget;
    use nightjar_core::error::PredictionError;
    use nightjar_core::history::ConversationHistory;
    use nightjar_core::message::ConversationTurn;
    use nightjar_core::network::StaticReachability;
    use nightjar_core::prompt::BudgetedPrompt;
    use nightjar_memory::InMemoryConversationStore;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted outcomes and records every prompt it receives.
    struct ScriptedPredictor {
        outcomes: Mutex<VecDeque<Result<String, PredictionError>>>,
        prompts: Mutex<Vec<BudgetedPrompt>>,
    }

    impl ScriptedPredictor {
        fn new(outcomes: Vec<Result<String, PredictionError>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Predictor for ScriptedPredictor {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn predict(
            &self,
            prompt: &BudgetedPrompt,
            _params: &ModelParams,
        ) -> Result<String, PredictionError> {
            self.prompts.lock().unwrap().push(prompt.clone());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(PredictionError::Network("script exhausted".into())))
        }
    }

    struct FixedRecommender(&'static str);

    impl LocalRecommender for FixedRecommender {
        fn recommend(&self, _context: &RecommendationContext) -> String {
            self.0.to_string()
        }
    }

    struct Setup {
        orchestrator: HybridOrchestrator,
        predictor: Arc<ScriptedPredictor>,
        store: Arc<InMemoryConversationStore>,
    }

    fn setup(outcomes: Vec<Result<String, PredictionError>>, reachable: bool) -> Setup {
        let predictor = ScriptedPredictor::new(outcomes);
        let store = Arc::new(InMemoryConversationStore::new(50, 14));
        let builder = ContextBudgetBuilder::new(store.clone(), TokenBudget::default());
        let orchestrator = HybridOrchestrator::new(
            predictor.clone(),
            builder,
            Arc::new(StaticReachability(reachable)),
            Arc::new(FixedRecommender("[Local] Rain:50")),
        );
        Setup {
            orchestrator,
            predictor,
            store,
        }
    }

    #[tokio::test]
    async fn remote_success_is_returned() {
        let s = setup(vec![Ok("[Remote] Ocean:70".into())], true);
        let reply = s.orchestrator.respond_detailed("anxious", "").await;

        assert_eq!(reply.text, "[Remote] Ocean:70");
        assert!(reply.is_remote());
    }

    #[tokio::test]
    async fn unreachable_uses_local_without_calling_remote() {
        let s = setup(vec![Ok("never".into())], false);
        let reply = s.orchestrator.respond_detailed("anxious", "").await;

        assert_eq!(reply.text, "[Local] Rain:50");
        assert_eq!(
            reply.source,
            ReplySource::Local {
                reason: FallbackReason::Unreachable
            }
        );
        assert_eq!(s.predictor.calls(), 0);
    }

    #[tokio::test]
    async fn every_failure_kind_degrades_to_local() {
        let errors = vec![
            PredictionError::Network("down".into()),
            PredictionError::RateLimited("slow".into()),
            PredictionError::PredictionFailed {
                status: "failed".into(),
                message: "oom".into(),
                logs: None,
            },
            PredictionError::Timeout { attempts: 25 },
            PredictionError::Parsing("weird".into()),
        ];
        for error in errors {
            let kind = error.kind();
            let s = setup(vec![Err(error)], true);
            let reply = s.orchestrator.respond_detailed("sad", "").await;
            assert_eq!(reply.text, "[Local] Rain:50");
            assert_eq!(
                reply.source,
                ReplySource::Local {
                    reason: FallbackReason::Failure(kind)
                }
            );
            assert_eq!(s.predictor.calls(), 1, "{kind} must not be retried here");
        }
    }

    #[tokio::test]
    async fn token_overflow_resets_window_and_retries_once() {
        let s = setup(
            vec![
                Err(PredictionError::TokenOverflow("too long".into())),
                Ok("[Remote] Forest:40".into()),
            ],
            true,
        );
        s.store.push(ConversationTurn::user("earlier message")).await;

        let reply = s.orchestrator.respond_detailed("tired", "").await;

        assert!(reply.is_remote());
        assert_eq!(s.predictor.calls(), 2);
        assert!(s.store.is_empty().await);
        let prompts = s.predictor.prompts.lock().unwrap();
        assert!(prompts[0].final_text.contains("earlier message"));
        assert_eq!(prompts[1].final_text, "tired");
    }

    #[tokio::test]
    async fn repeated_token_overflow_falls_back() {
        let s = setup(
            vec![
                Err(PredictionError::TokenOverflow("too long".into())),
                Err(PredictionError::TokenOverflow("still too long".into())),
            ],
            true,
        );
        let reply = s.orchestrator.respond_detailed("tired", "").await;

        assert_eq!(
            reply.source,
            ReplySource::Local {
                reason: FallbackReason::Failure(FailureKind::TokenOverflow)
            }
        );
        assert_eq!(s.predictor.calls(), 2);
    }

    #[tokio::test]
    async fn invalid_credential_disables_remote_for_session() {
        let s = setup(
            vec![
                Err(PredictionError::InvalidCredential("bad key".into())),
                Ok("never".into()),
            ],
            true,
        );

        let first = s.orchestrator.respond_detailed("hi", "").await;
        assert_eq!(
            first.source,
            ReplySource::Local {
                reason: FallbackReason::Failure(FailureKind::InvalidCredential)
            }
        );
        assert!(s.orchestrator.remote_disabled());

        let second = s.orchestrator.respond_detailed("hi", "").await;
        assert_eq!(
            second.source,
            ReplySource::Local {
                reason: FallbackReason::RemoteDisabled
            }
        );
        assert_eq!(s.predictor.calls(), 1);
    }

    #[tokio::test]
    async fn blank_remote_output_uses_local() {
        let s = setup(vec![Ok("   ".into())], true);
        let reply = s.orchestrator.respond_detailed("hi", "").await;
        assert_eq!(
            reply.source,
            ReplySource::Local {
                reason: FallbackReason::EmptyOutput
            }
        );
    }

    #[tokio::test]
    async fn blank_local_output_gets_constant_reply() {
        let predictor = ScriptedPredictor::new(vec![]);
        let store: Arc<dyn ConversationHistory> = Arc::new(InMemoryConversationStore::new(50, 14));
        let orchestrator = HybridOrchestrator::new(
            predictor,
            ContextBudgetBuilder::new(store, TokenBudget::default()),
            Arc::new(StaticReachability(false)),
            Arc::new(FixedRecommender("")),
        );

        let text = orchestrator.respond("hi", "").await;
        assert_eq!(text, DEFAULT_PRESET);
    }

    #[tokio::test]
    async fn context_is_appended_to_input() {
        let s = setup(vec![Ok("ok".into())], true);
        s.orchestrator.respond("can't sleep", "late night, after work").await;

        let prompts = s.predictor.prompts.lock().unwrap();
        assert_eq!(
            prompts[0].final_text,
            "can't sleep\n\nContext: late night, after work"
        );
    }

    #[tokio::test]
    async fn successful_replies_are_metered() {
        let usage = Arc::new(UsageTracker::new(7));
        let s = setup(vec![Ok("Rain:80, Wind:40".into())], true);
        let orchestrator = s.orchestrator.with_usage(usage.clone());

        orchestrator.respond("hello there", "").await;

        let today = usage.today();
        assert_eq!(today.requests, 1);
        assert_eq!(today.input_tokens, 2);
        assert_eq!(today.output_tokens, estimate_tokens("Rain:80, Wind:40") as u64);
    }

    #[test]
    fn compose_input_skips_blank_context() {
        assert_eq!(compose_input("hi", "  "), "hi");
        assert_eq!(compose_input("hi", "bed"), "hi\n\nContext: bed");
    }
}
