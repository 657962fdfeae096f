//! Failure classification and recovery policy.
//!
//! Raw failures come from two origins: the transport layer (connection
//! errors, HTTP status codes, undecodable bodies) and the terminal-status
//! parser (a job that ended `failed`/`canceled`, or never ended). Each is
//! turned into a [`PredictionError`] exactly once, here.

use nightjar_config::PollingConfig;
use nightjar_core::error::{FailureKind, PredictionError};
use std::time::Duration;

/// An unclassified failure as observed at its origin.
#[derive(Debug, Clone, PartialEq)]
pub enum RawFailure {
    /// The request never produced an HTTP response
    Transport(String),

    /// The service answered with a non-success status
    Http { status: u16, detail: String },

    /// The job reached `failed` or `canceled`
    Terminal {
        status: String,
        error: Option<String>,
        logs: Option<String>,
    },

    /// A response body or job output could not be interpreted
    Decode(String),

    /// Polling ran out of attempts (or was cancelled) before a terminal status
    Exhausted { attempts: u32 },
}

/// Maps raw failures onto the [`FailureKind`] taxonomy.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailureClassifier;

impl FailureClassifier {
    pub fn classify(&self, raw: &RawFailure) -> FailureKind {
        match raw {
            RawFailure::Transport(_) => FailureKind::Network,
            RawFailure::Http { status, detail } => match *status {
                401 | 403 => FailureKind::InvalidCredential,
                429 => FailureKind::RateLimit,
                400 | 413 | 422 if mentions_token_overflow(detail) => FailureKind::TokenOverflow,
                _ => FailureKind::Network,
            },
            RawFailure::Terminal { .. } => FailureKind::PredictionFailed,
            RawFailure::Decode(_) => FailureKind::Parsing,
            RawFailure::Exhausted { .. } => FailureKind::Timeout,
        }
    }

    /// Classify `raw` and build the matching error.
    pub fn into_error(&self, raw: RawFailure) -> PredictionError {
        let kind = self.classify(&raw);
        match raw {
            RawFailure::Transport(message) => PredictionError::Network(message),
            RawFailure::Http { status, detail } => {
                let message = if detail.is_empty() {
                    format!("HTTP {status}")
                } else {
                    format!("HTTP {status}: {detail}")
                };
                match kind {
                    FailureKind::InvalidCredential => PredictionError::InvalidCredential(message),
                    FailureKind::RateLimit => PredictionError::RateLimited(message),
                    FailureKind::TokenOverflow => PredictionError::TokenOverflow(message),
                    _ => PredictionError::Network(message),
                }
            }
            RawFailure::Terminal { status, error, logs } => PredictionError::PredictionFailed {
                status,
                message: error.unwrap_or_else(|| "no error message returned".into()),
                logs,
            },
            RawFailure::Decode(message) => PredictionError::Parsing(message),
            RawFailure::Exhausted { attempts } => PredictionError::Timeout { attempts },
        }
    }
}

/// Whether an error detail reports the prompt exceeding the model's
/// token or context-length limit.
pub fn mentions_token_overflow(detail: &str) -> bool {
    let detail = detail.to_lowercase();
    if detail.contains("context length")
        || detail.contains("context_length")
        || detail.contains("context window")
    {
        return true;
    }
    detail.contains("token")
        && ["limit", "exceed", "too many", "maximum", "too long"]
            .iter()
            .any(|marker| detail.contains(marker))
}

/// What the caller should do after a classified failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Retry the same request after `delay`, at most `max_retries` times
    Retry { max_retries: u32, delay: Duration },
    /// Clear the cached conversation window and rebuild the prompt once
    ResetContext,
    /// Stop using the remote service for the rest of the session
    DisableRemote,
    /// Report the failure; no automatic recovery
    Surface,
}

/// The recovery table for each [`FailureKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn from_config(polling: &PollingConfig) -> Self {
        Self::new(polling.submit_retries, polling.submit_retry_delay())
    }

    pub fn decide(&self, kind: FailureKind) -> RecoveryAction {
        match kind {
            FailureKind::Network => RecoveryAction::Retry {
                max_retries: self.max_retries,
                delay: self.delay,
            },
            FailureKind::TokenOverflow => RecoveryAction::ResetContext,
            FailureKind::InvalidCredential => RecoveryAction::DisableRemote,
            FailureKind::RateLimit
            | FailureKind::PredictionFailed
            | FailureKind::Timeout
            | FailureKind::Parsing => RecoveryAction::Surface,
        }
    }

    /// Whether a request that has already been retried `retries_done`
    /// times should be tried again after failing with `kind`.
    pub fn should_retry(&self, kind: FailureKind, retries_done: u32) -> bool {
        match self.decide(kind) {
            RecoveryAction::Retry { max_retries, .. } => retries_done < max_retries,
            _ => false,
        }
    }

    /// A short message suitable for showing to an end user.
    pub fn caller_message(kind: FailureKind) -> &'static str {
        match kind {
            FailureKind::Network => "The network connection failed. Please try again.",
            FailureKind::RateLimit => "Too many requests. Please wait a moment and try again.",
            FailureKind::TokenOverflow => {
                "The conversation got too long. It has been reset, please try again."
            }
            FailureKind::PredictionFailed => "The model could not answer this request.",
            FailureKind::Timeout => "The model took too long to answer.",
            FailureKind::Parsing => "The response could not be processed.",
            FailureKind::InvalidCredential => {
                "The API key is missing or invalid. Check your configuration."
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&PollingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16, detail: &str) -> RawFailure {
        RawFailure::Http {
            status,
            detail: detail.into(),
        }
    }

    #[test]
    fn http_status_mapping() {
        let c = FailureClassifier;
        assert_eq!(c.classify(&http(401, "")), FailureKind::InvalidCredential);
        assert_eq!(c.classify(&http(403, "")), FailureKind::InvalidCredential);
        assert_eq!(c.classify(&http(429, "slow down")), FailureKind::RateLimit);
        assert_eq!(c.classify(&http(500, "boom")), FailureKind::Network);
        assert_eq!(c.classify(&http(502, "")), FailureKind::Network);
    }

    #[test]
    fn token_overflow_needs_matching_detail() {
        let c = FailureClassifier;
        assert_eq!(
            c.classify(&http(422, "Prompt exceeds the maximum context length")),
            FailureKind::TokenOverflow
        );
        assert_eq!(
            c.classify(&http(400, "too many tokens in input")),
            FailureKind::TokenOverflow
        );
        assert_eq!(c.classify(&http(422, "invalid temperature")), FailureKind::Network);
        // Only client-error statuses carry overflow semantics
        assert_eq!(
            c.classify(&http(500, "token limit exceeded")),
            FailureKind::Network
        );
    }

    #[test]
    fn origin_kinds() {
        let c = FailureClassifier;
        assert_eq!(
            c.classify(&RawFailure::Transport("refused".into())),
            FailureKind::Network
        );
        assert_eq!(
            c.classify(&RawFailure::Decode("bad json".into())),
            FailureKind::Parsing
        );
        assert_eq!(
            c.classify(&RawFailure::Exhausted { attempts: 25 }),
            FailureKind::Timeout
        );
        assert_eq!(
            c.classify(&RawFailure::Terminal {
                status: "failed".into(),
                error: None,
                logs: None
            }),
            FailureKind::PredictionFailed
        );
    }

    #[test]
    fn error_kind_matches_classification() {
        let c = FailureClassifier;
        let samples = vec![
            RawFailure::Transport("refused".into()),
            http(401, "bad token"),
            http(429, ""),
            http(413, "token limit"),
            RawFailure::Decode("x".into()),
            RawFailure::Exhausted { attempts: 3 },
            RawFailure::Terminal {
                status: "canceled".into(),
                error: Some("stopped".into()),
                logs: Some("log line".into()),
            },
        ];
        for raw in samples {
            let kind = c.classify(&raw);
            assert_eq!(c.into_error(raw).kind(), kind);
        }
    }

    #[test]
    fn terminal_failure_keeps_message_and_logs() {
        let err = FailureClassifier.into_error(RawFailure::Terminal {
            status: "failed".into(),
            error: Some("CUDA out of memory".into()),
            logs: Some("step 1\nstep 2".into()),
        });
        match err {
            PredictionError::PredictionFailed {
                status,
                message,
                logs,
            } => {
                assert_eq!(status, "failed");
                assert_eq!(message, "CUDA out of memory");
                assert_eq!(logs.as_deref(), Some("step 1\nstep 2"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn policy_table() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        assert_eq!(
            policy.decide(FailureKind::Network),
            RecoveryAction::Retry {
                max_retries: 3,
                delay: Duration::from_secs(1)
            }
        );
        assert_eq!(
            policy.decide(FailureKind::TokenOverflow),
            RecoveryAction::ResetContext
        );
        assert_eq!(
            policy.decide(FailureKind::InvalidCredential),
            RecoveryAction::DisableRemote
        );
        for kind in [
            FailureKind::RateLimit,
            FailureKind::PredictionFailed,
            FailureKind::Timeout,
            FailureKind::Parsing,
        ] {
            assert_eq!(policy.decide(kind), RecoveryAction::Surface);
        }
    }

    #[test]
    fn only_network_is_retried_and_only_while_budget_remains() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        assert!(policy.should_retry(FailureKind::Network, 0));
        assert!(policy.should_retry(FailureKind::Network, 2));
        assert!(!policy.should_retry(FailureKind::Network, 3));
        for kind in FailureKind::ALL {
            if kind != FailureKind::Network {
                assert!(!policy.should_retry(kind, 0), "{kind} must not retry");
            }
        }
    }

    #[test]
    fn every_kind_has_a_caller_message() {
        for kind in FailureKind::ALL {
            assert!(!RetryPolicy::caller_message(kind).is_empty());
        }
    }
}
