//! Error types for the Nightjar domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; remote inference failures
//! additionally map onto the fixed [`FailureKind`] taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The top-level error type for all Nightjar operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Prediction errors ---
    #[error("Prediction error: {0}")]
    Prediction(#[from] PredictionError),

    // --- Artifact errors ---
    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// The fixed taxonomy every remote failure is classified into.
///
/// A failure is classified exactly once, where it originates (transport
/// layer or terminal-status parser), and is never re-classified downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Network,
    RateLimit,
    TokenOverflow,
    PredictionFailed,
    Timeout,
    Parsing,
    InvalidCredential,
}

impl FailureKind {
    /// Every kind, in taxonomy order.
    pub const ALL: [FailureKind; 7] = [
        FailureKind::Network,
        FailureKind::RateLimit,
        FailureKind::TokenOverflow,
        FailureKind::PredictionFailed,
        FailureKind::Timeout,
        FailureKind::Parsing,
        FailureKind::InvalidCredential,
    ];
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Network => "network",
            Self::RateLimit => "rate_limit",
            Self::TokenOverflow => "token_overflow",
            Self::PredictionFailed => "prediction_failed",
            Self::Timeout => "timeout",
            Self::Parsing => "parsing",
            Self::InvalidCredential => "invalid_credential",
        };
        f.write_str(label)
    }
}

// --- Bounded context errors ---

/// A classified failure of a remote prediction job.
#[derive(Debug, Clone, Error)]
pub enum PredictionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limited by provider: {0}")]
    RateLimited(String),

    #[error("Prompt exceeds the model's token limit: {0}")]
    TokenOverflow(String),

    #[error("Prediction {status}: {message}")]
    PredictionFailed {
        status: String,
        message: String,
        logs: Option<String>,
    },

    #[error("Prediction did not finish after {attempts} poll attempts")]
    Timeout { attempts: u32 },

    #[error("Could not parse prediction output: {0}")]
    Parsing(String),

    #[error("Invalid credential: {0}")]
    InvalidCredential(String),
}

impl PredictionError {
    /// The taxonomy bucket this error belongs to.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network(_) => FailureKind::Network,
            Self::RateLimited(_) => FailureKind::RateLimit,
            Self::TokenOverflow(_) => FailureKind::TokenOverflow,
            Self::PredictionFailed { .. } => FailureKind::PredictionFailed,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Parsing(_) => FailureKind::Parsing,
            Self::InvalidCredential(_) => FailureKind::InvalidCredential,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ArtifactError {
    #[error("Download failed for {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("Download of {url} returned HTTP {status}")]
    Http { url: String, status: u16 },

    #[error("Download of {url} returned an empty body")]
    EmptyPayload { url: String },

    #[error("Download of {url} exceeded {limit} bytes")]
    TooLarge { url: String, limit: u64 },
}

#[derive(Debug, Clone, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("History unavailable: {0}")]
    Unavailable(String),
}
