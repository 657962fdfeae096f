//! Remote-side collaborators for Nightjar.
//!
//! [`PredictionJobClient`] implements `nightjar_core::Predictor` against a
//! Replicate-style submit-then-poll HTTP API. Every failure it produces is
//! classified once by [`FailureClassifier`]; [`RetryPolicy`] decides what
//! happens next.

pub mod download;
pub mod reachability;
pub mod replicate;
pub mod retry;
pub mod wire;

pub use download::HttpDownloader;
pub use reachability::HttpReachability;
pub use replicate::PredictionJobClient;
pub use retry::{FailureClassifier, RawFailure, RecoveryAction, RetryPolicy};
