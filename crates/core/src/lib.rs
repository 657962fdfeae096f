//! # Nightjar Core
//!
//! Domain types, traits, and error definitions for the Nightjar inference
//! orchestrator. This crate has **no I/O dependencies**: it defines the
//! domain model that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is defined as a trait here. Implementations
//! live in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod download;
pub mod error;
pub mod history;
pub mod job;
pub mod message;
pub mod network;
pub mod prediction;
pub mod prompt;
pub mod recommend;

// Re-export key types at crate root for ergonomics
pub use download::Downloader;
pub use error::{ArtifactError, Error, FailureKind, MemoryError, PredictionError, Result};
pub use history::ConversationHistory;
pub use job::{InferenceJob, JobOutput, JobStatus};
pub use message::{ConversationTurn, Role};
pub use network::{Reachability, StaticReachability};
pub use prediction::Predictor;
pub use prompt::{BudgetedPrompt, ModelParams};
pub use recommend::{LocalRecommender, RecommendationContext};
