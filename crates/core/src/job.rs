//! Remote inference job model.
//!
//! An [`InferenceJob`] is created on submission and only ever updated by
//! replacing it with a fresh poll read; it is terminal once its status is
//! `succeeded`, `failed` or `canceled`.

use serde::{Deserialize, Serialize};

/// Lifecycle status reported by the inference service.
///
/// Unrecognised strings are kept as [`JobStatus::Unknown`] rather than
/// rejected so newer provider statuses do not break polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    Unknown(String),
}

impl JobStatus {
    /// Parse a provider status string (case-insensitive).
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "starting" => Self::Starting,
            "processing" => Self::Processing,
            "succeeded" => Self::Succeeded,
            "failed" => Self::Failed,
            "canceled" | "cancelled" => Self::Canceled,
            _ => Self::Unknown(raw.to_string()),
        }
    }

    /// Whether no further status change can happen.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Starting => "starting",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<String> for JobStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The polymorphic `output` field of a job.
///
/// Providers that assemble a streamed answer server-side send an ordered
/// list of fragments; others send a single string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobOutput {
    Text(String),
    Fragments(Vec<String>),
    Unsupported(serde_json::Value),
}

impl JobOutput {
    /// Normalize to a single string. `None` for unsupported shapes.
    pub fn normalize(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Fragments(parts) => Some(parts.concat()),
            Self::Unsupported(_) => None,
        }
    }
}

/// A snapshot of a remote job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceJob {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub output: Option<JobOutput>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub logs: Option<String>,
}
