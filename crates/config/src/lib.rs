//! Configuration loading, validation, and management for Nightjar.
//!
//! Loads configuration from `~/.nightjar/config.toml` with environment
//! variable overrides. Validates all settings at startup. Every value is
//! read-only once loaded; nothing here is mutated at runtime.

use nightjar_core::prompt::ModelParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.nightjar/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Bearer credential for the inference service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Inference endpoint settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Sampling parameters
    #[serde(default)]
    pub model: ModelConfig,

    /// Prompt token budget and conversation retention
    #[serde(default)]
    pub budget: TokenBudget,

    /// Job polling and submission retry settings
    #[serde(default)]
    pub polling: PollingConfig,

    /// Downloaded artifact cache
    #[serde(default)]
    pub artifacts: ArtifactConfig,

    /// Usage accounting
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("budget", &self.budget)
            .field("polling", &self.polling)
            .field("artifacts", &self.artifacts)
            .field("telemetry", &self.telemetry)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier in `owner/name` form
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_reachability_timeout")]
    pub reachability_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.replicate.com/v1".into()
}
fn default_model() -> String {
    "anthropic/claude-3.5-haiku".into()
}
fn default_request_timeout() -> u64 {
    30
}
fn default_reachability_timeout() -> u64 {
    3
}

impl ProviderConfig {
    /// URL that prediction jobs are POSTed to.
    pub fn predictions_url(&self) -> String {
        format!(
            "{}/models/{}/predictions",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn reachability_timeout(&self) -> Duration {
        Duration::from_secs(self.reachability_timeout_secs)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            request_timeout_secs: default_request_timeout(),
            reachability_timeout_secs: default_reachability_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

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

impl ModelConfig {
    pub fn to_params(&self) -> ModelParams {
        ModelParams {
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
            system_prompt: self.system_prompt.clone(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
            system_prompt: None,
        }
    }
}

/// Token budget for prompt assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBudget {
    /// Ceiling on the estimated tokens of an assembled prompt
    #[serde(default = "default_max_prompt_tokens")]
    pub max_prompt_tokens: usize,

    /// Only turns younger than this are included verbatim in prompts
    #[serde(default = "default_recent_raw_window_days")]
    pub recent_raw_window_days: u32,

    /// Turns older than this are purged from the conversation window
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Turns fetched for an uncompressed prompt
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Turns kept when the prompt must be compressed
    #[serde(default = "default_compressed_window")]
    pub compressed_window: usize,

    /// Capacity of the in-memory conversation window
    #[serde(default = "default_max_turns_in_memory")]
    pub max_turns_in_memory: usize,
}

fn default_max_prompt_tokens() -> usize {
    4000
}
fn default_recent_raw_window_days() -> u32 {
    3
}
fn default_retention_days() -> u32 {
    14
}
fn default_history_window() -> usize {
    10
}
fn default_compressed_window() -> usize {
    5
}
fn default_max_turns_in_memory() -> usize {
    50
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            max_prompt_tokens: default_max_prompt_tokens(),
            recent_raw_window_days: default_recent_raw_window_days(),
            retention_days: default_retention_days(),
            history_window: default_history_window(),
            compressed_window: default_compressed_window(),
            max_turns_in_memory: default_max_turns_in_memory(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Poll iterations before a job is declared timed out
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_poll_delay_ms")]
    pub poll_delay_ms: u64,

    /// Extra submission attempts after a retryable failure
    #[serde(default = "default_submit_retries")]
    pub submit_retries: u32,

    #[serde(default = "default_submit_retry_delay_ms")]
    pub submit_retry_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    25
}
fn default_poll_delay_ms() -> u64 {
    1000
}
fn default_submit_retries() -> u32 {
    3
}
fn default_submit_retry_delay_ms() -> u64 {
    1000
}

impl PollingConfig {
    pub fn poll_delay(&self) -> Duration {
        Duration::from_millis(self.poll_delay_ms)
    }

    pub fn submit_retry_delay(&self) -> Duration {
        Duration::from_millis(self.submit_retry_delay_ms)
    }

    /// Upper bound on time spent polling one job.
    pub fn timeout_ceiling(&self) -> Duration {
        self.poll_delay() * self.max_attempts
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            poll_delay_ms: default_poll_delay_ms(),
            submit_retries: default_submit_retries(),
            submit_retry_delay_ms: default_submit_retry_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Maximum number of artifacts held in memory
    #[serde(default = "default_artifact_capacity")]
    pub capacity: usize,

    /// Downloads larger than this are rejected
    #[serde(default = "default_artifact_max_bytes")]
    pub max_bytes: u64,
}

fn default_artifact_capacity() -> usize {
    3
}
fn default_artifact_max_bytes() -> u64 {
    64 * 1024 * 1024
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            capacity: default_artifact_capacity(),
            max_bytes: default_artifact_max_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Days of daily usage buckets to keep
    #[serde(default = "default_usage_retention_days")]
    pub usage_retention_days: u32,
}

fn default_true() -> bool {
    true
}
fn default_usage_retention_days() -> u32 {
    7
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            usage_retention_days: default_usage_retention_days(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.nightjar/config.toml).
    ///
    /// Also checks environment variables:
    /// - `NIGHTJAR_API_KEY` (highest priority), then `REPLICATE_API_TOKEN`
    /// - `NIGHTJAR_MODEL`
    /// - `NIGHTJAR_BASE_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("NIGHTJAR_API_KEY").or_else(|| lookup("REPLICATE_API_TOKEN"));
        }

        if let Some(model) = lookup("NIGHTJAR_MODEL") {
            self.provider.model = model;
        }

        if let Some(base_url) = lookup("NIGHTJAR_BASE_URL") {
            self.provider.base_url = base_url;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".nightjar")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigError::ValidationError(
                "model.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.model.top_p <= 0.0 || self.model.top_p > 1.0 {
            return Err(ConfigError::ValidationError(
                "model.top_p must be in (0.0, 1.0]".into(),
            ));
        }

        if self.budget.max_prompt_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "budget.max_prompt_tokens must be > 0".into(),
            ));
        }

        if self.budget.compressed_window > self.budget.history_window {
            return Err(ConfigError::ValidationError(
                "budget.compressed_window must not exceed budget.history_window".into(),
            ));
        }

        if self.budget.recent_raw_window_days > self.budget.retention_days {
            return Err(ConfigError::ValidationError(
                "budget.recent_raw_window_days must not exceed budget.retention_days".into(),
            ));
        }

        if self.polling.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "polling.max_attempts must be > 0".into(),
            ));
        }

        if self.artifacts.capacity == 0 {
            return Err(ConfigError::ValidationError(
                "artifacts.capacity must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: ProviderConfig::default(),
            model: ModelConfig::default(),
            budget: TokenBudget::default(),
            polling: PollingConfig::default(),
            artifacts: ArtifactConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
