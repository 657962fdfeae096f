//! Usage data types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Token counts accumulated over one calendar day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyUsage {
    /// Estimated tokens sent in prompts
    pub input_tokens: u64,
    /// Estimated tokens received in responses
    pub output_tokens: u64,
    /// Successful remote responses
    pub requests: u64,
}

impl DailyUsage {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    pub(crate) fn add(&mut self, other: &DailyUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.requests += other.requests;
    }
}

/// A point-in-time view of retained usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageReport {
    pub today: DailyUsage,
    /// Sum over every retained day
    pub total: DailyUsage,
    /// Retained days, oldest first
    pub days: Vec<(NaiveDate, DailyUsage)>,
}
