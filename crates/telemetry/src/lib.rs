//! Token usage accounting for Nightjar.
//!
//! Tracks estimated prompt and response tokens per calendar day so users
//! can see how much of the remote service they are consuming, and logs a
//! warning when a day's total crosses a usage threshold.

pub mod model;
pub mod usage;

pub use model::{DailyUsage, UsageReport};
pub use usage::{USAGE_THRESHOLDS, UsageTracker, crossed_thresholds};
