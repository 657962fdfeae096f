//! Thread-safe daily usage tracker.

use crate::model::{DailyUsage, UsageReport};
use chrono::{Duration, Local, NaiveDate};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

/// Daily token totals that trigger a warning when first crossed.
pub const USAGE_THRESHOLDS: [u64; 4] = [1_000, 2_000, 5_000, 10_000];

/// Accumulates token usage into per-day buckets.
///
/// Thread-safe via `RwLock`. Buckets older than the retention period are
/// dropped whenever usage is recorded.
pub struct UsageTracker {
    days: RwLock<BTreeMap<NaiveDate, DailyUsage>>,
    retention_days: u32,
}

impl UsageTracker {
    pub fn new(retention_days: u32) -> Self {
        Self {
            days: RwLock::new(BTreeMap::new()),
            retention_days,
        }
    }

    // ── Recording ─────────────────────────────────────────────────────

    /// Record one successful response against today's bucket.
    pub fn record(&self, input_tokens: usize, output_tokens: usize) {
        self.record_at(Local::now().date_naive(), input_tokens, output_tokens);
    }

    /// Record one successful response against `date`'s bucket.
    pub fn record_at(&self, date: NaiveDate, input_tokens: usize, output_tokens: usize) {
        let delta = DailyUsage {
            input_tokens: input_tokens as u64,
            output_tokens: output_tokens as u64,
            requests: 1,
        };

        let (before, after) = {
            let mut days = self.days.write().unwrap_or_else(PoisonError::into_inner);
            let bucket = days.entry(date).or_default();
            let before = bucket.total_tokens();
            bucket.add(&delta);
            (before, bucket.total_tokens())
        };

        tracing::debug!(
            %date,
            input_tokens,
            output_tokens,
            daily_total = after,
            "Recorded token usage"
        );

        for threshold in crossed_thresholds(before, after) {
            tracing::warn!(
                %date,
                threshold,
                daily_total = after,
                "Daily token usage crossed threshold"
            );
        }

        self.prune(date);
    }

    /// Drop buckets older than the retention period relative to `today`.
    /// Returns how many were removed.
    pub fn prune(&self, today: NaiveDate) -> usize {
        let cutoff = today - Duration::days(i64::from(self.retention_days));
        let mut days = self.days.write().unwrap_or_else(PoisonError::into_inner);
        let before = days.len();
        days.retain(|date, _| *date > cutoff);
        before - days.len()
    }

    // ── Queries ───────────────────────────────────────────────────────

    pub fn today(&self) -> DailyUsage {
        self.day(Local::now().date_naive())
    }

    pub fn day(&self, date: NaiveDate) -> DailyUsage {
        self.days
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&date)
            .copied()
            .unwrap_or_default()
    }

    /// Sum over every retained day.
    pub fn total(&self) -> DailyUsage {
        let days = self.days.read().unwrap_or_else(PoisonError::into_inner);
        days.values().fold(DailyUsage::default(), |mut acc, usage| {
            acc.add(usage);
            acc
        })
    }

    pub fn report(&self) -> UsageReport {
        let days = self
            .days
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(date, usage)| (*date, *usage))
            .collect();
        UsageReport {
            today: self.today(),
            total: self.total(),
            days,
        }
    }
}

/// Thresholds in [`USAGE_THRESHOLDS`] passed when a daily total moves from
/// `before` to `after`, lowest first.
pub fn crossed_thresholds(before: u64, after: u64) -> Vec<u64> {
    USAGE_THRESHOLDS
        .into_iter()
        .filter(|&threshold| before < threshold && after >= threshold)
        .collect()
}

impl Default for UsageTracker {
    fn default() -> Self {
        Self::new(7)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    #[test]
    fn record_accumulates_per_day() {
        let tracker = UsageTracker::new(7);
        tracker.record_at(date(10), 100, 40);
        tracker.record_at(date(10), 50, 10);
        tracker.record_at(date(11), 5, 5);

        let day = tracker.day(date(10));
        assert_eq!(day.input_tokens, 150);
        assert_eq!(day.output_tokens, 50);
        assert_eq!(day.requests, 2);
        assert_eq!(tracker.day(date(11)).total_tokens(), 10);
    }

    #[test]
    fn missing_day_is_zero() {
        let tracker = UsageTracker::default();
        assert_eq!(tracker.day(date(1)), DailyUsage::default());
    }

    #[test]
    fn old_buckets_are_pruned_on_record() {
        let tracker = UsageTracker::new(7);
        tracker.record_at(date(1), 10, 10);
        tracker.record_at(date(7), 10, 10);
        tracker.record_at(date(10), 10, 10);

        // 10 - 7 = 3, so only days after the 3rd survive
        assert_eq!(tracker.day(date(1)), DailyUsage::default());
        assert_eq!(tracker.day(date(7)).requests, 1);
        assert_eq!(tracker.report().days.len(), 2);
    }

    #[test]
    fn total_sums_retained_days() {
        let tracker = UsageTracker::new(7);
        tracker.record_at(date(8), 1_000, 200);
        tracker.record_at(date(9), 500, 100);

        let total = tracker.total();
        assert_eq!(total.total_tokens(), 1_800);
        assert_eq!(total.requests, 2);
    }

    #[test]
    fn prune_reports_removed_count() {
        let tracker = UsageTracker::new(2);
        tracker.record_at(date(1), 1, 1);
        tracker.record_at(date(2), 1, 1);
        assert_eq!(tracker.prune(date(20)), 2);
        assert_eq!(tracker.total(), DailyUsage::default());
    }

    #[test]
    fn threshold_crossed_once() {
        assert_eq!(crossed_thresholds(900, 1_000), vec![1_000]);
        assert_eq!(crossed_thresholds(900, 1_500), vec![1_000]);
    }

    #[test]
    fn threshold_already_passed_is_silent() {
        assert!(crossed_thresholds(1_000, 1_900).is_empty());
        assert!(crossed_thresholds(0, 999).is_empty());
        assert!(crossed_thresholds(20_000, 30_000).is_empty());
    }

    #[test]
    fn one_record_can_cross_several_thresholds() {
        assert_eq!(crossed_thresholds(1_500, 5_200), vec![2_000, 5_000]);
        assert_eq!(crossed_thresholds(0, 10_000), vec![1_000, 2_000, 5_000, 10_000]);
    }

    #[test]
    fn report_lists_days_oldest_first() {
        let tracker = UsageTracker::new(30);
        tracker.record_at(date(12), 1, 1);
        tracker.record_at(date(5), 1, 1);

        let report = tracker.report();
        assert_eq!(report.days[0].0, date(5));
        assert_eq!(report.days[1].0, date(12));
    }
}
