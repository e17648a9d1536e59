//! Progress tracking for long-running record streams.
//!
//! [`ProgressTracker`] is an injected observer: the pipeline driver receives
//! one at construction and the sink notifies it with monotonically increasing
//! written-record counts. It is purely observational and applies no
//! backpressure.

use crate::logging::format_count;
use log::info;
use std::sync::atomic::{AtomicU64, Ordering};

/// Default number of records between progress log lines.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1000;

/// Thread-safe counter that logs a progress line each time the cumulative
/// count crosses an interval boundary.
pub struct ProgressTracker {
    message: String,
    interval: u64,
    count: AtomicU64,
}

impl ProgressTracker {
    /// Create a tracker logging every [`DEFAULT_PROGRESS_INTERVAL`] records.
    #[must_use]
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            interval: DEFAULT_PROGRESS_INTERVAL,
            count: AtomicU64::new(0),
        }
    }

    /// Override the logging interval.
    ///
    /// # Panics
    ///
    /// Panics if `interval` is zero.
    #[must_use]
    pub fn with_interval(mut self, interval: u64) -> Self {
        assert!(interval > 0, "progress interval must be at least 1");
        self.interval = interval;
        self
    }

    /// Add `additional` records to the count, logging if the cumulative count
    /// crossed an interval boundary. Returns whether a line was logged.
    pub fn record(&self, additional: u64) -> bool {
        if additional == 0 {
            return false;
        }
        let previous = self.count.fetch_add(additional, Ordering::Relaxed);
        let current = previous + additional;
        if current / self.interval > previous / self.interval {
            info!("{}: {}", self.message, format_count(current));
            true
        } else {
            false
        }
    }

    /// The cumulative record count.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Log the final count unconditionally.
    pub fn log_final(&self) {
        info!("{}: {} (complete)", self.message, format_count(self.count()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logs_only_on_interval_boundaries() {
        let tracker = ProgressTracker::new("Wrote records").with_interval(10);
        assert!(!tracker.record(9));
        assert!(tracker.record(1));
        assert!(!tracker.record(9));
        assert!(tracker.record(2));
        assert_eq!(tracker.count(), 21);
    }

    #[test]
    fn test_large_addition_crossing_multiple_boundaries_logs_once() {
        let tracker = ProgressTracker::new("Wrote records").with_interval(10);
        assert!(tracker.record(35));
        assert!(!tracker.record(4));
        assert_eq!(tracker.count(), 39);
    }

    #[test]
    fn test_zero_additional_never_logs() {
        let tracker = ProgressTracker::new("Wrote records").with_interval(1);
        assert!(!tracker.record(0));
        assert_eq!(tracker.count(), 0);
    }

    #[test]
    fn test_default_interval() {
        let tracker = ProgressTracker::new("Wrote records");
        assert!(!tracker.record(999));
        assert!(tracker.record(1));
    }
}
