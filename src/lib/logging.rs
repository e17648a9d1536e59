//! Logging helpers: human-readable formatting and operation timing.

use log::info;
use std::time::{Duration, Instant};

/// Format a count with thousands separators.
///
/// # Example
/// ```
/// use fgalign_lib::logging::format_count;
///
/// assert_eq!(format_count(1_234_567), "1,234,567");
/// assert_eq!(format_count(42), "42");
/// ```
#[must_use]
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format a duration as hours, minutes, and seconds, dropping leading zero
/// components.
///
/// # Example
/// ```
/// use fgalign_lib::logging::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(3_725)), "1h 2m 5s");
/// assert_eq!(format_duration(Duration::from_millis(1_500)), "1.5s");
/// ```
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

/// Format a processing rate as records per second.
#[must_use]
pub fn format_rate(count: u64, duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs <= 0.0 {
        return "n/a".to_string();
    }
    format!("{} records/s", format_count((count as f64 / secs).round() as u64))
}

/// Logs the start and completion of a long-running operation with elapsed
/// time and throughput.
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    /// Start timing and log the start of the operation.
    #[must_use]
    pub fn new(operation: &str) -> Self {
        info!("Starting {operation}");
        Self { operation: operation.to_string(), start: Instant::now() }
    }

    /// Elapsed time since the timer was started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Log completion with record count, elapsed time, and rate.
    pub fn log_completion(&self, records: u64) {
        let elapsed = self.elapsed();
        info!(
            "{} complete: {} records in {} ({})",
            self.operation,
            format_count(records),
            format_duration(elapsed),
            format_rate(records, elapsed)
        );
    }
}
