//! Periodic progress logging.

use log::info;

/// Counts processed items and logs a line each time the count crosses a multiple of the interval.
///
/// # Example
/// ```
/// use fragmerge_lib::progress::ProgressTracker;
///
/// let mut tracker = ProgressTracker::new("Reconciled fragments").with_interval(100);
/// for _ in 0..250 {
///     tracker.log_if_needed(1); // logs at 100 and 200
/// }
/// tracker.log_final(); // logs "Reconciled fragments 250 (complete)"
/// assert_eq!(tracker.count(), 250);
/// ```
#[derive(Debug)]
pub struct ProgressTracker {
    interval: u64,
    message: String,
    count: u64,
}

impl ProgressTracker {
    /// A tracker with a count of 0 and an interval of 1,000,000.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { interval: 1_000_000, message: message.into(), count: 0 }
    }

    /// Sets the logging interval. An interval of 0 is treated as 1.
    #[must_use]
    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval.max(1);
        self
    }

    /// Adds to the count, logging once per interval boundary crossed.
    ///
    /// Returns `true` when the new count is exactly a multiple of the interval.
    pub fn log_if_needed(&mut self, additional: u64) -> bool {
        let previous = self.count;
        self.count += additional;
        for milestone in (previous / self.interval + 1)..=(self.count / self.interval) {
            info!("{} {}", self.message, milestone * self.interval);
        }
        self.count > 0 && self.count.is_multiple_of(self.interval)
    }

    /// Logs the final count unless the last boundary already reported it.
    pub fn log_final(&self) {
        if self.count > 0 && !self.count.is_multiple_of(self.interval) {
            info!("{} {} (complete)", self.message, self.count);
        }
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }
}
