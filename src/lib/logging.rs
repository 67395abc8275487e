//! Formatting helpers and summaries for log output.

use std::time::{Duration, Instant};

use crate::stats::ReconcileStats;

/// Formats a count with thousands separators.
///
/// # Examples
///
/// ```
/// use fragmerge_lib::logging::format_count;
///
/// assert_eq!(format_count(0), "0");
/// assert_eq!(format_count(1234567), "1,234,567");
/// ```
#[must_use]
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Formats a fraction (0.0-1.0) as a percentage with `decimals` decimal places.
///
/// # Examples
///
/// ```
/// use fragmerge_lib::logging::format_percent;
///
/// assert_eq!(format_percent(0.9543, 2), "95.43%");
/// assert_eq!(format_percent(1.0, 0), "100%");
/// ```
#[must_use]
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.decimals$}%", value * 100.0, decimals = decimals)
}

/// Formats a duration as e.g. "45s", "2m 15s" or "1h 30m".
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        let (mins, rest) = (secs / 60, secs % 60);
        if rest == 0 { format!("{mins}m") } else { format!("{mins}m {rest}s") }
    } else {
        let (hours, mins) = (secs / 3600, (secs % 3600) / 60);
        if mins == 0 { format!("{hours}h") } else { format!("{hours}h {mins}m") }
    }
}

/// Formats a throughput in fragments per second, or per minute when slower than one a second.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_rate(count: u64, duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 0.001 {
        return format!("{} fragments/s", format_count(count));
    }
    let rate = count as f64 / secs;
    if rate >= 1.0 {
        format!("{} fragments/s", format_count(rate as u64))
    } else {
        format!("{:.1} fragments/min", rate * 60.0)
    }
}

/// Logs the end-of-run summary of a reconciliation.
#[allow(clippy::cast_precision_loss)]
pub fn log_reconcile_summary(stats: &ReconcileStats) {
    log::info!("Reconcile Summary:");
    log::info!("  Fragments: {}", format_count(stats.fragments));
    log::info!(
        "  Fragments with interval overlaps: {}",
        format_count(stats.fragments_with_overlaps)
    );
    log::info!(
        "  Computed pairs: {} ({} already among the alignments)",
        format_count(stats.computed_pairs),
        format_count(stats.excluded_computed_pairs)
    );
    log::info!(
        "  Original pairs: {} ({} covered by computed pairs)",
        format_count(stats.original_pairs),
        format_count(stats.removed_original_pairs)
    );
    log::info!(
        "  Aligned records written: {} ({} secondary)",
        format_count(stats.emitted_records),
        format_count(stats.secondary_records)
    );
    log::info!("  Default records written: {}", format_count(stats.default_records));

    if stats.fragments > 0 {
        let fraction = stats.fragments_with_defaults as f64 / stats.fragments as f64;
        log::info!("  Fragments needing a default record: {}", format_percent(fraction, 2));
    }
    if stats.pass_through_fragments > 0 {
        log::info!(
            "  Passed through after the last interval overlap: {} fragments, {} records",
            format_count(stats.pass_through_fragments),
            format_count(stats.pass_through_records)
        );
    }
}

/// Logs the start of an operation and, on completion, its duration and throughput.
///
/// ```no_run
/// use fragmerge_lib::logging::OperationTimer;
///
/// let timer = OperationTimer::new("Reconciling fragments");
/// // ... do work ...
/// timer.log_completion(10_000);
/// ```
pub struct OperationTimer {
    operation: String,
    start_time: Instant,
}

impl OperationTimer {
    #[must_use]
    pub fn new(operation: &str) -> Self {
        log::info!("{operation} ...");
        Self { operation: operation.to_string(), start_time: Instant::now() }
    }

    pub fn log_completion(&self, count: u64) {
        let duration = self.start_time.elapsed();
        log::info!(
            "{} completed: {} fragments in {} ({})",
            self.operation,
            format_count(count),
            format_duration(duration),
            format_rate(count, duration)
        );
    }
}
