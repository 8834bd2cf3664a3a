//! Human-readable durations for user-facing messages
//!
//! Whole units only: "5 minutes", "1 minute 30 seconds", "45 seconds".
//! Sub-second remainders are dropped.

use std::time::Duration;

fn plural(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", count, unit)
    }
}

/// Describe a duration in words
///
/// # Examples
///
/// ```
/// use chordscope_common::human_time::describe_duration;
/// use std::time::Duration;
///
/// assert_eq!(describe_duration(Duration::from_secs(300)), "5 minutes");
/// assert_eq!(describe_duration(Duration::from_secs(90)), "1 minute 30 seconds");
/// assert_eq!(describe_duration(Duration::from_secs(45)), "45 seconds");
/// ```
pub fn describe_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(plural(hours, "hour"));
    }
    if minutes > 0 {
        parts.push(plural(minutes, "minute"));
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(plural(seconds, "second"));
    }

    parts.join(" ")
}
