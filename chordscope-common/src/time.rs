//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

/// Whole seconds elapsed between `since` and `until`, clamped at zero
///
/// Clock adjustments can make `until` precede `since`; those report 0.
pub fn elapsed_seconds(since: DateTime<Utc>, until: DateTime<Utc>) -> u64 {
    until.signed_duration_since(since).num_seconds().max(0) as u64
}
