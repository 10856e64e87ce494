//! Clock abstraction and time formatting helpers.

use std::time::{SystemTime, UNIX_EPOCH};

pub const SECS_PER_DAY: u64 = 86_400;

/// Source of wall-clock time.
///
/// The monitor stamps decision-tree entries and buckets sync outcomes by day;
/// tests substitute a deterministic implementation.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;

    fn now_secs(&self) -> u64 {
        self.now_millis() / 1000
    }
}

/// The operating system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }
}

/// Days since the Unix epoch (UTC) for a timestamp in seconds.
pub fn day_index(unix_secs: u64) -> u64 {
    unix_secs / SECS_PER_DAY
}

/// Format a duration in milliseconds to a human-readable string.
pub fn format_duration(millis: u64) -> String {
    let secs = millis / 1000;
    if secs == 0 {
        format!("{}ms", millis)
    } else if secs < 60 {
        format!("{}.{:03}s", secs, millis % 1000)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}
