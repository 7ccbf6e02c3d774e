//! Session countdown presentation helpers.

use std::time::Duration;

/// Remaining session lifetime as shown in the dashboard header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub remaining_secs: u64,
    pub warning: bool,
}

impl Countdown {
    /// Flags the countdown as a warning once strictly below `warning_threshold`.
    pub fn new(remaining_secs: u64, warning_threshold: Duration) -> Self {
        Self {
            remaining_secs,
            warning: remaining_secs < warning_threshold.as_secs(),
        }
    }

    /// `m:ss` label, e.g. `59:07`.
    pub fn label(&self) -> String {
        format_countdown(self.remaining_secs)
    }
}

/// Formats seconds as `m:ss`; minutes are not capped at 59.
pub fn format_countdown(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
