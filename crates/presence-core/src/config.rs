//! Engine configuration -- an immutable per-poll snapshot of every
//! filter toggle, keyword list, offset, and cadence setting. Never
//! mutated mid-pass.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::time::Duration as StdDuration;

/// Floor on the regular poll cadence.
pub const MIN_POLL_INTERVAL_SECS: u64 = 30;

/// Default character cap for the diagnostic buffer.
pub const DEFAULT_DIAG_CHAR_CAP: usize = 16 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Feed URL. Empty means unconfigured: the signal is forced off.
    pub url: String,
    /// Regular refresh cadence in seconds; [`MIN_POLL_INTERVAL_SECS`] is
    /// enforced as a floor.
    pub poll_interval_secs: u64,
    pub fetch_timeout_secs: u64,
    /// How far back the selection window reaches from `now`.
    pub include_past_hours: i64,
    /// How far forward the selection window reaches from `now`.
    pub horizon_days: i64,
    /// Cap on the survivor list; earliest-by-start kept on truncation.
    pub max_events: usize,
    /// Let all-day events drive the signal.
    pub trigger_all_day: bool,
    /// Only opaque (busy) events drive the signal.
    pub trigger_busy_only: bool,
    pub exclude_tentative: bool,
    /// Exclude events any attendee line declined.
    pub exclude_declined: bool,
    /// Comma-separated, case-insensitive; blank entries dropped.
    pub include_keywords: String,
    pub exclude_keywords: String,
    /// Signed offsets applied to every event's start/end, in minutes.
    pub start_offset_min: i64,
    pub end_offset_min: i64,
    /// Size of the upcoming-events display list.
    pub next_list_size: usize,
    pub next_list_show_location: bool,
    pub diag_char_cap: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            poll_interval_secs: 300,
            fetch_timeout_secs: 15,
            include_past_hours: 1,
            horizon_days: 2,
            max_events: 50,
            trigger_all_day: false,
            trigger_busy_only: true,
            exclude_tentative: false,
            exclude_declined: true,
            include_keywords: String::new(),
            exclude_keywords: String::new(),
            start_offset_min: 0,
            end_offset_min: 0,
            next_list_size: 5,
            next_list_show_location: false,
            diag_char_cap: DEFAULT_DIAG_CHAR_CAP,
        }
    }
}

impl EngineConfig {
    /// Regular cadence with the floor applied.
    pub fn poll_interval(&self) -> Duration {
        Duration::seconds(self.poll_interval_secs.max(MIN_POLL_INTERVAL_SECS) as i64)
    }

    pub fn fetch_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.fetch_timeout_secs)
    }

    pub fn include_list(&self) -> Vec<String> {
        keyword_list(&self.include_keywords)
    }

    pub fn exclude_list(&self) -> Vec<String> {
        keyword_list(&self.exclude_keywords)
    }
}

/// Split a comma-separated keyword string: lowercased, trimmed, blanks
/// dropped.
pub fn keyword_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}
