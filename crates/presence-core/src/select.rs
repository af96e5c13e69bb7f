//! Window restriction and governing/next selection.
//!
//! Applies the configured start/end offsets to every event, keeps the
//! eligible events whose effective interval overlaps the selection
//! window, and determines which event currently governs the signal and
//! which one starts next.

use chrono::{DateTime, Duration, Utc};

use crate::config::EngineConfig;
use crate::event::CalendarEvent;
use crate::filter::is_eligible;

/// An event paired with its effective (offset-adjusted) interval.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEvent {
    pub event: CalendarEvent,
    pub effective_start: DateTime<Utc>,
    pub effective_end: DateTime<Utc>,
}

/// The outcome of one selection pass.
///
/// `survivors` is sorted by effective start and capped at the configured
/// maximum. The externally observed boolean signal is true iff at least
/// one active event exists.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub survivors: Vec<ScheduledEvent>,
    pub governing: Option<usize>,
    pub next: Option<usize>,
    pub signal: bool,
}

impl Selection {
    /// The active event chosen to represent "why the signal is on":
    /// among active events, the one with the earliest effective end.
    pub fn governing_event(&self) -> Option<&ScheduledEvent> {
        self.governing.and_then(|i| self.survivors.get(i))
    }

    /// The first survivor whose effective start is after `now`.
    pub fn next_event(&self) -> Option<&ScheduledEvent> {
        self.next.and_then(|i| self.survivors.get(i))
    }

    /// Up to `limit` upcoming events, in effective-start order.
    pub fn upcoming(&self, now: DateTime<Utc>, limit: usize) -> Vec<&ScheduledEvent> {
        self.survivors
            .iter()
            .filter(|s| s.effective_start > now)
            .take(limit)
            .collect()
    }
}

/// Run the window/eligibility pass and pick the governing and next
/// events as of `now`.
pub fn select_events(
    events: &[CalendarEvent],
    now: DateTime<Utc>,
    cfg: &EngineConfig,
) -> Selection {
    let window_start = now - Duration::hours(cfg.include_past_hours);
    let window_end = now + Duration::days(cfg.horizon_days);

    let mut survivors: Vec<ScheduledEvent> = events
        .iter()
        .filter(|event| is_eligible(event, cfg))
        .filter_map(|event| {
            let effective_start = event.start + Duration::minutes(cfg.start_offset_min);
            let effective_end = event.end + Duration::minutes(cfg.end_offset_min);
            // Degenerate after offsetting.
            if effective_end < effective_start {
                return None;
            }
            // Keep only intervals overlapping [window_start, window_end].
            if effective_start > window_end || effective_end < window_start {
                return None;
            }
            Some(ScheduledEvent {
                event: event.clone(),
                effective_start,
                effective_end,
            })
        })
        .collect();

    survivors.sort_by_key(|s| (s.effective_start, s.effective_end));
    survivors.truncate(cfg.max_events);

    // Governing: the active event soonest to end, so the scheduler wakes
    // at the nearest real boundary.
    let governing = survivors
        .iter()
        .enumerate()
        .filter(|(_, s)| s.effective_start <= now && now < s.effective_end)
        .min_by_key(|(_, s)| s.effective_end)
        .map(|(i, _)| i);

    let next = survivors.iter().position(|s| s.effective_start > now);

    Selection {
        signal: governing.is_some(),
        survivors,
        governing,
        next,
    }
}
