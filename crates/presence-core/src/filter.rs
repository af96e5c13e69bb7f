//! Eligibility filtering -- which events may drive the busy/free signal.
//!
//! All checks are pure functions of one event and the immutable config;
//! there is no ordering dependency between events.

use crate::config::EngineConfig;
use crate::event::{CalendarEvent, EventStatus, PartStat, Transparency};

/// Apply the eligibility rules in order:
///
/// 1. cancelled events never qualify;
/// 2. all-day events only when `trigger_all_day`;
/// 3. transparent events only when not `trigger_busy_only`;
/// 4. tentative events dropped when `exclude_tentative`;
/// 5. events with any declined attendee dropped when `exclude_declined`;
/// 6. with an include list, summary+location must contain a keyword;
/// 7. with an exclude list, summary+location must contain none.
pub fn is_eligible(event: &CalendarEvent, cfg: &EngineConfig) -> bool {
    if event.status == EventStatus::Cancelled {
        return false;
    }
    if !cfg.trigger_all_day && event.is_all_day {
        return false;
    }
    if cfg.trigger_busy_only && event.transparency == Transparency::Transparent {
        return false;
    }
    if cfg.exclude_tentative && event.status == EventStatus::Tentative {
        return false;
    }
    if cfg.exclude_declined
        && event
            .attendee_responses
            .iter()
            .any(|r| *r == PartStat::Declined)
    {
        return false;
    }

    let include = cfg.include_list();
    let exclude = cfg.exclude_list();
    if include.is_empty() && exclude.is_empty() {
        return true;
    }

    // Summary and location concatenated directly, no separator.
    let haystack = format!("{}{}", event.summary, event.location).to_lowercase();
    if !include.is_empty() && !include.iter().any(|k| haystack.contains(k)) {
        return false;
    }
    if exclude.iter().any(|k| haystack.contains(k)) {
        return false;
    }
    true
}
