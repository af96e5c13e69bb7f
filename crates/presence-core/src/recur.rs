//! Bounded recurrence expansion for daily and weekly rules.
//!
//! Composes an iCalendar `DTSTART;TZID=..` + `RRULE:..` text block and
//! lets the `rrule` crate expand it, clipped to the selection window.
//! Each occurrence inherits the base event's duration and metadata.
//! Frequencies other than `DAILY`/`WEEKLY`, RDATE/EXDATE, and
//! `RECURRENCE-ID` overrides are out of scope; a rule the crate cannot
//! parse degrades to the single base occurrence plus a diagnostic note.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;

use crate::event::CalendarEvent;

/// Hard cap on expanded instances per rule, to prevent unbounded
/// expansion on rules without COUNT/UNTIL.
pub const MAX_OCCURRENCES: u16 = 256;

fn supported_frequency(rule: &str) -> bool {
    let upper = rule.to_ascii_uppercase();
    upper.contains("FREQ=DAILY") || upper.contains("FREQ=WEEKLY")
}

fn expand_event(
    event: &CalendarEvent,
    rule: &str,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Result<Vec<CalendarEvent>, String> {
    let zone = event.zone;
    let local_start = event.start.with_timezone(&zone).naive_local();
    let dtstart_ical = local_start.format("%Y%m%dT%H%M%S").to_string();

    // Inject UNTIL at the window edge when the rule is open-ended. The
    // rrule crate requires UNTIL and DTSTART to share a timezone: UTC
    // takes the `Z` suffix, other zones bare local time.
    let mut rule_str = rule.to_string();
    let upper = rule_str.to_ascii_uppercase();
    if !upper.contains("UNTIL=") && !upper.contains("COUNT=") {
        let until_local = window_end.with_timezone(&zone).naive_local();
        let mut until_ical = until_local.format("%Y%m%dT%H%M%S").to_string();
        if zone == Tz::UTC {
            until_ical.push('Z');
        }
        rule_str = format!("{};UNTIL={}", rule_str, until_ical);
    }

    let rrule_text = format!(
        "DTSTART;TZID={}:{}\nRRULE:{}",
        zone.name(),
        dtstart_ical,
        rule_str
    );
    let set: RRuleSet = rrule_text.parse().map_err(|e| format!("{e}"))?;

    // Bound the expansion from below as well, or a series whose DTSTART
    // lies far in the past exhausts the occurrence cap before reaching
    // the window. An occurrence that starts before the window but is
    // still running at its edge must survive, hence the duration slack.
    let duration = event.end - event.start;
    let lower = (window_start - duration).with_timezone(&rrule::Tz::UTC);
    let instances = set.after(lower).all(MAX_OCCURRENCES);

    Ok(instances
        .dates
        .into_iter()
        .map(|dt| {
            let start = dt.with_timezone(&Utc);
            CalendarEvent {
                start,
                end: start + duration,
                rrule: None,
                ..event.clone()
            }
        })
        .filter(|occurrence| occurrence.start <= window_end)
        .collect())
}

/// Expand every event carrying a supported `RRULE` into concrete
/// occurrences overlapping `[window_start, window_end]`. Returns the
/// expanded event list plus diagnostic notes for rules that were
/// skipped or failed to parse.
pub fn expand_recurrences(
    events: Vec<CalendarEvent>,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> (Vec<CalendarEvent>, Vec<String>) {
    let mut out = Vec::with_capacity(events.len());
    let mut notes = Vec::new();

    for event in events {
        let Some(rule) = event.rrule.clone() else {
            out.push(event);
            continue;
        };
        if !supported_frequency(&rule) {
            notes.push(format!(
                "unsupported RRULE frequency ignored for '{}': {}",
                event.summary, rule
            ));
            out.push(event);
            continue;
        }
        match expand_event(&event, &rule, window_start, window_end) {
            Ok(mut occurrences) => out.append(&mut occurrences),
            Err(message) => {
                notes.push(format!(
                    "RRULE parse failed for '{}': {}",
                    event.summary, message
                ));
                out.push(event);
            }
        }
    }

    (out, notes)
}
