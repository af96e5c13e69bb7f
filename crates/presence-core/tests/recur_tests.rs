//! Tests for bounded daily/weekly recurrence expansion.

use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use presence_core::event::{CalendarEvent, EventStatus, Transparency};
use presence_core::recur::expand_recurrences;

fn weekly_event(rule: &str) -> CalendarEvent {
    CalendarEvent {
        uid: "recurring".to_string(),
        summary: "Weekly sync".to_string(),
        location: String::new(),
        status: EventStatus::None,
        transparency: Transparency::Opaque,
        attendee_responses: Vec::new(),
        // 09:00 New York on Wed Jan 1 2025 = 14:00 UTC.
        start: Utc.with_ymd_and_hms(2025, 1, 1, 14, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2025, 1, 1, 15, 0, 0).unwrap(),
        is_all_day: false,
        zone: Tz::America__New_York,
        rrule: Some(rule.to_string()),
    }
}

fn window_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

fn window_end() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 21, 0, 0, 0).unwrap()
}

#[test]
fn weekly_rule_expands_to_concrete_occurrences_within_the_window() {
    let (events, notes) = expand_recurrences(
        vec![weekly_event("FREQ=WEEKLY")],
        window_start(),
        window_end(),
    );

    assert!(notes.is_empty());
    // Jan 1, 8, 15 fall before the window edge; Jan 22 does not.
    assert_eq!(events.len(), 3);
    assert_eq!(
        events[1].start,
        Utc.with_ymd_and_hms(2025, 1, 8, 14, 0, 0).unwrap()
    );
    // Occurrences inherit the base duration and metadata.
    assert_eq!(events[1].end - events[1].start, Duration::hours(1));
    assert_eq!(events[2].summary, "Weekly sync");
    assert!(events.iter().all(|e| e.rrule.is_none()));
}

#[test]
fn rule_count_is_honored() {
    let (events, notes) = expand_recurrences(
        vec![weekly_event("FREQ=WEEKLY;COUNT=2")],
        window_start(),
        window_end(),
    );
    assert!(notes.is_empty());
    assert_eq!(events.len(), 2);
}

#[test]
fn long_running_daily_series_yields_occurrences_in_the_current_window() {
    // DTSTART two years before the window; without a lower bound the
    // occurrence cap would be spent entirely on past instances.
    let mut daily = weekly_event("FREQ=DAILY");
    daily.zone = Tz::UTC;
    daily.start = Utc.with_ymd_and_hms(2023, 6, 1, 9, 0, 0).unwrap();
    daily.end = Utc.with_ymd_and_hms(2023, 6, 1, 10, 0, 0).unwrap();

    let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2025, 6, 3, 0, 0, 0).unwrap();
    let (events, notes) = expand_recurrences(vec![daily], start, end);

    assert!(notes.is_empty());
    // Jun 1 and Jun 2 at 09:00; Jun 3 09:00 falls past the window edge.
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[0].start,
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    );
    assert_eq!(
        events[1].start,
        Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap()
    );
}

#[test]
fn occurrence_still_running_at_the_window_start_survives() {
    // 23:30 starts with a one-hour duration: the Jan 0 23:30 occurrence
    // is still active at the Jan 1 00:00 window start.
    let mut nightly = weekly_event("FREQ=DAILY;COUNT=5");
    nightly.zone = Tz::UTC;
    nightly.start = Utc.with_ymd_and_hms(2024, 12, 29, 23, 30, 0).unwrap();
    nightly.end = Utc.with_ymd_and_hms(2024, 12, 30, 0, 30, 0).unwrap();

    let (events, _) = expand_recurrences(vec![nightly], window_start(), window_end());

    assert_eq!(
        events[0].start,
        Utc.with_ymd_and_hms(2024, 12, 31, 23, 30, 0).unwrap()
    );
    assert!(events[0].end > window_start());
}

#[test]
fn unsupported_frequency_keeps_the_base_occurrence_with_a_note() {
    let (events, notes) = expand_recurrences(
        vec![weekly_event("FREQ=MONTHLY")],
        window_start(),
        window_end(),
    );
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].start,
        Utc.with_ymd_and_hms(2025, 1, 1, 14, 0, 0).unwrap()
    );
    assert_eq!(notes.len(), 1);
    assert!(notes[0].contains("unsupported"));
}

#[test]
fn events_without_rules_pass_through_untouched() {
    let mut plain = weekly_event("FREQ=WEEKLY");
    plain.rrule = None;
    let (events, notes) =
        expand_recurrences(vec![plain.clone()], window_start(), window_end());
    assert!(notes.is_empty());
    assert_eq!(events, vec![plain]);
}
