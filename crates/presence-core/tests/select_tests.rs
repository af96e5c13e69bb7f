//! Tests for window restriction, effective offsets, and governing/next
//! selection.

use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use presence_core::event::{CalendarEvent, EventStatus, Transparency};
use presence_core::{select_events, EngineConfig};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

fn event(uid: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> CalendarEvent {
    CalendarEvent {
        uid: uid.to_string(),
        summary: uid.to_string(),
        location: String::new(),
        status: EventStatus::None,
        transparency: Transparency::Opaque,
        attendee_responses: Vec::new(),
        start,
        end,
        is_all_day: false,
        zone: Tz::UTC,
        rrule: None,
    }
}

#[test]
fn governing_is_the_active_event_soonest_to_end() {
    // Two overlapping active events ending at now+10m and now+30m: the
    // governing event is the one ending first.
    let events = vec![
        event("long", now() - Duration::minutes(20), now() + Duration::minutes(30)),
        event("short", now() - Duration::minutes(5), now() + Duration::minutes(10)),
    ];
    let selection = select_events(&events, now(), &EngineConfig::default());

    assert!(selection.signal);
    assert_eq!(selection.governing_event().unwrap().event.uid, "short");
    assert_eq!(
        selection.governing_event().unwrap().effective_end,
        now() + Duration::minutes(10)
    );
}

#[test]
fn next_is_the_first_survivor_starting_after_now() {
    let events = vec![
        event("later", now() + Duration::hours(3), now() + Duration::hours(4)),
        event("sooner", now() + Duration::hours(1), now() + Duration::hours(2)),
    ];
    let selection = select_events(&events, now(), &EngineConfig::default());

    assert!(!selection.signal);
    assert!(selection.governing_event().is_none());
    assert_eq!(selection.next_event().unwrap().event.uid, "sooner");
}

#[test]
fn offsets_shift_the_effective_interval() {
    // Event starts in 10 minutes, but a -15 minute start offset makes it
    // already active.
    let events = vec![event(
        "soon",
        now() + Duration::minutes(10),
        now() + Duration::hours(1),
    )];
    let cfg = EngineConfig {
        start_offset_min: -15,
        ..EngineConfig::default()
    };
    let selection = select_events(&events, now(), &cfg);
    assert!(selection.signal);
}

#[test]
fn degenerate_interval_after_offsetting_is_discarded() {
    let events = vec![event(
        "shrunk",
        now() - Duration::minutes(10),
        now() + Duration::minutes(20),
    )];
    let cfg = EngineConfig {
        end_offset_min: -60,
        ..EngineConfig::default()
    };
    let selection = select_events(&events, now(), &cfg);
    assert!(selection.survivors.is_empty());
    assert!(!selection.signal);
}

#[test]
fn events_outside_the_window_are_dropped() {
    let cfg = EngineConfig {
        include_past_hours: 1,
        horizon_days: 2,
        ..EngineConfig::default()
    };
    let events = vec![
        event("ancient", now() - Duration::hours(5), now() - Duration::hours(4)),
        event("far", now() + Duration::days(3), now() + Duration::days(4)),
        event("in window", now() + Duration::hours(2), now() + Duration::hours(3)),
    ];
    let selection = select_events(&events, now(), &cfg);
    assert_eq!(selection.survivors.len(), 1);
    assert_eq!(selection.survivors[0].event.uid, "in window");
}

#[test]
fn survivor_list_is_sorted_and_capped_keeping_earliest() {
    let cfg = EngineConfig {
        max_events: 2,
        ..EngineConfig::default()
    };
    let events = vec![
        event("c", now() + Duration::hours(3), now() + Duration::hours(4)),
        event("a", now() + Duration::hours(1), now() + Duration::minutes(90)),
        event("b", now() + Duration::hours(2), now() + Duration::minutes(150)),
    ];
    let selection = select_events(&events, now(), &cfg);
    let uids: Vec<&str> = selection
        .survivors
        .iter()
        .map(|s| s.event.uid.as_str())
        .collect();
    assert_eq!(uids, vec!["a", "b"]);
}

#[test]
fn upcoming_list_respects_its_limit() {
    let events = vec![
        event("e1", now() + Duration::hours(1), now() + Duration::hours(2)),
        event("e2", now() + Duration::hours(2), now() + Duration::hours(3)),
        event("e3", now() + Duration::hours(3), now() + Duration::hours(4)),
    ];
    let selection = select_events(&events, now(), &EngineConfig::default());
    let upcoming = selection.upcoming(now(), 2);
    assert_eq!(upcoming.len(), 2);
    assert_eq!(upcoming[0].event.uid, "e1");
}

#[test]
fn ineligible_events_never_reach_the_survivor_list() {
    let mut transparent = event("ghost", now() - Duration::minutes(5), now() + Duration::hours(1));
    transparent.transparency = Transparency::Transparent;
    let cfg = EngineConfig {
        trigger_busy_only: true,
        ..EngineConfig::default()
    };
    let selection = select_events(&[transparent], now(), &cfg);
    assert!(selection.survivors.is_empty());
    assert!(!selection.signal);
}
