//! Tests for transition planning, reschedule tolerance, and cadence
//! throttling.

use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use presence_core::event::{CalendarEvent, EventStatus, Transparency};
use presence_core::schedule::{cadence_backoff, next_regular_run};
use presence_core::{
    plan_transition, select_events, EngineConfig, SchedulerState, TransitionReason,
};

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

fn select(events: &[CalendarEvent]) -> presence_core::Selection {
    select_events(events, now(), &EngineConfig::default())
}

#[test]
fn active_event_schedules_its_effective_end() {
    let events = [event(
        "active",
        now() - Duration::minutes(30),
        now() + Duration::minutes(10),
    )];
    let plan = plan_transition(&select(&events), now(), &SchedulerState::default()).unwrap();

    assert_eq!(plan.target, now() + Duration::minutes(10));
    assert_eq!(plan.reason, TransitionReason::ActiveEnd);
    assert_eq!(plan.delay, Duration::minutes(10));
    assert!(plan.rearm);
}

#[test]
fn overlapping_actives_schedule_the_nearest_end() {
    let events = [
        event("short", now() - Duration::minutes(5), now() + Duration::minutes(10)),
        event("long", now() - Duration::minutes(5), now() + Duration::minutes(30)),
    ];
    let plan = plan_transition(&select(&events), now(), &SchedulerState::default()).unwrap();
    assert_eq!(plan.target, now() + Duration::minutes(10));
}

#[test]
fn without_actives_the_next_start_is_scheduled() {
    let events = [event(
        "future",
        now() + Duration::hours(1),
        now() + Duration::hours(2),
    )];
    let plan = plan_transition(&select(&events), now(), &SchedulerState::default()).unwrap();

    assert_eq!(plan.target, now() + Duration::hours(1));
    assert_eq!(plan.reason, TransitionReason::NextStart);
    assert_eq!(plan.reason.tag(), "next-start");
}

#[test]
fn empty_selection_schedules_nothing() {
    assert!(plan_transition(&select(&[]), now(), &SchedulerState::default()).is_none());
}

#[test]
fn target_within_tolerance_does_not_rearm() {
    let target = now() + Duration::minutes(10);
    let events = [event("active", now() - Duration::minutes(5), target)];
    let state = SchedulerState {
        last_poll: Some(now() - Duration::minutes(5)),
        next_transition: Some(target + Duration::seconds(1)),
    };
    let plan = plan_transition(&select(&events), now(), &state).unwrap();
    assert!(!plan.rearm);
}

#[test]
fn target_beyond_tolerance_rearms() {
    let target = now() + Duration::minutes(10);
    let events = [event("active", now() - Duration::minutes(5), target)];
    let state = SchedulerState {
        last_poll: Some(now() - Duration::minutes(5)),
        next_transition: Some(target + Duration::seconds(5)),
    };
    let plan = plan_transition(&select(&events), now(), &state).unwrap();
    assert!(plan.rearm);
}

#[test]
fn past_target_gets_the_minimum_delay() {
    // Active event whose end slipped just behind the clock: the delay is
    // floored, never zero or negative.
    let events = [event(
        "ending",
        now() - Duration::minutes(30),
        now() + Duration::milliseconds(200),
    )];
    let plan = plan_transition(&select(&events), now(), &SchedulerState::default()).unwrap();
    assert_eq!(plan.delay, Duration::seconds(1));
}

#[test]
fn regular_run_is_due_immediately_on_first_start() {
    let state = SchedulerState::default();
    assert_eq!(
        next_regular_run(&state, now(), Duration::seconds(300)),
        now()
    );
}

#[test]
fn regular_run_follows_the_fixed_interval() {
    let state = SchedulerState {
        last_poll: Some(now() - Duration::seconds(100)),
        next_transition: None,
    };
    assert_eq!(
        next_regular_run(&state, now(), Duration::seconds(300)),
        now() + Duration::seconds(200)
    );
}

#[test]
fn overdue_regular_run_is_due_now_not_in_the_past() {
    let state = SchedulerState {
        last_poll: Some(now() - Duration::seconds(900)),
        next_transition: None,
    };
    assert_eq!(
        next_regular_run(&state, now(), Duration::seconds(300)),
        now()
    );
}

#[test]
fn cadence_run_inside_minimum_gap_backs_off() {
    let state = SchedulerState {
        last_poll: Some(now() - Duration::seconds(10)),
        next_transition: None,
    };
    let backoff = cadence_backoff(&state, now(), Duration::seconds(30)).unwrap();
    assert_eq!(backoff, Duration::seconds(20));
}

#[test]
fn cadence_run_after_minimum_gap_proceeds() {
    let state = SchedulerState {
        last_poll: Some(now() - Duration::seconds(45)),
        next_transition: None,
    };
    assert!(cadence_backoff(&state, now(), Duration::seconds(30)).is_none());
}
