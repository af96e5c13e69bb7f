//! Property-based tests for the date-time decoder and the selection
//! invariants.
//!
//! These verify invariants that should hold for *any* input in range,
//! not just the examples in the unit-style suites.

use chrono::{Duration, TimeZone, Utc};
use chrono_tz::Tz;
use presence_core::event::{CalendarEvent, EventStatus, Transparency};
use presence_core::{decode_instant, select_events, EngineConfig};
use proptest::prelude::*;

fn arb_zone() -> impl Strategy<Value = Tz> {
    prop_oneof![
        Just(Tz::UTC),
        Just(Tz::America__New_York),
        Just(Tz::America__Los_Angeles),
        Just(Tz::Europe__London),
        Just(Tz::Asia__Tokyo),
    ]
}

proptest! {
    /// Decoding a `...Z` token always yields the same instant regardless
    /// of the TZID parameter, feed fallback, or local zone: the UTC path
    /// ignores every fallback tier.
    #[test]
    fn utc_decode_ignores_fallback_tiers(
        year in 1990i32..2100,
        month in 1u32..=12,
        day in 1u32..=28,
        hour in 0u32..24,
        minute in 0u32..60,
        second in 0u32..60,
        feed in arb_zone(),
        local in arb_zone(),
    ) {
        let token = format!(
            "{:04}{:02}{:02}T{:02}{:02}{:02}Z",
            year, month, day, hour, minute, second
        );
        let decoded = decode_instant(&token, Some("America/New_York"), Some(feed), local)
            .expect("UTC token should always decode");
        let expected = Utc
            .with_ymd_and_hms(year, month, day, hour, minute, second)
            .unwrap();
        prop_assert_eq!(decoded.instant, expected);
        prop_assert!(!decoded.all_day);
    }

    /// No survivor ever carries a degenerate effective interval, for any
    /// combination of start/end offsets.
    #[test]
    fn survivors_never_have_degenerate_effective_intervals(
        start_offset in -240i64..240,
        end_offset in -240i64..240,
        duration_min in 1i64..180,
    ) {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let event = CalendarEvent {
            uid: "prop".to_string(),
            summary: "prop".to_string(),
            location: String::new(),
            status: EventStatus::None,
            transparency: Transparency::Opaque,
            attendee_responses: Vec::new(),
            start: now - Duration::minutes(30),
            end: now - Duration::minutes(30) + Duration::minutes(duration_min),
            is_all_day: false,
            zone: Tz::UTC,
            rrule: None,
        };
        let cfg = EngineConfig {
            start_offset_min: start_offset,
            end_offset_min: end_offset,
            ..EngineConfig::default()
        };
        let selection = select_events(&[event], now, &cfg);
        for survivor in &selection.survivors {
            prop_assert!(survivor.effective_end >= survivor.effective_start);
        }
    }
}
