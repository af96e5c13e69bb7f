//! Event building -- assembles one [`CalendarEvent`] per parsed block.
//!
//! A block without a decodable `DTSTART` is dropped with enough context
//! (raw value, TZID, UID, summary) to make feed anomalies diagnosable,
//! and parsing continues for the rest of the document. A missing end
//! defaults to one calendar day for all-day events and 30 minutes for
//! timed ones. `end < start` is rejected at build time.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

use crate::datetime::{decode_instant, DecodedInstant};
use crate::property::EventBlock;

/// Default duration for a timed event with no `DTEND`.
pub const DEFAULT_TIMED_DURATION_MIN: i64 = 30;

/// `STATUS` property, parsed case-insensitively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EventStatus {
    #[default]
    None,
    Tentative,
    Confirmed,
    Cancelled,
}

impl EventStatus {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("TENTATIVE") => Self::Tentative,
            Some(s) if s.eq_ignore_ascii_case("CONFIRMED") => Self::Confirmed,
            Some(s) if s.eq_ignore_ascii_case("CANCELLED") => Self::Cancelled,
            _ => Self::None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Tentative => "tentative",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// `TRANSP` property. Anything other than `TRANSPARENT` is opaque.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Transparency {
    #[default]
    Opaque,
    Transparent,
}

impl Transparency {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("TRANSPARENT") => Self::Transparent,
            _ => Self::Opaque,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Opaque => "opaque",
            Self::Transparent => "transparent",
        }
    }
}

/// `PARTSTAT` parameter on an `ATTENDEE` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartStat {
    Accepted,
    Declined,
    Tentative,
    NeedsAction,
    Other(String),
}

impl PartStat {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("ACCEPTED") {
            Self::Accepted
        } else if trimmed.eq_ignore_ascii_case("DECLINED") {
            Self::Declined
        } else if trimmed.eq_ignore_ascii_case("TENTATIVE") {
            Self::Tentative
        } else if trimmed.eq_ignore_ascii_case("NEEDS-ACTION") {
            Self::NeedsAction
        } else {
            Self::Other(trimmed.to_ascii_uppercase())
        }
    }
}

/// One calendar event with resolved absolute times.
///
/// Immutable once built; effective (offset-adjusted) times are derived at
/// selection time, not stored here. `zone` is the timezone the start was
/// resolved in, kept for recurrence expansion and display.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub uid: String,
    pub summary: String,
    pub location: String,
    pub status: EventStatus,
    pub transparency: Transparency,
    pub attendee_responses: Vec<PartStat>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub is_all_day: bool,
    pub zone: Tz,
    pub rrule: Option<String>,
}

/// Context for a per-event drop, surfaced on the diagnostic sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedEvent {
    pub uid: String,
    pub summary: String,
    pub raw_value: String,
    pub tzid: Option<String>,
    pub reason: String,
}

/// Unescape ICS text values: `\n`/`\N` to newline, `\\`, `\,`, `\;` to
/// the literal character. Unknown escapes pass through untouched.
pub fn unescape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(',') => out.push(','),
            Some(';') => out.push(';'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn default_end(start: &DecodedInstant) -> DateTime<Utc> {
    if start.all_day {
        start.instant + Duration::days(1)
    } else {
        start.instant + Duration::minutes(DEFAULT_TIMED_DURATION_MIN)
    }
}

/// Build one [`CalendarEvent`] from an accumulated block.
///
/// # Errors
///
/// Returns a [`DroppedEvent`] when the start is missing or undecodable,
/// or when the end precedes the start.
pub fn build_event(
    block: EventBlock,
    feed_tz: Option<Tz>,
    local_tz: Tz,
) -> Result<CalendarEvent, DroppedEvent> {
    let uid = block.uid.unwrap_or_default();
    let summary = unescape_text(block.summary.as_deref().unwrap_or(""));
    let location = unescape_text(block.location.as_deref().unwrap_or(""));

    let Some(dtstart) = block.dtstart else {
        return Err(DroppedEvent {
            uid,
            summary,
            raw_value: String::new(),
            tzid: None,
            reason: "missing DTSTART".to_string(),
        });
    };

    let start_tzid = dtstart.param("TZID").map(str::to_string);
    let start = match decode_instant(&dtstart.value, start_tzid.as_deref(), feed_tz, local_tz) {
        Ok(decoded) => decoded,
        Err(err) => {
            return Err(DroppedEvent {
                uid,
                summary,
                raw_value: dtstart.value.clone(),
                tzid: start_tzid,
                reason: err.to_string(),
            });
        }
    };

    // An absent or undecodable end falls back to the default duration;
    // only `end < start` is fatal for the event.
    let end = match &block.dtend {
        Some(prop) => {
            let tzid = prop.param("TZID");
            match decode_instant(&prop.value, tzid, feed_tz, local_tz) {
                Ok(decoded) => decoded.instant,
                Err(_) => default_end(&start),
            }
        }
        None => default_end(&start),
    };

    if end < start.instant {
        return Err(DroppedEvent {
            uid,
            summary,
            raw_value: dtstart.value,
            tzid: start_tzid,
            reason: "end precedes start".to_string(),
        });
    }

    let attendee_responses = block
        .attendees
        .iter()
        .filter_map(|prop| prop.param("PARTSTAT"))
        .map(PartStat::parse)
        .collect();

    Ok(CalendarEvent {
        uid,
        summary,
        location,
        status: EventStatus::parse(block.status.as_deref()),
        transparency: Transparency::parse(block.transparency.as_deref()),
        attendee_responses,
        start: start.instant,
        end,
        is_all_day: start.all_day,
        zone: start.zone,
        rrule: block.rrule,
    })
}
