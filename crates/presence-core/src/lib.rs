//! # presence-core
//!
//! Turns a remote iCalendar feed into a binary busy/free signal with
//! boundary-exact transition timing.
//!
//! The engine parses an ICS document into typed events, resolves each
//! event's absolute time span across the three timezone encodings feeds
//! use (UTC `Z` values, per-property `TZID` parameters, and floating
//! local times), filters events down to the subset that should drive the
//! signal, selects the governing and next events, and computes the single
//! next wake-up instant at which the signal must flip — independent of
//! the background refresh cadence.
//!
//! ## Quick start
//!
//! ```rust
//! use presence_core::parse_feed;
//! use chrono_tz::Tz;
//!
//! let ics = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:42\r\nSUMMARY:Standup\r\nDTSTART:20250101T090000Z\r\nDTEND:20250101T100000Z\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
//! let parsed = parse_feed(ics, Tz::UTC);
//! assert_eq!(parsed.events.len(), 1);
//! assert_eq!(parsed.events[0].summary, "Standup");
//! ```
//!
//! ## Modules
//!
//! - [`unfold`] — raw feed text → logical lines
//! - [`property`] — logical line → (name, params, value); block grouping
//! - [`timezone`] — document-wide fallback timezone resolution
//! - [`datetime`] — raw date-time token + timezone tiers → absolute instant
//! - [`event`] — event block → [`CalendarEvent`]
//! - [`recur`] — bounded daily/weekly RRULE expansion
//! - [`config`] — immutable per-poll engine configuration
//! - [`filter`] — busy/tentative/declined/all-day/keyword eligibility
//! - [`select`] — window restriction, governing/next selection
//! - [`schedule`] — transition planning and cadence throttling
//! - [`diag`] — bounded diagnostic text buffer
//! - [`pipeline`] — fetch → parse → select → schedule driver
//! - [`error`] — error types

pub mod config;
pub mod datetime;
pub mod diag;
pub mod error;
pub mod event;
pub mod filter;
pub mod pipeline;
pub mod property;
pub mod recur;
pub mod schedule;
pub mod select;
pub mod timezone;
pub mod unfold;

pub use config::EngineConfig;
pub use datetime::{decode_instant, DecodedInstant};
pub use diag::DiagnosticBuffer;
pub use error::{DecodeError, EngineError};
pub use event::{build_event, CalendarEvent, DroppedEvent, EventStatus, PartStat, Transparency};
pub use filter::is_eligible;
pub use pipeline::{
    format_event_line, parse_feed, run_pipeline, Clock, FeedFetch, FeedResponse, ParsedFeed,
    RunOutcome, RunStatus, SystemClock,
};
pub use schedule::{plan_transition, SchedulerState, TransitionPlan, TransitionReason};
pub use select::{select_events, ScheduledEvent, Selection};
pub use timezone::{resolve_feed_timezone, FeedTimezone, TzSource};
pub use unfold::unfold_lines;
