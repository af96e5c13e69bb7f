//! The pipeline driver: fetch -> parse -> select -> schedule.
//!
//! Collaborators enter through narrow traits ([`FeedFetch`], [`Clock`])
//! so the engine stays testable without a network or a wall clock. Each
//! run executes to completion; [`SchedulerState`] and the diagnostic
//! buffer are updated at the end of the run, never partially.
//!
//! Failed runs never touch the busy/free signal: the outcome carries
//! `signal: None` and the host preserves the last-known value. The one
//! exception is the unconfigured state (no URL), which forces the signal
//! off.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use std::time::Duration as StdDuration;

use crate::config::EngineConfig;
use crate::diag::DiagnosticBuffer;
use crate::error::EngineError;
use crate::event::{build_event, CalendarEvent, DroppedEvent};
use crate::property::scan_event_blocks;
use crate::recur::expand_recurrences;
use crate::schedule::{plan_transition, SchedulerState, TransitionPlan};
use crate::select::{select_events, ScheduledEvent};
use crate::timezone::{resolve_feed_timezone, FeedTimezone};
use crate::unfold::unfold_lines;

/// What the fetch collaborator returns on a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedResponse {
    pub status: u16,
    pub body: String,
}

/// Feed fetching, supplied by the host.
pub trait FeedFetch {
    /// Fetch the feed. A timeout or connection failure maps to
    /// [`EngineError::Transport`].
    fn fetch(&self, url: &str, timeout: StdDuration) -> Result<FeedResponse, EngineError>;
}

/// Clock and host-location timezone, supplied by the host.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
    /// The innermost fallback tier everywhere a timezone is needed.
    fn local_tz(&self) -> Tz;
}

/// Wall-clock [`Clock`] with a configured local zone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    local_tz: Tz,
}

impl SystemClock {
    pub fn new(local_tz: Tz) -> Self {
        Self { local_tz }
    }

    /// Local zone from the `TZ` environment variable, defaulting to UTC.
    pub fn from_env() -> Self {
        let local_tz = std::env::var("TZ")
            .ok()
            .and_then(|id| id.parse::<Tz>().ok())
            .unwrap_or(Tz::UTC);
        Self { local_tz }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_tz(&self) -> Tz {
        self.local_tz
    }
}

/// One parsed document: resolved fallback timezone, built events, and
/// per-event drops.
#[derive(Debug, Clone)]
pub struct ParsedFeed {
    pub feed_tz: FeedTimezone,
    pub events: Vec<CalendarEvent>,
    pub dropped: Vec<DroppedEvent>,
    pub block_count: usize,
}

/// Parse a full ICS document into typed events.
///
/// The document fallback timezone is resolved once, before any event is
/// built, and threaded into every date decode.
pub fn parse_feed(text: &str, local_tz: Tz) -> ParsedFeed {
    let lines = unfold_lines(text);
    let feed_tz = resolve_feed_timezone(&lines, local_tz);
    let blocks = scan_event_blocks(&lines);
    let block_count = blocks.len();

    let mut events = Vec::new();
    let mut dropped = Vec::new();
    for block in blocks {
        match build_event(block, feed_tz.fallback(), local_tz) {
            Ok(event) => events.push(event),
            Err(drop) => dropped.push(drop),
        }
    }

    ParsedFeed {
        feed_tz,
        events,
        dropped,
        block_count,
    }
}

/// Terminal status of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Ok,
    Failed(EngineError),
}

/// Everything the actuator/display sink receives per run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub status: RunStatus,
    /// `Some(true/false)` only when this run is allowed to change the
    /// externally observed signal; `None` preserves the last-known value.
    pub signal: Option<bool>,
    pub governing_line: Option<String>,
    pub next_line: Option<String>,
    pub upcoming: Vec<String>,
    pub feed_tz_id: Option<String>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub plan: Option<TransitionPlan>,
}

fn failed_outcome(error: EngineError) -> RunOutcome {
    RunOutcome {
        status: RunStatus::Failed(error),
        signal: None,
        governing_line: None,
        next_line: None,
        upcoming: Vec::new(),
        feed_tz_id: None,
        fetched_at: None,
        plan: None,
    }
}

fn validate_feed(response: &FeedResponse) -> Result<(), String> {
    if !(200..300).contains(&response.status) {
        return Err(format!("HTTP status {}", response.status));
    }
    if response.body.trim().is_empty() {
        return Err("empty body".to_string());
    }
    if !response.body.contains("BEGIN:VCALENDAR") && !response.body.contains("BEGIN:VEVENT") {
        return Err("missing calendar and event markers".to_string());
    }
    Ok(())
}

/// Render one event for the display sink, in the feed timezone.
pub fn format_event_line(item: &ScheduledEvent, tz: Tz, show_location: bool) -> String {
    let start = item.effective_start.with_timezone(&tz);
    let end = item.effective_end.with_timezone(&tz);
    let summary = if item.event.summary.is_empty() {
        "(untitled)"
    } else {
        item.event.summary.as_str()
    };

    let mut line = if item.event.is_all_day {
        format!("{} all day: {}", start.format("%a %d %b"), summary)
    } else if start.date_naive() == end.date_naive() {
        format!(
            "{} {}-{} {}",
            start.format("%a %d %b"),
            start.format("%H:%M"),
            end.format("%H:%M"),
            summary
        )
    } else {
        format!(
            "{} {} - {} {} {}",
            start.format("%a %d %b"),
            start.format("%H:%M"),
            end.format("%a %d %b"),
            end.format("%H:%M"),
            summary
        )
    };
    if show_location && !item.event.location.is_empty() {
        line.push_str(" @ ");
        line.push_str(&item.event.location);
    }
    line
}

/// Execute one full pipeline run.
///
/// `state` is the host-persisted scheduler memory; it is read to detect
/// an unchanged transition target and updated at the end of the run.
pub fn run_pipeline<F, C>(
    fetch: &F,
    clock: &C,
    cfg: &EngineConfig,
    state: &mut SchedulerState,
    diag: &mut DiagnosticBuffer,
) -> RunOutcome
where
    F: FeedFetch + ?Sized,
    C: Clock + ?Sized,
{
    let now = clock.now();

    if cfg.url.trim().is_empty() {
        diag.push(now, "no calendar URL configured; signal forced off");
        state.last_poll = Some(now);
        state.next_transition = None;
        let mut outcome = failed_outcome(EngineError::MissingUrl);
        outcome.signal = Some(false);
        return outcome;
    }

    let response = match fetch.fetch(&cfg.url, cfg.fetch_timeout()) {
        Ok(response) => response,
        Err(error) => {
            diag.push(now, &format!("fetch failed: {error}"));
            state.last_poll = Some(now);
            return failed_outcome(error);
        }
    };

    if let Err(reason) = validate_feed(&response) {
        diag.push(now, &format!("invalid feed: {reason}"));
        state.last_poll = Some(now);
        return failed_outcome(EngineError::InvalidFeed(reason));
    }

    let local_tz = clock.local_tz();
    let parsed = parse_feed(&response.body, local_tz);
    for drop in &parsed.dropped {
        diag.push(
            now,
            &format!(
                "dropped event uid={:?} summary={:?}: {} (value={:?}, tzid={:?})",
                drop.uid, drop.summary, drop.reason, drop.raw_value, drop.tzid
            ),
        );
    }
    diag.push(
        now,
        &format!(
            "fetch ok: {} events from {} blocks ({} dropped), feed tz {}",
            parsed.events.len(),
            parsed.block_count,
            parsed.dropped.len(),
            parsed.feed_tz.id()
        ),
    );

    let window_start = now - Duration::hours(cfg.include_past_hours);
    let window_end = now + Duration::days(cfg.horizon_days);
    let (events, notes) = expand_recurrences(parsed.events, window_start, window_end);
    for note in &notes {
        diag.push(now, note);
    }

    let selection = select_events(&events, now, cfg);
    let plan = plan_transition(&selection, now, state);
    match &plan {
        Some(p) => diag.push(
            now,
            &format!(
                "transition target {} ({}) in {}s{}",
                p.target.format("%Y-%m-%d %H:%M:%S"),
                p.reason.tag(),
                p.delay.num_seconds(),
                if p.rearm { "" } else { " [unchanged]" }
            ),
        ),
        None => diag.push(now, "no upcoming transition"),
    }

    // State update is the final step; a host reading between runs always
    // sees a consistent snapshot.
    state.last_poll = Some(now);
    match &plan {
        Some(p) if p.rearm => state.next_transition = Some(p.target),
        Some(_) => {}
        None => state.next_transition = None,
    }

    let tz = parsed.feed_tz.tz;
    let show_location = cfg.next_list_show_location;
    let governing_line = selection
        .governing_event()
        .map(|s| format_event_line(s, tz, show_location));
    let next_line = selection
        .next_event()
        .map(|s| format_event_line(s, tz, show_location));
    let upcoming = selection
        .upcoming(now, cfg.next_list_size)
        .into_iter()
        .map(|s| format_event_line(s, tz, show_location))
        .collect();

    RunOutcome {
        status: RunStatus::Ok,
        signal: Some(selection.signal),
        governing_line,
        next_line,
        upcoming,
        feed_tz_id: Some(parsed.feed_tz.id().to_string()),
        fetched_at: Some(now),
        plan,
    }
}
