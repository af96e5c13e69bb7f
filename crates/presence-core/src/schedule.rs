//! Transition planning and cadence throttling.
//!
//! Two independent timer paths feed the same pipeline: the regular
//! cadence (fixed interval with a floor) and the transition timer armed
//! at the next real signal boundary. The transition timer is never
//! throttled by the cadence's minimum-gap logic; its purpose is exact
//! boundary timing, not periodic refresh.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::select::Selection;

/// Targets within this many milliseconds of the previously armed one do
/// not rearm the timer, avoiding reschedule churn on every poll.
pub const RESCHEDULE_TOLERANCE_MS: i64 = 2_000;

/// Floor on a transition delay.
pub const MIN_TRANSITION_DELAY_SECS: i64 = 1;

/// Cross-run scheduler memory, persisted by the host between pipeline
/// runs. Initialized empty on driver (re)start, updated at the end of
/// every run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerState {
    pub last_poll: Option<DateTime<Utc>>,
    pub next_transition: Option<DateTime<Utc>>,
}

/// Why the transition timer is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionReason {
    /// The governing event's effective end.
    ActiveEnd,
    /// The next event's effective start.
    NextStart,
}

impl TransitionReason {
    /// Tag used on diagnostic lines.
    pub fn tag(self) -> &'static str {
        match self {
            Self::ActiveEnd => "active-end",
            Self::NextStart => "next-start",
        }
    }
}

/// The scheduling decision for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPlan {
    pub target: DateTime<Utc>,
    pub reason: TransitionReason,
    /// Time until `target`, floored at [`MIN_TRANSITION_DELAY_SECS`].
    pub delay: Duration,
    /// False when the target is within tolerance of the previously armed
    /// one and the existing timer should be left alone.
    pub rearm: bool,
}

/// Compute the next required wake time from a selection pass.
///
/// Returns `None` when there is neither a governing nor a next event, in
/// which case no transition is scheduled.
pub fn plan_transition(
    selection: &Selection,
    now: DateTime<Utc>,
    state: &SchedulerState,
) -> Option<TransitionPlan> {
    let (target, reason) = if let Some(active) = selection.governing_event() {
        (active.effective_end, TransitionReason::ActiveEnd)
    } else if let Some(next) = selection.next_event() {
        (next.effective_start, TransitionReason::NextStart)
    } else {
        return None;
    };

    let rearm = match state.next_transition {
        Some(previous) => (target - previous).num_milliseconds().abs() > RESCHEDULE_TOLERANCE_MS,
        None => true,
    };
    let delay = (target - now).max(Duration::seconds(MIN_TRANSITION_DELAY_SECS));

    Some(TransitionPlan {
        target,
        reason,
        delay,
        rearm,
    })
}

/// When the next regular-cadence run is due.
pub fn next_regular_run(
    state: &SchedulerState,
    now: DateTime<Utc>,
    interval: Duration,
) -> DateTime<Utc> {
    match state.last_poll {
        Some(last) => (last + interval).max(now),
        None => now,
    }
}

/// Back-off for a cadence-triggered run arriving before the minimum gap
/// since the last run has elapsed.
///
/// Returns the remaining wait, or `None` when the run may proceed now.
/// Transition-triggered runs must not consult this check.
pub fn cadence_backoff(
    state: &SchedulerState,
    now: DateTime<Utc>,
    min_gap: Duration,
) -> Option<Duration> {
    let last = state.last_poll?;
    let gap_end = last + min_gap;
    (now < gap_end).then(|| gap_end - now)
}
