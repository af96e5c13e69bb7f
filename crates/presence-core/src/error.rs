//! Error types for the presence engine.

use thiserror::Error;

/// Terminal outcomes for a single pipeline run.
///
/// All variants are recovered locally: the run aborts without touching the
/// externally observed busy/free signal (except `MissingUrl`, which forces
/// it off) and the host retries on the next cadence tick.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// No calendar URL configured. The signal is forced off.
    #[error("no calendar URL configured")]
    MissingUrl,

    /// Timeout or connection failure while fetching the feed.
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-2xx status, empty body, or a body missing both the document
    /// marker and at least one event marker.
    #[error("invalid feed: {0}")]
    InvalidFeed(String),
}

/// Per-value failure from the date-time decoder.
///
/// An undecodable start drops only that event; parsing continues for the
/// rest of the document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The raw token matched none of the accepted formats.
    #[error("unrecognized date-time value '{0}'")]
    Unrecognized(String),

    /// The local time could not be mapped onto the timeline in the
    /// resolved zone.
    #[error("no valid local mapping for '{0}'")]
    InvalidLocalTime(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
