//! Date-time decoding -- raw ICS token plus resolved timezone tiers into
//! an absolute instant.
//!
//! Three encodings appear in feeds:
//!
//! - `yyyyMMddTHHmmssZ` / `yyyyMMddTHHmmZ` -- UTC, always unambiguous.
//! - `yyyyMMdd` -- an all-day date, resolved to midnight in the first
//!   available tier: explicit `TZID` parameter, document fallback zone,
//!   local zone.
//! - `yyyyMMddTHHmmss` / `yyyyMMddTHHmm` -- floating or explicit-zone
//!   local time, same three-tier fallback order.
//!
//! A `TZID` that names an unknown zone is treated as absent, not as an
//! error: it falls through to the next tier.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::DecodeError;
use crate::timezone::parse_tz;

/// A decoded absolute instant plus the facts downstream stages need: the
/// all-day marker and the zone the local time was resolved in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedInstant {
    pub instant: DateTime<Utc>,
    pub all_day: bool,
    pub zone: Tz,
}

fn parse_naive_datetime(token: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(token, "%Y%m%dT%H%M%S")
        .or_else(|_| NaiveDateTime::parse_from_str(token, "%Y%m%dT%H%M"))
        .ok()
}

/// Map a naive local time onto the timeline in `zone`.
///
/// DST handling: an ambiguous time (fall-back hour) takes the earliest
/// mapping; a nonexistent time (spring-forward gap) retries one hour
/// later.
fn resolve_local(naive: NaiveDateTime, zone: Tz) -> Option<DateTime<Utc>> {
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => zone
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

/// Decode a raw date-time token into an absolute instant.
///
/// `tzid` is the per-property `TZID` parameter, `feed_tz` the document
/// fallback (already `None` when the document gave no usable hint), and
/// `local_tz` the innermost tier.
///
/// # Errors
///
/// Returns [`DecodeError::Unrecognized`] when the token matches none of
/// the accepted formats, and [`DecodeError::InvalidLocalTime`] when the
/// local time cannot be mapped in the resolved zone.
pub fn decode_instant(
    raw: &str,
    tzid: Option<&str>,
    feed_tz: Option<Tz>,
    local_tz: Tz,
) -> Result<DecodedInstant, DecodeError> {
    let value = raw.trim();

    // UTC path: ignores all fallback tiers.
    if let Some(body) = value.strip_suffix('Z') {
        if body.contains('T') {
            let naive = parse_naive_datetime(body)
                .ok_or_else(|| DecodeError::Unrecognized(value.to_string()))?;
            return Ok(DecodedInstant {
                instant: naive.and_utc(),
                all_day: false,
                zone: Tz::UTC,
            });
        }
    }

    let zone = tzid
        .and_then(parse_tz)
        .or(feed_tz)
        .unwrap_or(local_tz);

    // All-day: an 8-digit date with no time component.
    if value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()) {
        let date = NaiveDate::parse_from_str(value, "%Y%m%d")
            .map_err(|_| DecodeError::Unrecognized(value.to_string()))?;
        let naive = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| DecodeError::Unrecognized(value.to_string()))?;
        let instant = resolve_local(naive, zone)
            .ok_or_else(|| DecodeError::InvalidLocalTime(value.to_string()))?;
        return Ok(DecodedInstant {
            instant,
            all_day: true,
            zone,
        });
    }

    // Floating or explicit-zone local time.
    let naive =
        parse_naive_datetime(value).ok_or_else(|| DecodeError::Unrecognized(value.to_string()))?;
    let instant =
        resolve_local(naive, zone).ok_or_else(|| DecodeError::InvalidLocalTime(value.to_string()))?;
    Ok(DecodedInstant {
        instant,
        all_day: false,
        zone,
    })
}
