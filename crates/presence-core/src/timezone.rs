//! Document-wide fallback timezone resolution.
//!
//! Runs once per fetched document, before any event is built. Precedence:
//!
//! 1. `X-WR-TIMEZONE:<id>` header, if it names a real IANA zone;
//! 2. the first `TZID:<id>` inside the first `BEGIN:VTIMEZONE` block
//!    (bounded scan);
//! 3. the local (hub) timezone.
//!
//! Unresolvable identifiers fall through silently -- feeds frequently
//! carry vendor-specific or malformed zone names, and that is a fallback
//! tier, not an error.

use chrono_tz::Tz;

/// How many lines inside a `VTIMEZONE` block are scanned for a `TZID`.
const VTIMEZONE_SCAN_LIMIT: usize = 80;

/// Where the document fallback timezone came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TzSource {
    /// `X-WR-TIMEZONE` calendar header.
    CalendarHeader,
    /// `TZID` inside the first `VTIMEZONE` block.
    VTimezone,
    /// Neither hint present or resolvable; the hub's local zone applies.
    Local,
}

/// The resolved per-document fallback timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedTimezone {
    pub tz: Tz,
    pub source: TzSource,
}

impl FeedTimezone {
    /// IANA identifier for diagnostics and display.
    pub fn id(&self) -> &'static str {
        self.tz.name()
    }

    /// The document-level fallback tier for the date decoder: `None` when
    /// the document gave no usable hint and decoding should fall through
    /// to the local zone.
    pub fn fallback(&self) -> Option<Tz> {
        match self.source {
            TzSource::Local => None,
            _ => Some(self.tz),
        }
    }
}

/// Parse a timezone identifier, stripping surrounding quotes.
pub fn parse_tz(id: &str) -> Option<Tz> {
    id.trim().trim_matches('"').parse::<Tz>().ok()
}

/// Resolve the document fallback timezone from unfolded logical lines.
pub fn resolve_feed_timezone(lines: &[String], local_tz: Tz) -> FeedTimezone {
    for line in lines {
        if let Some(id) = line.strip_prefix("X-WR-TIMEZONE:") {
            if let Some(tz) = parse_tz(id) {
                return FeedTimezone {
                    tz,
                    source: TzSource::CalendarHeader,
                };
            }
        }
    }

    let mut in_block = false;
    let mut scanned = 0usize;
    for line in lines {
        if !in_block {
            in_block = line == "BEGIN:VTIMEZONE";
            continue;
        }
        if line == "END:VTIMEZONE" {
            break;
        }
        scanned += 1;
        if scanned > VTIMEZONE_SCAN_LIMIT {
            break;
        }
        if let Some(id) = line.strip_prefix("TZID:") {
            if let Some(tz) = parse_tz(id) {
                return FeedTimezone {
                    tz,
                    source: TzSource::VTimezone,
                };
            }
        }
    }

    FeedTimezone {
        tz: local_tz,
        source: TzSource::Local,
    }
}
