//! Property tokenizing and event block grouping.
//!
//! A logical ICS line has the shape `NAME;PARAM=VALUE;FLAG:value`. The
//! tokenizer splits at the first unescaped colon, then breaks the left
//! side into a property name and `;`-delimited parameters. Malformed
//! lines (no colon, empty name) are ignored rather than failing the
//! document.
//!
//! Block grouping recognizes `BEGIN:VEVENT`/`END:VEVENT` as exact
//! full-line matches and accumulates the known properties of each event
//! into a closed [`EventBlock`] struct; unknown properties are silently
//! skipped. `ATTENDEE` lines repeat, so they collect into an ordered list
//! instead of the single-valued fields.

/// One tokenized property line: name, parameters, value.
///
/// A bare parameter segment with no `=` is recorded as a boolean flag
/// with the value `"TRUE"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProperty {
    pub name: String,
    pub params: Vec<(String, String)>,
    pub value: String,
}

impl RawProperty {
    /// Case-insensitive parameter lookup.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Find the first occurrence of `target` not preceded by a backslash.
fn find_unescaped(line: &str, target: char) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if c == target && !escaped {
            return Some(i);
        }
        escaped = c == '\\' && !escaped;
    }
    None
}

/// Tokenize one logical line into a [`RawProperty`].
///
/// Returns `None` for lines with no colon or an empty left-hand side;
/// these are malformed but non-fatal.
pub fn tokenize_line(line: &str) -> Option<RawProperty> {
    let colon = find_unescaped(line, ':')?;
    let (left, value) = (&line[..colon], &line[colon + 1..]);
    if left.is_empty() {
        return None;
    }

    let mut segments = left.split(';');
    let name = segments.next()?.trim().to_ascii_uppercase();
    if name.is_empty() {
        return None;
    }

    let mut params = Vec::new();
    for segment in segments {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        match segment.split_once('=') {
            Some((key, val)) => {
                params.push((key.trim().to_ascii_uppercase(), val.trim().to_string()));
            }
            None => params.push((segment.to_ascii_uppercase(), "TRUE".to_string())),
        }
    }

    Some(RawProperty {
        name,
        params,
        value: value.to_string(),
    })
}

/// The accumulated properties of one `BEGIN:VEVENT`..`END:VEVENT` block.
///
/// A closed struct with named optional fields: unknown properties are
/// rejected silently during the scan rather than carried around in a
/// dynamic map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventBlock {
    pub uid: Option<String>,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub transparency: Option<String>,
    pub dtstart: Option<RawProperty>,
    pub dtend: Option<RawProperty>,
    pub rrule: Option<String>,
    pub attendees: Vec<RawProperty>,
}

/// Group unfolded logical lines into per-event blocks.
///
/// Lines outside `BEGIN:VEVENT`..`END:VEVENT` (including everything
/// inside `VTIMEZONE` sub-components) do not reach the blocks; the
/// timezone resolver scans those separately.
pub fn scan_event_blocks(lines: &[String]) -> Vec<EventBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<EventBlock> = None;

    for line in lines {
        match line.as_str() {
            "BEGIN:VEVENT" => current = Some(EventBlock::default()),
            "END:VEVENT" => {
                if let Some(block) = current.take() {
                    blocks.push(block);
                }
            }
            "BEGIN:VTIMEZONE" | "END:VTIMEZONE" => {}
            _ => {
                let Some(block) = current.as_mut() else {
                    continue;
                };
                let Some(prop) = tokenize_line(line) else {
                    continue;
                };
                match prop.name.as_str() {
                    "UID" => block.uid = Some(prop.value),
                    "SUMMARY" => block.summary = Some(prop.value),
                    "LOCATION" => block.location = Some(prop.value),
                    "STATUS" => block.status = Some(prop.value),
                    "TRANSP" => block.transparency = Some(prop.value),
                    "DTSTART" => block.dtstart = Some(prop),
                    "DTEND" => block.dtend = Some(prop),
                    "RRULE" => block.rrule = Some(prop.value),
                    "ATTENDEE" => block.attendees.push(prop),
                    _ => {}
                }
            }
        }
    }

    blocks
}
