//! Bounded diagnostic text buffer.
//!
//! Append-only, timestamped trace lines with a character cap; oldest
//! whole lines are trimmed first once the cap is exceeded. Receives
//! fetch outcomes, parse counts, per-event drops, and every scheduling
//! decision.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct DiagnosticBuffer {
    char_cap: usize,
    lines: VecDeque<String>,
    chars: usize,
}

impl DiagnosticBuffer {
    pub fn new(char_cap: usize) -> Self {
        Self {
            char_cap,
            lines: VecDeque::new(),
            chars: 0,
        }
    }

    /// Append a timestamped line, trimming oldest lines past the cap.
    /// The newest line is always retained, even when it alone exceeds
    /// the cap.
    pub fn push(&mut self, now: DateTime<Utc>, message: &str) {
        let line = format!("{} {}", now.format("%Y-%m-%d %H:%M:%S"), message);
        self.chars += line.chars().count();
        self.lines.push_back(line);
        while self.chars > self.char_cap && self.lines.len() > 1 {
            if let Some(oldest) = self.lines.pop_front() {
                self.chars -= oldest.chars().count();
            }
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn to_text(&self) -> String {
        self.lines
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
