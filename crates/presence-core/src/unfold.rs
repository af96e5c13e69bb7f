//! Line unfolding -- normalizes raw feed text into one logical line per
//! property.
//!
//! ICS folds long properties across physical lines: a physical line that
//! begins with a space or tab continues the previous logical line
//! (RFC 5545 Section 3.1). Feeds in the wild also mix `\r\n`, bare `\r`,
//! and bare `\n` line endings, and routinely exceed the nominal
//! 75-character fold width, so no length limit is enforced here.

/// Unfold raw feed text into trimmed, non-empty logical lines.
pub fn unfold_lines(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut logical: Vec<String> = Vec::new();
    for physical in normalized.split('\n') {
        if let Some(rest) = physical.strip_prefix([' ', '\t']) {
            // Continuation: strip the single leading whitespace character
            // and append to the previous logical line.
            if let Some(last) = logical.last_mut() {
                last.push_str(rest);
                continue;
            }
        }
        logical.push(physical.to_string());
    }

    logical
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}
