// src/ui/width.rs

//! Escape-code-aware text measurement.

use std::sync::LazyLock;

use regex::Regex;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Matches CSI sequences, OSC sequences (BEL or ST terminated) and the
/// remaining two-byte Fe escapes.
static ANSI_ESCAPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\x1b\[[\x30-\x3f]*[\x20-\x2f]*[\x40-\x7e]",
        r"|\x1b\].*?(?:\x07|\x1b\\)",
        r"|\x1b[\x20-\x2f]*[\x40-\x5f]",
    ))
    .expect("Invalid ANSI escape regex")
});

const ELLIPSIS: char = '…';
const DEFAULT_TERMINAL_WIDTH: usize = 80;

/// Strip all ANSI escape sequences from `text`.
pub fn strip_codes(text: &str) -> String {
    ANSI_ESCAPE_RE.replace_all(text, "").into_owned()
}

/// Number of terminal columns `text` occupies once escape codes are removed.
///
/// Wide characters count double and zero-width characters count nothing.
pub fn printing_width(text: &str) -> usize {
    UnicodeWidthStr::width(strip_codes(text).as_str())
}

/// Cut `text` down to at most `width` printing columns.
///
/// Escape sequences are kept (they take no columns) and an ellipsis takes
/// the last column when anything visible was dropped. A reset is appended
/// after truncation so styles do not bleed past the cut.
pub fn truncate(text: &str, width: usize) -> String {
    if printing_width(text) <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let budget = width - 1;
    let mut out = String::with_capacity(text.len());
    let mut used = 0;
    let mut rest = text;

    while !rest.is_empty() {
        if let Some(m) = ANSI_ESCAPE_RE.find(rest).filter(|m| m.start() == 0) {
            out.push_str(m.as_str());
            rest = &rest[m.end()..];
            continue;
        }

        let Some(ch) = rest.chars().next() else { break };
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    out.push(ELLIPSIS);
    out.push_str(super::ansi::RESET);
    out
}

/// Current terminal width in columns, or 80 when it can't be determined
/// (e.g. output is not a tty).
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(terminal_size::Width(w), _)| w as usize)
        .filter(|w| *w > 0)
        .unwrap_or(DEFAULT_TERMINAL_WIDTH)
}
