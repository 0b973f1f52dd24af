// src/ui/format.rs

//! Inline markup: `{{red:text}}`, `{{bold,green:text}}`, `{{v}}`.
//!
//! Tags nest. Closing a tag resets the terminal and re-applies whatever tags
//! are still open. Anything that doesn't parse as a tag is emitted verbatim.

use super::ansi::{sgr, RESET};
use super::glyph::Glyph;

enum Tag {
    Glyph(Glyph),
    Style(String),
}

/// SGR parameter for a style name, if known.
pub(crate) fn style_code(name: &str) -> Option<&'static str> {
    let code = match name {
        "reset" => "0",
        "bold" => "1",
        "italic" => "3",
        "underline" => "4",
        "black" => "30",
        "red" => "31",
        "green" => "32",
        "yellow" => "33",
        "blue" => "94",
        "magenta" => "35",
        "cyan" => "36",
        "white" => "97",
        "gray" => "90",
        "bright_green" => "92",
        "bright_red" => "91",
        _ => return None,
    };
    Some(code)
}

/// Render markup to ANSI-colored text.
pub fn format(text: &str) -> String {
    format_with(text, true)
}

/// Render markup, emitting escape codes only when `color` is set. With
/// `color` off the markup is still consumed, leaving plain text.
pub fn format_with(text: &str, color: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut open: Vec<String> = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("{{") {
            if let Some((tag, consumed)) = parse_open(after) {
                match tag {
                    Tag::Glyph(glyph) => {
                        out.push_str(&glyph.render(color));
                        if color {
                            reapply(&mut out, &open);
                        }
                    }
                    Tag::Style(params) => {
                        if color {
                            out.push_str(&sgr(&params));
                        }
                        open.push(params);
                    }
                }
                rest = &after[consumed..];
                continue;
            }
        } else if !open.is_empty() {
            if let Some(after) = rest.strip_prefix("}}") {
                open.pop();
                if color {
                    out.push_str(RESET);
                    reapply(&mut out, &open);
                }
                rest = after;
                continue;
            }
        }

        let Some(ch) = rest.chars().next() else { break };
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    if color && !open.is_empty() {
        out.push_str(RESET);
    }
    out
}

fn reapply(out: &mut String, open: &[String]) {
    for params in open {
        out.push_str(&sgr(params));
    }
}

/// Parse the text following `{{`; returns the tag and the bytes it used.
fn parse_open(after: &str) -> Option<(Tag, usize)> {
    let end = after.find([':', '}'])?;
    let name = &after[..end];
    let tail = &after[end..];

    if tail.starts_with("}}") {
        let glyph = Glyph::from_handle(name)?;
        return Some((Tag::Glyph(glyph), end + 2));
    }
    if tail.starts_with(':') {
        let codes = name
            .split(',')
            .map(|n| style_code(n.trim()))
            .collect::<Option<Vec<_>>>()?;
        return Some((Tag::Style(codes.join(";")), end + 1));
    }
    None
}
