// src/ui/glyph.rs

//! Named status symbols and the spinner animation frames.

use super::ansi::{sgr, RESET};
use super::format::style_code;

/// Spinner animation, one frame per render pass.
pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Symbols addressable from markup as `{{<handle>}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    Star,
    Info,
    Question,
    Check,
    X,
    Bug,
    Chevron,
    Hourglass,
    Warning,
}

impl Glyph {
    pub const ALL: [Glyph; 9] = [
        Glyph::Star,
        Glyph::Info,
        Glyph::Question,
        Glyph::Check,
        Glyph::X,
        Glyph::Bug,
        Glyph::Chevron,
        Glyph::Hourglass,
        Glyph::Warning,
    ];

    pub fn handle(self) -> &'static str {
        match self {
            Glyph::Star => "*",
            Glyph::Info => "i",
            Glyph::Question => "?",
            Glyph::Check => "v",
            Glyph::X => "x",
            Glyph::Bug => "b",
            Glyph::Chevron => ">",
            Glyph::Hourglass => "H",
            Glyph::Warning => "!",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Glyph::Star => "⭑",
            Glyph::Info => "ℹ",
            Glyph::Question => "?",
            Glyph::Check => "✓",
            Glyph::X => "✗",
            Glyph::Bug => "🐛",
            Glyph::Chevron => "»",
            Glyph::Hourglass => "⧖",
            Glyph::Warning => "⚠",
        }
    }

    fn color_name(self) -> &'static str {
        match self {
            Glyph::Star | Glyph::Chevron | Glyph::Warning => "yellow",
            Glyph::Info | Glyph::Question => "blue",
            Glyph::Check => "green",
            Glyph::X => "red",
            Glyph::Bug => "white",
            Glyph::Hourglass => "cyan",
        }
    }

    pub fn from_handle(handle: &str) -> Option<Glyph> {
        Glyph::ALL.into_iter().find(|g| g.handle() == handle)
    }

    /// The symbol, wrapped in its color when `color` is set.
    pub fn render(self, color: bool) -> String {
        colorize(self.symbol(), self.color_name(), color)
    }
}

/// Spinner frame for a (possibly out of range) animation index.
pub fn spinner_frame(index: usize, color: bool) -> String {
    colorize(SPINNER_FRAMES[index % SPINNER_FRAMES.len()], "cyan", color)
}

fn colorize(symbol: &str, color_name: &str, color: bool) -> String {
    match style_code(color_name) {
        Some(code) if color => format!("{}{symbol}{RESET}", sgr(code)),
        _ => symbol.to_string(),
    }
}
