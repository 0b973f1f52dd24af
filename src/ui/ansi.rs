// src/ui/ansi.rs

//! Raw ANSI escape sequences used by the renderers.
//!
//! Movement helpers return an empty string for a zero distance, since some
//! terminals treat `ESC[0A` as a move of one line.

pub const ESC: &str = "\x1b";
pub const RESET: &str = "\x1b[0m";

/// Select Graphic Rendition with the given parameter list (e.g. `"1;31"`).
pub fn sgr(params: &str) -> String {
    format!("{ESC}[{params}m")
}

pub fn cursor_up(n: usize) -> String {
    if n == 0 {
        return String::new();
    }
    format!("{ESC}[{n}A")
}

pub fn cursor_down(n: usize) -> String {
    if n == 0 {
        return String::new();
    }
    format!("{ESC}[{n}B")
}

pub fn cursor_forward(n: usize) -> String {
    if n == 0 {
        return String::new();
    }
    format!("{ESC}[{n}C")
}

/// Clear from the cursor to the end of the current line.
pub fn clear_to_end_of_line() -> &'static str {
    "\x1b[K"
}

pub fn hide_cursor() -> &'static str {
    "\x1b[?25l"
}

pub fn show_cursor() -> &'static str {
    "\x1b[?25h"
}
