// src/ui/status.rs

//! Compact one-line summary of a set of tasks, e.g. `3✓ 1✗ 2⠋ 4⧖`.
//!
//! The working count animates with the same frame as the spinner lines of
//! the group it describes.

use super::glyph::Glyph;
use super::render_state::RenderState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub succeeded: usize,
    pub failed: usize,
    pub working: usize,
    pub pending: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.working + self.pending
    }
}

pub fn render(counts: StatusCounts, state: &RenderState) -> String {
    let parts = [
        segment(counts.succeeded, &Glyph::Check.render(state.color()), "green", state),
        segment(counts.failed, &Glyph::X.render(state.color()), "red", state),
        segment(counts.working, &state.spinner(), "bold", state),
        segment(counts.pending, &Glyph::Hourglass.render(state.color()), "cyan", state),
    ];
    parts.join(" ")
}

fn segment(count: usize, symbol: &str, color: &str, state: &RenderState) -> String {
    // Zero counts are dimmed so the non-zero ones stand out.
    let color = if count == 0 { "gray" } else { color };
    format!("{}{symbol}", state.format(&format!("{{{{{color}:{count}}}}}")))
}
