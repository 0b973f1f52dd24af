// src/ui/mod.rs

//! Terminal presentation helpers.
//!
//! These are pure functions (or thread-local lookups) consumed by the task
//! renderer: markup formatting, printing widths, glyphs, the frame inset and
//! the [`RenderState`] that carries the shared animation frame.

pub mod ansi;
pub mod format;
pub mod frame;
pub mod glyph;
pub mod render_state;
pub mod status;
pub mod width;

pub use format::{format, format_with};
pub use glyph::Glyph;
pub use render_state::RenderState;
pub use status::StatusCounts;
pub use width::{printing_width, strip_codes, terminal_width, truncate};
