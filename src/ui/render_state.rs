// src/ui/render_state.rs

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::format::format_with;
use super::glyph::{spinner_frame, SPINNER_FRAMES};

/// Display state shared between a group's render loop and any widget that
/// wants to animate in step with it.
///
/// Cloning shares the animation frame. Only the render loop that owns the
/// state advances it; everyone else reads.
#[derive(Debug, Clone)]
pub struct RenderState {
    frame: Arc<AtomicUsize>,
    color: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new(true)
    }
}

impl RenderState {
    pub fn new(color: bool) -> Self {
        Self {
            frame: Arc::new(AtomicUsize::new(0)),
            color,
        }
    }

    pub fn color(&self) -> bool {
        self.color
    }

    pub fn frame(&self) -> usize {
        self.frame.load(Ordering::Relaxed)
    }

    pub fn set_frame(&self, index: usize) {
        self.frame
            .store(index % SPINNER_FRAMES.len(), Ordering::Relaxed);
    }

    /// Move to the next animation frame and return it.
    pub fn advance(&self) -> usize {
        let next = (self.frame() + 1) % SPINNER_FRAMES.len();
        self.frame.store(next, Ordering::Relaxed);
        next
    }

    /// The spinner symbol for the current frame.
    pub fn spinner(&self) -> String {
        spinner_frame(self.frame(), self.color)
    }

    /// Render markup honouring this state's color setting.
    pub fn format(&self, text: &str) -> String {
        format_with(text, self.color)
    }
}
