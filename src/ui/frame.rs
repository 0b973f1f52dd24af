// src/ui/frame.rs

//! Frame nesting inset.
//!
//! Output produced inside a nested frame is indented by one inset per level.
//! Depth is tracked per thread. A capture created without frame inset
//! suppresses the prefix on its thread for as long as it runs.

use std::cell::Cell;
use std::marker::PhantomData;

const INSET: &str = "┃ ";
const INSET_WIDTH: usize = 2;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
    static SUPPRESSED: Cell<bool> = const { Cell::new(false) };
}

/// Inset to prepend to each line written at the current depth.
pub fn prefix() -> String {
    if SUPPRESSED.with(Cell::get) {
        return String::new();
    }
    INSET.repeat(DEPTH.with(Cell::get))
}

/// Printing width of [`prefix`].
pub fn prefix_width() -> usize {
    if SUPPRESSED.with(Cell::get) {
        return 0;
    }
    INSET_WIDTH * DEPTH.with(Cell::get)
}

/// One level of nesting; the depth drops back when the guard is dropped.
pub struct FrameGuard {
    _not_send: PhantomData<*const ()>,
}

pub fn nest() -> FrameGuard {
    DEPTH.with(|d| d.set(d.get() + 1));
    FrameGuard {
        _not_send: PhantomData,
    }
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

/// Restores the previous suppression state when dropped.
pub struct InsetGuard {
    previous: bool,
    _not_send: PhantomData<*const ()>,
}

pub fn suppress_inset() -> InsetGuard {
    let previous = SUPPRESSED.with(|s| s.replace(true));
    InsetGuard {
        previous,
        _not_send: PhantomData,
    }
}

impl Drop for InsetGuard {
    fn drop(&mut self) {
        SUPPRESSED.with(|s| s.set(self.previous));
    }
}
