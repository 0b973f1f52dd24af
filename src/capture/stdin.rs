// src/capture/stdin.rs

//! Reference-counted standard input masking.
//!
//! While at least one capture has asked for it, reads through [`stdin`]
//! see end-of-file. The real stream comes back when the last mask is dropped.

use std::io::{self, BufRead, Read};
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

static ACTIVE_MASKS: AtomicUsize = AtomicUsize::new(0);

/// One outstanding request to mask stdin; released on drop.
#[derive(Debug)]
pub(crate) struct StdinMask {
    _private: (),
}

impl StdinMask {
    pub(crate) fn engage() -> Self {
        if ACTIVE_MASKS.fetch_add(1, Ordering::AcqRel) == 0 {
            debug!("masking stdin for background captures");
        }
        Self { _private: () }
    }
}

impl Drop for StdinMask {
    fn drop(&mut self) {
        if ACTIVE_MASKS.fetch_sub(1, Ordering::AcqRel) == 1 {
            debug!("last stdin mask released; restoring stdin");
        }
    }
}

/// Whether any live capture currently masks stdin.
pub fn stdin_masked() -> bool {
    ACTIVE_MASKS.load(Ordering::Acquire) > 0
}

/// Mask-aware standard input handle.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stdin;

pub fn stdin() -> Stdin {
    Stdin
}

impl Stdin {
    /// Like [`io::Stdin::read_line`], returning `Ok(0)` while masked.
    pub fn read_line(&self, buf: &mut String) -> io::Result<usize> {
        if stdin_masked() {
            return Ok(0);
        }
        io::stdin().lock().read_line(buf)
    }
}

impl Read for Stdin {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if stdin_masked() {
            return Ok(0);
        }
        io::stdin().read(buf)
    }
}
