// src/exec/cancel.rs

//! Cooperative cancellation with a protected/unprotected split.
//!
//! A [`CancelToken`] can have cancellation *requested* at any time, but the
//! request only *lands* while the token is enabled. A worker enables its
//! token exactly while user work runs and keeps it disabled while it updates
//! shared accounting, so a request arriving mid-bookkeeping is deferred until
//! the next piece of user code looks at the token.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use thiserror::Error;

/// Signal returned to work that has been cancelled. Propagate it with `?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("work was cancelled")]
pub struct Cancelled;

#[derive(Debug, Default)]
struct TokenState {
    requested: bool,
    enabled: bool,
}

#[derive(Debug, Default)]
pub struct CancelToken {
    state: Mutex<TokenState>,
    changed: Condvar,
}

impl CancelToken {
    /// A standalone token: enabled, never cancelled unless [`cancel`] is
    /// called on it.
    ///
    /// [`cancel`]: CancelToken::cancel
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TokenState {
                requested: false,
                enabled: true,
            }),
            changed: Condvar::new(),
        }
    }

    /// A token that starts in protected mode; used by workers.
    pub(crate) fn disabled() -> Self {
        Self::default()
    }

    /// Request cancellation. Wakes anyone sleeping on the token.
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        state.requested = true;
        self.changed.notify_all();
    }

    /// Whether cancellation has been requested, landed or not.
    pub fn is_cancelled(&self) -> bool {
        self.state.lock().requested
    }

    /// `Err(Cancelled)` if a cancellation request can land right now.
    pub fn check(&self) -> Result<(), Cancelled> {
        let state = self.state.lock();
        if state.requested && state.enabled {
            return Err(Cancelled);
        }
        Ok(())
    }

    /// Sleep for `duration`, returning early with `Err(Cancelled)` as soon as
    /// a cancellation request lands.
    pub fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        let deadline = Instant::now() + duration;
        let mut state = self.state.lock();
        loop {
            if state.requested && state.enabled {
                return Err(Cancelled);
            }
            if self.changed.wait_until(&mut state, deadline).timed_out() {
                return if state.requested && state.enabled {
                    Err(Cancelled)
                } else {
                    Ok(())
                };
            }
        }
    }

    /// Enter the unprotected section: pending and future requests land.
    pub(crate) fn enable(&self) {
        let mut state = self.state.lock();
        state.enabled = true;
        self.changed.notify_all();
    }

    /// Enter the protected section: requests are held back.
    pub(crate) fn disable(&self) {
        self.state.lock().enabled = false;
    }
}
