// src/exec/future.rs

//! Single-assignment result cell with blocking reads.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use thiserror::Error;

/// Why a [`Future`] holds no value.
///
/// Cloneable so that every reader of a failed future sees the same error.
#[derive(Debug, Clone, Error)]
pub enum WorkError {
    #[error("work was cancelled before it completed")]
    Cancelled,

    #[error("{0:#}")]
    Failed(Arc<anyhow::Error>),

    #[error("work panicked: {0}")]
    Panicked(String),
}

impl WorkError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkError::Cancelled)
    }
}

impl From<anyhow::Error> for WorkError {
    fn from(err: anyhow::Error) -> Self {
        WorkError::Failed(Arc::new(err))
    }
}

enum State<T> {
    Pending,
    Started,
    Completed(T),
    Failed(WorkError),
}

impl<T> State<T> {
    fn is_terminal(&self) -> bool {
        matches!(self, State::Completed(_) | State::Failed(_))
    }
}

struct Inner<T> {
    state: Mutex<State<T>>,
    resolved: Condvar,
}

/// Handle to the eventual result of a piece of work.
///
/// Cloning yields another handle to the same cell. The first terminal
/// outcome (completed or failed) sticks; later attempts are ignored.
pub struct Future<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Future<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.inner.state.lock() {
            State::Pending => "pending",
            State::Started => "started",
            State::Completed(_) => "completed",
            State::Failed(_) => "failed",
        };
        f.debug_struct("Future").field("state", &state).finish()
    }
}

impl<T> Default for Future<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Future<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::Pending),
                resolved: Condvar::new(),
            }),
        }
    }

    /// Mark that execution has begun. Ignored once started or resolved.
    pub fn start(&self) {
        let mut state = self.inner.state.lock();
        if matches!(*state, State::Pending) {
            *state = State::Started;
        }
    }

    /// Store `value` and wake all readers. Returns false (and drops `value`)
    /// if the future was already resolved.
    pub fn complete(&self, value: T) -> bool {
        self.resolve(State::Completed(value))
    }

    /// Store `error` and wake all readers. Never overwrites an earlier
    /// outcome; returns false in that case.
    pub fn fail(&self, error: WorkError) -> bool {
        self.resolve(State::Failed(error))
    }

    fn resolve(&self, outcome: State<T>) -> bool {
        let mut state = self.inner.state.lock();
        if state.is_terminal() {
            return false;
        }
        *state = outcome;
        self.inner.resolved.notify_all();
        true
    }

    /// True once completed or failed.
    pub fn is_completed(&self) -> bool {
        self.inner.state.lock().is_terminal()
    }

    /// True once execution has begun (including after resolution).
    pub fn is_started(&self) -> bool {
        !matches!(*self.inner.state.lock(), State::Pending)
    }

    pub fn is_failed(&self) -> bool {
        matches!(*self.inner.state.lock(), State::Failed(_))
    }
}

impl<T: Clone> Future<T> {
    /// Block until resolved, then return the value or the error.
    pub fn value(&self) -> Result<T, WorkError> {
        let mut state = self.inner.state.lock();
        while !state.is_terminal() {
            self.inner.resolved.wait(&mut state);
        }
        Self::outcome(&state)
    }

    /// Like [`value`](Future::value) but gives up after `timeout`.
    pub fn value_timeout(&self, timeout: Duration) -> Option<Result<T, WorkError>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.inner.state.lock();
        while !state.is_terminal() {
            if self
                .inner
                .resolved
                .wait_until(&mut state, deadline)
                .timed_out()
                && !state.is_terminal()
            {
                return None;
            }
        }
        Some(Self::outcome(&state))
    }

    /// Non-blocking read; `None` while unresolved.
    pub fn try_value(&self) -> Option<Result<T, WorkError>> {
        let state = self.inner.state.lock();
        state.is_terminal().then(|| Self::outcome(&state))
    }

    fn outcome(state: &State<T>) -> Result<T, WorkError> {
        match state {
            State::Completed(value) => Ok(value.clone()),
            State::Failed(err) => Err(err.clone()),
            State::Pending | State::Started => unreachable!("outcome read before resolution"),
        }
    }
}
