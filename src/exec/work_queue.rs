// src/exec/work_queue.rs

//! Bounded-concurrency work queue.
//!
//! Work is accepted without limit and executed by at most `max_concurrent`
//! worker threads, which are spawned lazily as work arrives. Each item yields
//! a [`Future`].
//!
//! Worker iteration:
//! 1. Under the queue lock, wait until fewer than `max_concurrent` slots are
//!    taken, then take one.
//! 2. Pop the next item (waiting if the queue is empty), release the lock and
//!    run the item with the worker's [`CancelToken`] enabled.
//!
//! All accounting happens with the token disabled, so an interrupt can only
//! land while user work is running.

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::anyhow;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

use crate::errors::{Result, SpinError};

use super::cancel::CancelToken;
use super::future::{Future, WorkError};

/// Type-erased queued item.
trait Job: Send {
    fn start(&self);

    /// Execute the work and resolve its future. Returns true if cancellation
    /// was requested while it ran.
    fn run(self: Box<Self>, token: &CancelToken) -> bool;

    /// Resolve the future without running the work.
    fn abort(self: Box<Self>, error: WorkError);
}

struct Work<T, F> {
    future: Future<T>,
    work: F,
}

impl<T, F> Job for Work<T, F>
where
    T: Send + 'static,
    F: FnOnce(&CancelToken) -> anyhow::Result<T> + Send + 'static,
{
    fn start(&self) {
        self.future.start();
    }

    fn run(self: Box<Self>, token: &CancelToken) -> bool {
        let Work { future, work } = *self;
        let result = panic::catch_unwind(AssertUnwindSafe(|| work(token)));

        if token.is_cancelled() {
            future.fail(WorkError::Cancelled);
            return true;
        }

        match result {
            Ok(Ok(value)) => {
                future.complete(value);
            }
            Ok(Err(err)) => {
                future.fail(WorkError::from(err));
            }
            Err(payload) => {
                future.fail(WorkError::Panicked(panic_message(payload.as_ref())));
            }
        }
        false
    }

    fn abort(self: Box<Self>, error: WorkError) {
        self.future.fail(error);
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[derive(Default)]
struct QueueState {
    queue: VecDeque<Box<dyn Job>>,
    /// Slots currently taken by workers (step 1 above).
    running: usize,
    closed: bool,
    interrupted: bool,
    /// Live workers and their tokens.
    workers: HashMap<usize, Arc<CancelToken>>,
    handles: Vec<JoinHandle<()>>,
    next_worker_id: usize,
}

struct Shared {
    max_concurrent: usize,
    state: Mutex<QueueState>,
    below_limit: Condvar,
    work_available: Condvar,
}

/// A queue plus a lazily grown pool of at most `max_concurrent` workers.
///
/// Dropping the queue closes it: queued work still runs, but nobody waits
/// for it.
pub struct WorkQueue {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for WorkQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("WorkQueue")
            .field("max_concurrent", &self.shared.max_concurrent)
            .field("queued", &state.queue.len())
            .field("running", &state.running)
            .field("workers", &state.workers.len())
            .field("closed", &state.closed)
            .field("interrupted", &state.interrupted)
            .finish()
    }
}

impl WorkQueue {
    /// Create a queue running at most `max_concurrent` items at once.
    ///
    /// Zero is rejected with [`SpinError::InvalidArgument`].
    pub fn new(max_concurrent: usize) -> Result<Self> {
        if max_concurrent == 0 {
            return Err(SpinError::InvalidArgument(
                "work queue max_concurrent must be >= 1 (got 0)".to_string(),
            ));
        }
        Ok(Self {
            shared: Arc::new(Shared {
                max_concurrent,
                state: Mutex::new(QueueState::default()),
                below_limit: Condvar::new(),
                work_available: Condvar::new(),
            }),
        })
    }

    pub fn max_concurrent(&self) -> usize {
        self.shared.max_concurrent
    }

    /// Queue `work` and return a pending future for its result.
    ///
    /// Never blocks. Spawns a worker if fewer than `max_concurrent` exist.
    /// Once the queue has been closed or interrupted, the returned future is
    /// already failed with [`WorkError::Cancelled`].
    pub fn enqueue<T, F>(&self, work: F) -> Future<T>
    where
        T: Send + 'static,
        F: FnOnce(&CancelToken) -> anyhow::Result<T> + Send + 'static,
    {
        let future = Future::new();
        let job: Box<dyn Job> = Box::new(Work {
            future: future.clone(),
            work,
        });

        let mut state = self.shared.state.lock();
        if state.closed || state.interrupted {
            drop(state);
            warn!("work enqueued after close or interrupt; failing it without running");
            job.abort(WorkError::Cancelled);
            return future;
        }

        state.queue.push_back(job);
        if state.workers.len() < self.shared.max_concurrent {
            self.spawn_worker(&mut state);
        }
        self.shared.work_available.notify_one();
        future
    }

    fn spawn_worker(&self, state: &mut QueueState) {
        let id = state.next_worker_id;
        state.next_worker_id += 1;

        let token = Arc::new(CancelToken::disabled());
        let shared = Arc::clone(&self.shared);
        let worker_token = Arc::clone(&token);

        let spawned = thread::Builder::new()
            .name(format!("work-queue-{id}"))
            .spawn(move || worker_loop(shared, id, worker_token));

        match spawned {
            Ok(handle) => {
                state.workers.insert(id, token);
                state.handles.push(handle);
                debug!(worker = id, workers = state.workers.len(), "spawned work queue worker");
            }
            Err(err) => {
                error!(error = %err, "failed to spawn work queue worker");
                if state.workers.is_empty() {
                    // Nobody would ever pick the item up.
                    if let Some(job) = state.queue.pop_back() {
                        job.abort(WorkError::from(anyhow!("spawning worker thread: {err}")));
                    }
                }
            }
        }
    }

    /// Signal that no more work is coming. Workers exit once the queue is
    /// drained. Does not block.
    pub fn close(&self) {
        let mut state = self.shared.state.lock();
        if !state.closed {
            state.closed = true;
            self.shared.work_available.notify_all();
            debug!(queued = state.queue.len(), "work queue closed");
        }
    }

    /// Close the queue and block until every worker has drained it and
    /// exited. A second call returns immediately.
    ///
    /// Must not be called from inside queued work.
    pub fn wait(&self) {
        self.close();
        let handles = std::mem::take(&mut self.shared.state.lock().handles);
        for handle in handles {
            if handle.join().is_err() {
                warn!("work queue worker exited by panic");
            }
        }
    }

    /// Fail all queued work with [`WorkError::Cancelled`] without running
    /// it, and cancel every worker, including ones inside user work.
    ///
    /// Terminal: the queue accepts no further work afterwards.
    pub fn interrupt(&self) {
        let (dropped, tokens) = {
            let mut state = self.shared.state.lock();
            state.interrupted = true;
            let dropped: Vec<Box<dyn Job>> = state.queue.drain(..).collect();
            let tokens: Vec<Arc<CancelToken>> = state.workers.values().cloned().collect();
            self.shared.below_limit.notify_all();
            self.shared.work_available.notify_all();
            (dropped, tokens)
        };

        info!(
            queued = dropped.len(),
            workers = tokens.len(),
            "interrupting work queue"
        );

        for job in dropped {
            job.abort(WorkError::Cancelled);
        }
        for token in tokens {
            token.cancel();
        }
    }

    pub fn is_interrupted(&self) -> bool {
        self.shared.state.lock().interrupted
    }

    /// Number of live worker threads.
    pub fn worker_count(&self) -> usize {
        self.shared.state.lock().workers.len()
    }

    /// Number of slots currently held by workers.
    pub fn running_count(&self) -> usize {
        self.shared.state.lock().running
    }

    /// Number of items waiting for a worker.
    pub fn queued_count(&self) -> usize {
        self.shared.state.lock().queue.len()
    }
}

impl Drop for WorkQueue {
    fn drop(&mut self) {
        self.close();
    }
}

fn worker_loop(shared: Arc<Shared>, id: usize, token: Arc<CancelToken>) {
    debug!(worker = id, "worker started");

    while let Some(job) = next_job(&shared, id) {
        job.start();
        token.enable();
        let cancelled = job.run(&token);
        token.disable();

        let mut state = shared.state.lock();
        state.running -= 1;
        shared.below_limit.notify_one();
        if cancelled {
            state.workers.remove(&id);
            drop(state);
            debug!(worker = id, "worker cancelled during work; exiting");
            return;
        }
    }

    debug!(worker = id, "worker finished");
}

/// Take a slot and the next item. Returns `None` when the worker should
/// exit, after removing it from the worker set.
fn next_job(shared: &Shared, id: usize) -> Option<Box<dyn Job>> {
    let mut state = shared.state.lock();

    while state.running >= shared.max_concurrent && !state.interrupted {
        shared.below_limit.wait(&mut state);
    }
    if state.interrupted {
        state.workers.remove(&id);
        return None;
    }
    state.running += 1;

    loop {
        if state.interrupted {
            break;
        }
        if let Some(job) = state.queue.pop_front() {
            return Some(job);
        }
        if state.closed {
            break;
        }
        shared.work_available.wait(&mut state);
    }

    state.running -= 1;
    state.workers.remove(&id);
    shared.below_limit.notify_one();
    None
}
