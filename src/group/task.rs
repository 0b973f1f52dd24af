// src/group/task.rs

//! One titled unit of work inside a [`SpinGroup`](super::SpinGroup).
//!
//! A task runs its closure under a [`Capture`] either on a dedicated thread
//! or as an item of a [`WorkQueue`]. The group discovers completion by
//! polling [`Task::check`]; nothing is pushed to it.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::anyhow;
use parking_lot::Mutex;
use tracing::{debug, error};

use crate::capture::{Capture, CaptureOptions};
use crate::exec::{panic_message, CancelToken, Cancelled, Future, WorkError, WorkQueue};
use crate::ui::ansi::{clear_to_end_of_line, cursor_forward, RESET};
use crate::ui::{frame, printing_width, truncate, Glyph, RenderState};

use super::debrief::TaskReport;

/// What a task's closure reports when it returns normally.
///
/// `Failed` marks the task as failed without an error object; use `Err(..)`
/// when there is something worth a backtrace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed,
}

pub type TaskResult = anyhow::Result<TaskOutcome>;

/// Why a task failed, when it failed with more than the `Failed` sentinel.
#[derive(Debug)]
pub enum TaskError {
    /// The closure returned `Err`.
    Error(anyhow::Error),
    /// The closure panicked.
    Panic(String),
    /// The task's work queue was interrupted before or while it ran.
    Cancelled,
}

impl TaskError {
    pub fn kind(&self) -> &'static str {
        match self {
            TaskError::Error(_) => "Error",
            TaskError::Panic(_) => "Panic",
            TaskError::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::Error(err) => write!(f, "{err:#}"),
            TaskError::Panic(msg) => write!(f, "panicked: {msg}"),
            TaskError::Cancelled => f.write_str("cancelled before it finished"),
        }
    }
}

/// Final, immutable state of a task that has finished.
#[derive(Debug)]
pub struct Finished {
    pub success: bool,
    pub error: Option<TaskError>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

#[derive(Debug)]
struct TitleState {
    title: String,
    /// Set once the title has been changed; every later render is full.
    always_full_render: bool,
}

/// Passed to a task's closure while it runs.
pub struct TaskHandle<'a> {
    title: Arc<Mutex<TitleState>>,
    token: &'a CancelToken,
}

impl TaskHandle<'_> {
    /// Replace the title shown on this task's line from the next render on.
    pub fn update_title(&self, title: impl Into<String>) {
        let mut state = self.title.lock();
        state.title = title.into();
        state.always_full_render = true;
    }

    pub fn title(&self) -> String {
        self.title.lock().title.clone()
    }

    /// Token that is cancelled when the group's work queue is interrupted.
    /// Tasks on dedicated threads get a token that is never cancelled.
    pub fn cancel_token(&self) -> &CancelToken {
        self.token
    }

    /// Shorthand for `cancel_token().check()`.
    pub fn check_cancelled(&self) -> Result<(), Cancelled> {
        self.token.check()
    }
}

pub(crate) type BoxedWork = Box<dyn FnOnce(&TaskHandle<'_>) -> TaskResult + Send>;

struct RunOutput {
    result: thread::Result<TaskResult>,
    elapsed: Duration,
}

enum Backing {
    Thread(Option<JoinHandle<RunOutput>>),
    Queued {
        future: Future<()>,
        slot: Arc<Mutex<Option<RunOutput>>>,
    },
}

struct TaskInner {
    backing: Backing,
    finished: Option<Arc<Finished>>,
}

pub struct Task {
    title: Arc<Mutex<TitleState>>,
    capture: Capture,
    inner: Mutex<TaskInner>,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("title", &self.title())
            .field("done", &self.is_done())
            .finish_non_exhaustive()
    }
}

fn execute(
    work: BoxedWork,
    title: Arc<Mutex<TitleState>>,
    capture: &Capture,
    token: &CancelToken,
) -> RunOutput {
    let started = Instant::now();
    let handle = TaskHandle { title, token };
    let result = capture.run(|| panic::catch_unwind(AssertUnwindSafe(|| work(&handle))));
    RunOutput {
        result,
        elapsed: started.elapsed(),
    }
}

impl Task {
    fn with_backing(title: Arc<Mutex<TitleState>>, capture: Capture, backing: Backing) -> Self {
        Self {
            title,
            capture,
            inner: Mutex::new(TaskInner {
                backing,
                finished: None,
            }),
        }
    }

    fn new_title(title: String) -> Arc<Mutex<TitleState>> {
        Arc::new(Mutex::new(TitleState {
            title,
            always_full_render: false,
        }))
    }

    /// Start `work` on a dedicated thread right away.
    pub(crate) fn spawn(index: usize, title: String, work: BoxedWork, options: CaptureOptions) -> Self {
        let title = Self::new_title(title);
        let capture = Capture::new(options);

        let thread_title = Arc::clone(&title);
        let thread_capture = capture.clone();
        let spawned = thread::Builder::new()
            .name(format!("task-{index}"))
            .spawn(move || {
                let token = CancelToken::new();
                execute(work, thread_title, &thread_capture, &token)
            });

        match spawned {
            Ok(handle) => Self::with_backing(title, capture, Backing::Thread(Some(handle))),
            Err(err) => {
                error!(task = index, error = %err, "failed to spawn task thread");
                let task = Self::with_backing(title, capture, Backing::Thread(None));
                task.inner.lock().finished = Some(Arc::new(Finished {
                    success: false,
                    error: Some(TaskError::Error(
                        anyhow::Error::new(err).context("spawning task thread"),
                    )),
                    stdout: String::new(),
                    stderr: String::new(),
                    elapsed: Duration::ZERO,
                }));
                task
            }
        }
    }

    /// Queue `work` on `queue`; it starts when a worker picks it up.
    pub(crate) fn enqueue(title: String, work: BoxedWork, options: CaptureOptions, queue: &WorkQueue) -> Self {
        let title = Self::new_title(title);
        let capture = Capture::new(options);
        let slot = Arc::new(Mutex::new(None));

        let job_title = Arc::clone(&title);
        let job_capture = capture.clone();
        let job_slot = Arc::clone(&slot);
        let future = queue.enqueue(move |token| {
            let output = execute(work, job_title, &job_capture, token);
            *job_slot.lock() = Some(output);
            Ok(())
        });

        Self::with_backing(title, capture, Backing::Queued { future, slot })
    }

    pub fn title(&self) -> String {
        self.title.lock().title.clone()
    }

    /// Whether the work has begun executing. Queued tasks report false until
    /// a worker picks them up.
    pub fn is_started(&self) -> bool {
        match &self.inner.lock().backing {
            Backing::Thread(_) => true,
            Backing::Queued { future, .. } => future.is_started(),
        }
    }

    /// Last known completion state, without polling.
    pub fn is_done(&self) -> bool {
        self.inner.lock().finished.is_some()
    }

    pub fn finished(&self) -> Option<Arc<Finished>> {
        self.inner.lock().finished.clone()
    }

    /// True only for a finished, successful task.
    pub fn succeeded(&self) -> bool {
        self.finished().is_some_and(|f| f.success)
    }

    /// Captured stdout: final once done, partial while running.
    pub fn stdout(&self) -> String {
        match self.finished() {
            Some(f) => f.stdout.clone(),
            None => self.capture.stdout(),
        }
    }

    /// Captured stderr: final once done, partial while running.
    pub fn stderr(&self) -> String {
        match self.finished() {
            Some(f) => f.stderr.clone(),
            None => self.capture.stderr(),
        }
    }

    pub fn report(&self) -> Option<TaskReport> {
        self.finished().map(|finished| TaskReport {
            title: self.title(),
            finished,
        })
    }

    /// Non-blocking completion poll.
    ///
    /// Returns false while the work is still running. The first call that
    /// sees it finished records the outcome and captured output; every call
    /// after that returns true without doing anything.
    pub fn check(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.finished.is_some() {
            return true;
        }

        let (outcome, elapsed) = match &mut inner.backing {
            Backing::Thread(handle) => {
                if handle.as_ref().is_some_and(|h| !h.is_finished()) {
                    return false;
                }
                match handle.take().map(JoinHandle::join) {
                    Some(Ok(output)) => (interpret(output.result), output.elapsed),
                    Some(Err(payload)) => (
                        Err(TaskError::Panic(panic_message(payload.as_ref()))),
                        Duration::ZERO,
                    ),
                    None => (
                        Err(TaskError::Error(anyhow!("task thread handle missing"))),
                        Duration::ZERO,
                    ),
                }
            }
            Backing::Queued { future, slot } => {
                let Some(resolved) = future.try_value() else {
                    return false;
                };
                let output = slot.lock().take();
                match (resolved, output) {
                    (Err(WorkError::Cancelled), output) => (
                        Err(TaskError::Cancelled),
                        output.map_or(Duration::ZERO, |o| o.elapsed),
                    ),
                    (_, Some(output)) => (interpret(output.result), output.elapsed),
                    (Err(err), None) => (Err(TaskError::Error(anyhow!(err))), Duration::ZERO),
                    (Ok(()), None) => (
                        Err(TaskError::Error(anyhow!("task finished without a result"))),
                        Duration::ZERO,
                    ),
                }
            }
        };

        let (success, error) = match outcome {
            Ok(TaskOutcome::Success) => (true, None),
            Ok(TaskOutcome::Failed) => (false, None),
            Err(err) => (false, Some(err)),
        };

        debug!(
            task = %self.title(),
            success,
            error = error.as_ref().map(|e| e.kind()),
            elapsed_ms = elapsed.as_millis() as u64,
            "task finished"
        );

        inner.finished = Some(Arc::new(Finished {
            success,
            error,
            stdout: self.capture.stdout(),
            stderr: self.capture.stderr(),
            elapsed,
        }));
        true
    }

    /// Text for this task's display line.
    ///
    /// A full render draws the frame inset, the status glyph and the title
    /// (truncated to `width`), clearing the rest of the line. A partial render
    /// skips over the inset and redraws only the glyph. Once the title has
    /// been updated every render is full.
    pub fn render(&self, state: &RenderState, force: bool, width: usize) -> String {
        let full = force || self.title.lock().always_full_render;
        if full {
            self.full_render(state, width)
        } else {
            self.partial_render(state)
        }
    }

    fn full_render(&self, state: &RenderState, width: usize) -> String {
        let prefix = format!("{}{}{} ", frame::prefix(), self.glyph(state), reset(state));
        let available = width.saturating_sub(printing_width(&prefix));
        let title = truncate(&state.format(&self.title()), available);
        format!("{prefix}{title}{}", clear_to_end_of_line())
    }

    fn partial_render(&self, state: &RenderState) -> String {
        format!(
            "{}{}{}",
            cursor_forward(frame::prefix_width()),
            self.glyph(state),
            reset(state)
        )
    }

    fn glyph(&self, state: &RenderState) -> String {
        match self.finished() {
            Some(f) if f.success => Glyph::Check.render(state.color()),
            Some(_) => Glyph::X.render(state.color()),
            None if !self.is_started() => Glyph::Hourglass.render(state.color()),
            None => state.spinner(),
        }
    }
}

fn reset(state: &RenderState) -> &'static str {
    if state.color() { RESET } else { "" }
}

fn interpret(result: thread::Result<TaskResult>) -> Result<TaskOutcome, TaskError> {
    match result {
        Ok(Ok(outcome)) => Ok(outcome),
        Ok(Err(err)) if err.is::<Cancelled>() => Err(TaskError::Cancelled),
        Ok(Err(err)) => Err(TaskError::Error(err)),
        Err(payload) => Err(TaskError::Panic(panic_message(payload.as_ref()))),
    }
}
