// src/group/spin_group.rs

//! A set of tasks drawn as one spinner line each, repainted in place.
//!
//! [`SpinGroup::wait`] polls every task at a fixed period and redraws the
//! group's lines with relative cursor movement, so output above the group is
//! left alone. Completion is discovered by polling, which bounds display
//! latency to one period.

use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::capture::{self, CaptureOptions};
use crate::errors::{Result, SpinError};
use crate::exec::WorkQueue;
use crate::ui::ansi::{cursor_down, cursor_up, hide_cursor, show_cursor};
use crate::ui::{terminal_width, RenderState, StatusCounts};

use super::debrief::{write_report, TaskReport};
use super::task::{BoxedWork, Task, TaskHandle, TaskResult};

/// Time between render passes.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(100);

type ReportCallback = Box<dyn Fn(&TaskReport) + Send + Sync>;

enum QueueBacking {
    /// Created by the group; closed and joined once `wait` has seen every
    /// task finish, so tasks added mid-wait still run.
    Owned(Arc<WorkQueue>),
    /// Supplied by the caller, who decides when it closes.
    Shared(Arc<WorkQueue>),
}

impl QueueBacking {
    fn queue(&self) -> &WorkQueue {
        match self {
            QueueBacking::Owned(q) | QueueBacking::Shared(q) => q,
        }
    }
}

/// Builder for [`SpinGroup`].
pub struct SpinGroupBuilder {
    auto_debrief: bool,
    max_concurrent: Option<usize>,
    work_queue: Option<Arc<WorkQueue>>,
    on_success: Option<ReportCallback>,
    on_failure: Option<ReportCallback>,
    output: Option<Box<dyn Write + Send>>,
    render_state: Option<RenderState>,
    period: Duration,
    mask_stdin: bool,
    width: Option<usize>,
}

impl Default for SpinGroupBuilder {
    fn default() -> Self {
        Self {
            auto_debrief: true,
            max_concurrent: None,
            work_queue: None,
            on_success: None,
            on_failure: None,
            output: None,
            render_state: None,
            period: DEFAULT_PERIOD,
            mask_stdin: true,
            width: None,
        }
    }
}

impl SpinGroupBuilder {
    /// Run [`SpinGroup::debrief`] at the end of `wait` (default: on).
    pub fn auto_debrief(mut self, enabled: bool) -> Self {
        self.auto_debrief = enabled;
        self
    }

    /// Run tasks on a private work queue of this size instead of one thread
    /// each. Conflicts with [`work_queue`](Self::work_queue).
    pub fn max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = Some(max);
        self
    }

    /// Run tasks on a caller-owned work queue. Conflicts with
    /// [`max_concurrent`](Self::max_concurrent).
    pub fn work_queue(mut self, queue: Arc<WorkQueue>) -> Self {
        self.work_queue = Some(queue);
        self
    }

    /// Called once per successful task during debrief.
    pub fn on_success(mut self, callback: impl Fn(&TaskReport) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    /// Called once per failed task during debrief, replacing the default
    /// report.
    pub fn on_failure(mut self, callback: impl Fn(&TaskReport) + Send + Sync + 'static) -> Self {
        self.on_failure = Some(Box::new(callback));
        self
    }

    /// Where the display and default reports are written (default: the
    /// capture-aware stdout).
    pub fn output(mut self, out: impl Write + Send + 'static) -> Self {
        self.output = Some(Box::new(out));
        self
    }

    /// Share an animation frame (and color setting) with other widgets.
    pub fn render_state(mut self, state: RenderState) -> Self {
        self.render_state = Some(state);
        self
    }

    pub fn period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Mask stdin while tasks run (default: on).
    pub fn mask_stdin(mut self, enabled: bool) -> Self {
        self.mask_stdin = enabled;
        self
    }

    /// Render to a fixed width instead of querying the terminal each pass.
    pub fn width(mut self, columns: usize) -> Self {
        self.width = Some(columns);
        self
    }

    pub fn build(self) -> Result<SpinGroup> {
        let queue = match (self.max_concurrent, self.work_queue) {
            (Some(_), Some(_)) => {
                return Err(SpinError::InvalidArgument(
                    "max_concurrent and work_queue are mutually exclusive".to_string(),
                ));
            }
            (Some(max), None) => Some(QueueBacking::Owned(Arc::new(WorkQueue::new(max)?))),
            (None, Some(queue)) => Some(QueueBacking::Shared(queue)),
            (None, None) => None,
        };

        Ok(SpinGroup {
            tasks: Mutex::new(Vec::new()),
            display: Mutex::new(
                self.output
                    .unwrap_or_else(|| Box::new(capture::stdout())),
            ),
            queue,
            auto_debrief: self.auto_debrief,
            on_success: self.on_success,
            on_failure: self.on_failure,
            state: self.render_state.unwrap_or_default(),
            period: self.period,
            mask_stdin: self.mask_stdin,
            width: self.width,
        })
    }
}

/// Owns a set of tasks and the terminal lines that show them.
pub struct SpinGroup {
    tasks: Mutex<Vec<Arc<Task>>>,
    /// Every write to the terminal goes through this lock.
    display: Mutex<Box<dyn Write + Send>>,
    queue: Option<QueueBacking>,
    auto_debrief: bool,
    on_success: Option<ReportCallback>,
    on_failure: Option<ReportCallback>,
    state: RenderState,
    period: Duration,
    mask_stdin: bool,
    width: Option<usize>,
}

impl fmt::Debug for SpinGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpinGroup")
            .field("tasks", &self.tasks.lock().len())
            .field("auto_debrief", &self.auto_debrief)
            .field("period", &self.period)
            .finish_non_exhaustive()
    }
}

impl Default for SpinGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl SpinGroup {
    /// A group with one thread per task, auto-debrief on, writing to stdout.
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
            display: Mutex::new(Box::new(capture::stdout())),
            queue: None,
            auto_debrief: true,
            on_success: None,
            on_failure: None,
            state: RenderState::default(),
            period: DEFAULT_PERIOD,
            mask_stdin: true,
            width: None,
        }
    }

    pub fn builder() -> SpinGroupBuilder {
        SpinGroupBuilder::default()
    }

    pub fn render_state(&self) -> &RenderState {
        &self.state
    }

    /// Add a task and start it (or queue it, for queue-backed groups).
    ///
    /// Its line is the next one below those already added. Adding while
    /// [`wait`](Self::wait) runs is tolerated; the new line is appended on the
    /// next pass.
    pub fn add<F>(&self, title: impl Into<String>, work: F)
    where
        F: FnOnce(&TaskHandle<'_>) -> TaskResult + Send + 'static,
    {
        let title = title.into();
        let work: BoxedWork = Box::new(work);
        let options = CaptureOptions {
            with_frame_inset: false,
            mask_stdin: self.mask_stdin,
            ..CaptureOptions::default()
        };

        let mut tasks = self.tasks.lock();
        let index = tasks.len();
        debug!(task = %title, index, "adding task");

        let task = match &self.queue {
            Some(backing) => Task::enqueue(title, work, options, backing.queue()),
            None => Task::spawn(index, title, work, options),
        };
        tasks.push(Arc::new(task));
    }

    /// Snapshot of the tasks in display order.
    pub fn tasks(&self) -> Vec<Arc<Task>> {
        self.tasks.lock().clone()
    }

    /// Repaint until every task is done, then debrief (if enabled).
    ///
    /// Returns whether every task succeeded.
    pub fn wait(&self) -> bool {
        self.state.set_frame(0);
        let mut consumed_lines = 0usize;
        let mut seen_done: Vec<bool> = Vec::new();
        let mut last_width: Option<usize> = None;
        self.write_raw(hide_cursor());

        loop {
            let tasks = self.tasks();
            let width = self.width.unwrap_or_else(terminal_width);
            let width_changed = last_width.is_some_and(|w| w != width);
            last_width = Some(width);

            let frame = self.state.frame();
            let grew = consumed_lines < tasks.len();
            let mut done_count = 0;
            let mut pass = String::new();

            let mut display = self.display.lock();
            for (index, task) in tasks.iter().enumerate() {
                let done = task.check();
                if index >= seen_done.len() {
                    seen_done.push(false);
                }
                let newly_done = done && !seen_done[index];
                seen_done[index] = done;
                if done {
                    done_count += 1;
                }

                if index >= consumed_lines {
                    pass.push_str(&task.render(&self.state, true, width));
                    pass.push('\n');
                    consumed_lines += 1;
                } else {
                    let offset = consumed_lines - index;
                    let force = frame == 0 || newly_done || grew || width_changed;
                    pass.push_str(&cursor_up(offset));
                    pass.push('\r');
                    pass.push_str(&task.render(&self.state, force, width));
                    pass.push('\r');
                    pass.push_str(&cursor_down(offset));
                }
            }

            if let Err(e) = display.write_all(pass.as_bytes()).and_then(|()| display.flush()) {
                debug!(error = %e, "failed to write render pass");
            }
            drop(display);

            if done_count == tasks.len() {
                break;
            }

            self.state.advance();
            thread::sleep(self.period);
        }
        self.write_raw(show_cursor());

        if let Some(QueueBacking::Owned(queue)) = &self.queue {
            queue.wait();
        }

        if self.auto_debrief {
            self.debrief()
        } else {
            self.all_succeeded()
        }
    }

    fn write_raw(&self, text: &str) {
        let mut display = self.display.lock();
        if let Err(e) = display.write_all(text.as_bytes()).and_then(|()| display.flush()) {
            debug!(error = %e, "failed to write to display");
        }
    }

    /// Report finished tasks: failures through the failure callback (or the
    /// default report), successes through the success callback if one is
    /// registered.
    ///
    /// Returns whether every task succeeded. Unfinished tasks count as not
    /// succeeded and are not reported.
    pub fn debrief(&self) -> bool {
        let tasks = self.tasks();
        let mut display = self.display.lock();
        let mut all_succeeded = true;

        for task in &tasks {
            task.check();
            let Some(report) = task.report() else {
                all_succeeded = false;
                continue;
            };

            if report.success() {
                if let Some(callback) = &self.on_success {
                    callback(&report);
                }
                continue;
            }

            all_succeeded = false;
            match &self.on_failure {
                Some(callback) => callback(&report),
                None => {
                    if let Err(e) = write_report(&mut **display, &report, &self.state) {
                        warn!(task = %report.title, error = %e, "failed to write debrief");
                    }
                }
            }
        }

        if let Err(e) = display.flush() {
            debug!(error = %e, "failed to flush debrief");
        }
        all_succeeded
    }

    /// Whether every task has finished successfully.
    pub fn all_succeeded(&self) -> bool {
        self.tasks().iter().all(|t| t.succeeded())
    }

    /// Interrupt the group's work queue: queued tasks fail as cancelled and
    /// running ones see their cancel token fire. Tasks on dedicated threads
    /// cannot be interrupted.
    pub fn interrupt(&self) {
        match &self.queue {
            Some(backing) => backing.queue().interrupt(),
            None => warn!("spin group has no work queue; running tasks cannot be interrupted"),
        }
    }

    /// Counts for [`crate::ui::status::render`].
    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for task in self.tasks() {
            match task.finished() {
                Some(f) if f.success => counts.succeeded += 1,
                Some(_) => counts.failed += 1,
                None if task.is_started() => counts.working += 1,
                None => counts.pending += 1,
            }
        }
        counts
    }
}
