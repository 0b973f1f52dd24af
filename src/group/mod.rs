// src/group/mod.rs

//! Spinner task groups.
//!
//! - [`task`]: a single task, its handle and outcome types.
//! - [`spin_group`]: the group, its builder and the render loop.
//! - [`debrief`]: reports for finished tasks.

pub mod debrief;
pub mod spin_group;
pub mod task;

pub use debrief::{write_report, TaskReport, EMPTY_PLACEHOLDER};
pub use spin_group::{SpinGroup, SpinGroupBuilder, DEFAULT_PERIOD};
pub use task::{Finished, Task, TaskError, TaskHandle, TaskOutcome, TaskResult};

/// Run a single task as its own group and report whether it succeeded.
pub fn spin<F>(title: impl Into<String>, work: F) -> bool
where
    F: FnOnce(&TaskHandle<'_>) -> TaskResult + Send + 'static,
{
    let group = SpinGroup::new();
    group.add(title, work);
    group.wait()
}
