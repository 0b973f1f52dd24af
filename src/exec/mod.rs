// src/exec/mod.rs

//! Execution layer.
//!
//! - [`future`] is the single-assignment result cell handed out for queued work.
//! - [`cancel`] provides the cooperative [`CancelToken`] work observes.
//! - [`work_queue`] owns the bounded worker pool.
//! - [`command`] runs shell commands under a token, streaming their output
//!   into the active capture.

pub mod cancel;
pub mod command;
pub mod future;
pub mod work_queue;

pub use cancel::{CancelToken, Cancelled};
pub use command::run_command;
pub use future::{Future, WorkError};
pub use work_queue::WorkQueue;

pub(crate) use work_queue::panic_message;
