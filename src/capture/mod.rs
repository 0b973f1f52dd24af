// src/capture/mod.rs

//! Per-task output capture.
//!
//! A [`Capture`] runs a closure with a hook installed on the calling thread:
//! writes made through this module's [`stdout`] / [`stderr`] handles (and the
//! `cprintln!` / `ceprintln!` macros, and `tracing` events, see
//! [`crate::logging`]) are appended to the capture's private buffers instead
//! of reaching the terminal. Other threads keep writing to the real streams.
//!
//! Captures nest; the innermost one on a thread wins.
//!
//! - [`router`] holds the thread-local hook stack and the routed writers.
//! - [`stdin`] implements reference-counted stdin masking.

pub mod router;
pub mod stdin;

pub use router::{
    current_route, is_capturing, stderr, stdout, write, write_line, Route, RouteWriter, Sink,
    Stderr, Stdout, Stream,
};
pub use stdin::{stdin, stdin_masked, Stdin};

use router::{push_hook, Hook};
use stdin::StdinMask;

/// Behaviour switches for a [`Capture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Keep the frame inset ([`crate::ui::frame::prefix`]) while capturing.
    pub with_frame_inset: bool,
    /// Append stderr writes to the stdout buffer.
    pub merged_output: bool,
    /// Also pass captured writes through to the real streams.
    pub duplex_output: bool,
    /// Make [`stdin`] read as end-of-file while this capture is active.
    pub mask_stdin: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            with_frame_inset: true,
            merged_output: false,
            duplex_output: false,
            mask_stdin: true,
        }
    }
}

/// Text collected by a finished capture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

/// A pair of buffers plus the options used to fill them.
///
/// The buffers outlive [`Capture::run`], so owners can read partial output
/// while the closure is still running on another thread.
#[derive(Debug, Clone)]
pub struct Capture {
    options: CaptureOptions,
    stdout: Sink,
    stderr: Sink,
}

impl Capture {
    pub fn new(options: CaptureOptions) -> Self {
        let stdout = Sink::new();
        let stderr = if options.merged_output {
            stdout.clone()
        } else {
            Sink::new()
        };
        Self {
            options,
            stdout,
            stderr,
        }
    }

    pub fn options(&self) -> CaptureOptions {
        self.options
    }

    /// Run `work` on the calling thread with this capture installed.
    ///
    /// The hook, the frame-inset suppression and the stdin mask are all
    /// released when `work` returns or unwinds.
    pub fn run<R>(&self, work: impl FnOnce() -> R) -> R {
        let _hook = push_hook(Hook {
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
            duplex: self.options.duplex_output,
        });
        let _inset = (!self.options.with_frame_inset).then(crate::ui::frame::suppress_inset);
        let _mask = self.options.mask_stdin.then(StdinMask::engage);

        work()
    }

    pub fn stdout(&self) -> String {
        self.stdout.contents()
    }

    /// Captured stderr. Empty when `merged_output` is set, since those writes
    /// went to stdout.
    pub fn stderr(&self) -> String {
        if self.options.merged_output {
            return String::new();
        }
        self.stderr.contents()
    }

    pub fn output(&self) -> CapturedOutput {
        CapturedOutput {
            stdout: self.stdout(),
            stderr: self.stderr(),
        }
    }
}

/// One-shot helper: run `work` under a fresh capture and return its result
/// together with everything it wrote.
pub fn capture<R>(options: CaptureOptions, work: impl FnOnce() -> R) -> (R, CapturedOutput) {
    let capture = Capture::new(options);
    let result = capture.run(work);
    (result, capture.output())
}

/// `println!` through the capture router.
#[macro_export]
macro_rules! cprintln {
    () => {
        $crate::capture::write_line($crate::capture::Stream::Stdout, "")
    };
    ($($arg:tt)*) => {
        $crate::capture::write_line($crate::capture::Stream::Stdout, &format!($($arg)*))
    };
}

/// `eprintln!` through the capture router.
#[macro_export]
macro_rules! ceprintln {
    () => {
        $crate::capture::write_line($crate::capture::Stream::Stderr, "")
    };
    ($($arg:tt)*) => {
        $crate::capture::write_line($crate::capture::Stream::Stderr, &format!($($arg)*))
    };
}
