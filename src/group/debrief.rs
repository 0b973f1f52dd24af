// src/group/debrief.rs

//! Post-run reports for finished tasks.

use std::io::{self, Write};
use std::sync::Arc;

use crate::ui::{frame, RenderState};

use super::task::{Finished, TaskError};

/// Stand-in printed for a stream the task never wrote to.
pub const EMPTY_PLACEHOLDER: &str = "(empty)";

/// A finished task as handed to debrief callbacks.
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub title: String,
    pub finished: Arc<Finished>,
}

impl TaskReport {
    pub fn success(&self) -> bool {
        self.finished.success
    }

    pub fn error(&self) -> Option<&TaskError> {
        self.finished.error.as_ref()
    }

    /// Exactly what the task wrote to stdout.
    pub fn stdout(&self) -> &str {
        &self.finished.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.finished.stderr
    }

    /// Stdout, or [`EMPTY_PLACEHOLDER`] when nothing was written.
    pub fn stdout_or_placeholder(&self) -> &str {
        or_placeholder(&self.finished.stdout)
    }

    /// Stderr, or [`EMPTY_PLACEHOLDER`] when nothing was written.
    pub fn stderr_or_placeholder(&self) -> &str {
        or_placeholder(&self.finished.stderr)
    }
}

fn or_placeholder(text: &str) -> &str {
    if text.is_empty() {
        EMPTY_PLACEHOLDER
    } else {
        text
    }
}

/// Describe an error for the report body: kind, message chain and, for
/// `anyhow` errors, the captured backtrace if there is one.
pub fn describe_error(err: &TaskError) -> String {
    match err {
        TaskError::Error(inner) => format!("{}: {inner:?}", err.kind()),
        TaskError::Panic(_) | TaskError::Cancelled => format!("{}: {err}", err.kind()),
    }
}

/// Write the default framed report for one task.
///
/// ```text
/// ✗ Task Failed: build (1.52s)
/// ┃ Error: boom
/// ┃ ── STDOUT ──
/// ┃ (empty)
/// ┃ ── STDERR ──
/// ┃ (empty)
/// ```
pub fn write_report(out: &mut dyn Write, report: &TaskReport, state: &RenderState) -> io::Result<()> {
    let (glyph, heading) = if report.success() {
        ("{{v}}", "{{green:Task Succeeded:}}")
    } else {
        ("{{x}}", "{{red:Task Failed:}}")
    };
    let elapsed = report.finished.elapsed.as_secs_f64();
    writeln!(
        out,
        "{}{}",
        frame::prefix(),
        state.format(&format!(
            "{glyph} {heading} {} {{{{gray:({elapsed:.2}s)}}}}",
            report.title
        ))
    )?;

    let _nested = frame::nest();
    let prefix = frame::prefix();

    if let Some(err) = report.error() {
        for line in describe_error(err).lines() {
            writeln!(out, "{prefix}{line}")?;
        }
    }

    divider(out, "STDOUT", state)?;
    for line in report.stdout_or_placeholder().lines() {
        writeln!(out, "{prefix}{line}")?;
    }

    divider(out, "STDERR", state)?;
    for line in report.stderr_or_placeholder().lines() {
        writeln!(out, "{prefix}{line}")?;
    }

    Ok(())
}

fn divider(out: &mut dyn Write, label: &str, state: &RenderState) -> io::Result<()> {
    writeln!(
        out,
        "{}{}",
        frame::prefix(),
        state.format(&format!("{{{{gray:── {label} ──}}}}"))
    )
}
