// src/capture/router.rs

//! Thread-scoped output routing.
//!
//! Every thread carries a stack of capture hooks. Writes made through
//! [`stdout`] / [`stderr`] (and the `cprintln!` / `ceprintln!` macros) consult
//! the innermost hook of the *writing* thread only, so a task capturing its
//! output never diverts writes made by other threads.

use std::cell::RefCell;
use std::io::{self, Write};
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;

/// Which standard stream a write was aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// In-memory destination for captured bytes.
///
/// Cloning a sink yields another handle to the same buffer.
#[derive(Debug, Clone, Default)]
pub struct Sink {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl Sink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, data: &[u8]) {
        self.buf.lock().extend_from_slice(data);
    }

    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock()).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.lock().is_empty()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Hook {
    pub(crate) stdout: Sink,
    pub(crate) stderr: Sink,
    pub(crate) duplex: bool,
}

impl Hook {
    /// Record `data`; returns true when the real stream must not see it.
    fn route(&self, stream: Stream, data: &[u8]) -> bool {
        match stream {
            Stream::Stdout => self.stdout.append(data),
            Stream::Stderr => self.stderr.append(data),
        }
        !self.duplex
    }
}

thread_local! {
    static HOOKS: RefCell<Vec<Hook>> = const { RefCell::new(Vec::new()) };
}

/// Pops the hook it pushed when dropped. Tied to the pushing thread.
pub(crate) struct HookGuard {
    _not_send: PhantomData<*const ()>,
}

pub(crate) fn push_hook(hook: Hook) -> HookGuard {
    HOOKS.with(|hooks| hooks.borrow_mut().push(hook));
    HookGuard {
        _not_send: PhantomData,
    }
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        HOOKS.with(|hooks| {
            hooks.borrow_mut().pop();
        });
    }
}

/// Returns true if the calling thread is currently inside a capture.
pub fn is_capturing() -> bool {
    HOOKS.with(|hooks| !hooks.borrow().is_empty())
}

/// A snapshot of where the calling thread's output currently goes.
///
/// Hand a route to a helper thread (for instance one draining a child
/// process pipe) so its writes land in the same capture as the thread that
/// spawned it.
#[derive(Debug, Clone, Default)]
pub struct Route {
    hook: Option<Hook>,
}

/// Snapshot the calling thread's innermost capture, if any.
pub fn current_route() -> Route {
    HOOKS.with(|hooks| Route {
        hook: hooks.borrow().last().cloned(),
    })
}

impl Route {
    pub fn is_captured(&self) -> bool {
        self.hook.is_some()
    }

    pub fn write(&self, stream: Stream, data: &[u8]) -> io::Result<()> {
        if let Some(hook) = &self.hook {
            if hook.route(stream, data) {
                return Ok(());
            }
        }
        write_real(stream, data)
    }

    pub fn writer(&self, stream: Stream) -> RouteWriter {
        RouteWriter {
            route: self.clone(),
            stream,
        }
    }
}

/// `Write` adapter over a [`Route`].
#[derive(Debug, Clone)]
pub struct RouteWriter {
    route: Route,
    stream: Stream,
}

impl Write for RouteWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.route.write(self.stream, buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        flush_real(self.stream)
    }
}

fn write_real(stream: Stream, data: &[u8]) -> io::Result<()> {
    match stream {
        Stream::Stdout => {
            let mut out = io::stdout().lock();
            out.write_all(data)?;
            out.flush()
        }
        Stream::Stderr => io::stderr().lock().write_all(data),
    }
}

fn flush_real(stream: Stream) -> io::Result<()> {
    match stream {
        Stream::Stdout => io::stdout().flush(),
        Stream::Stderr => io::stderr().flush(),
    }
}

/// Write `data` to `stream` as seen from the calling thread.
pub fn write(stream: Stream, data: &[u8]) -> io::Result<()> {
    let consumed = HOOKS.with(|hooks| {
        hooks
            .borrow()
            .last()
            .is_some_and(|hook| hook.route(stream, data))
    });
    if consumed {
        return Ok(());
    }
    write_real(stream, data)
}

/// Write `line` plus a newline, ignoring IO errors on the real stream.
pub fn write_line(stream: Stream, line: &str) {
    let mut data = String::with_capacity(line.len() + 1);
    data.push_str(line);
    data.push('\n');
    let _ = write(stream, data.as_bytes());
}

/// Capture-aware standard output handle.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stdout;

/// Capture-aware standard error handle.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stderr;

pub fn stdout() -> Stdout {
    Stdout
}

pub fn stderr() -> Stderr {
    Stderr
}

impl Write for Stdout {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        write(Stream::Stdout, buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        flush_real(Stream::Stdout)
    }
}

impl Write for Stderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        write(Stream::Stderr, buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        flush_real(Stream::Stderr)
    }
}
