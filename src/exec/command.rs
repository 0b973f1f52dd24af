// src/exec/command.rs

//! Shell command execution under a cancel token.
//!
//! The child's stdout/stderr are pumped into whatever capture is active on
//! the calling thread, so a command run inside a task ends up in that task's
//! captured output.

use std::io::{self, Read};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::capture::{self, Route, Stream};

use super::cancel::{CancelToken, Cancelled};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Build a shell command appropriate for the platform.
fn shell(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}

/// Run `cmd` through the shell and wait for it.
///
/// - Output is forwarded to the current capture route as it arrives.
/// - If `token` is cancelled the child is killed and `Cancelled` is
///   returned (wrapped in `anyhow::Error`).
pub fn run_command(cmd: &str, token: &CancelToken) -> Result<ExitStatus> {
    info!(cmd = %cmd, "starting process");

    let mut child = shell(cmd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawning process for '{cmd}'"))?;

    let route = capture::current_route();
    let pumps: Vec<JoinHandle<()>> = [
        child.stdout.take().map(|out| pump(out, route.clone(), Stream::Stdout)),
        child.stderr.take().map(|err| pump(err, route.clone(), Stream::Stderr)),
    ]
    .into_iter()
    .flatten()
    .collect();

    let status = loop {
        if let Some(status) = child
            .try_wait()
            .with_context(|| format!("waiting for process of '{cmd}'"))?
        {
            break status;
        }

        if token.sleep(POLL_INTERVAL).is_err() {
            info!(cmd = %cmd, "cancellation requested; killing process");
            if let Err(e) = child.kill() {
                warn!(cmd = %cmd, error = %e, "failed to kill child process on cancellation");
            }
            let _ = child.wait();
            // Grandchildren may still hold the pipes open; leave the pumps
            // to finish on their own.
            return Err(Cancelled.into());
        }
    };

    for handle in pumps {
        if handle.join().is_err() {
            warn!(cmd = %cmd, "output pump panicked");
        }
    }

    info!(
        cmd = %cmd,
        exit_code = status.code().unwrap_or(-1),
        success = status.success(),
        "process exited"
    );
    Ok(status)
}

fn pump<R>(mut reader: R, route: Route, stream: Stream) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = [0u8; 4096];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if let Err(e) = route.write(stream, &buf[..n]) {
                        debug!(error = %e, "dropping child output");
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!(error = %e, "child output pipe closed with error");
                    break;
                }
            }
        }
    })
}
