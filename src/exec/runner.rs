// src/exec/runner.rs

//! Run one external command with a watchdog.
//!
//! The child writes into temporary capture files (see [`CaptureFiles`]);
//! the runner polls it at [`POLL_INTERVAL`] until it exits, the watchdog
//! fires, or an interrupt arrives. Capture files are released on every one
//! of those paths.

use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::watch;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::errors::{Result, SystestError};
use crate::exec::capture::{CaptureFiles, Captured};

/// Liveness polling granularity.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// One command invocation.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Shell command line, run through `sh -c`.
    pub command: String,
    /// Working directory of the child. Never the runner's own cwd implicitly.
    pub working_dir: PathBuf,
    pub timeout: Duration,
    /// Lines fed to the child's stdin, each terminated by `\n`, after which
    /// stdin is closed. With `None`, stdin stays open until the child exits.
    pub input: Option<Vec<String>>,
    /// Capture stdout and stderr into a single interleaved buffer.
    pub combined_output: bool,
}

impl RunRequest {
    pub fn new(command: impl Into<String>, working_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            working_dir: working_dir.into(),
            timeout,
            input: None,
            combined_output: true,
        }
    }

    pub fn with_input(mut self, input: Vec<String>) -> Self {
        self.input = Some(input);
        self
    }

    pub fn separate_output(mut self) -> Self {
        self.combined_output = false;
        self
    }
}

/// Result of one runner invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub timed_out: bool,
    /// Set when the run was cut short by an interrupt and partial output was
    /// recovered.
    pub interrupted: bool,
    /// `None` when the child was killed (timeout or interrupt) or ended by a
    /// signal.
    pub exit_code: Option<i32>,
    stdout: Vec<u8>,
    stderr: Option<Vec<u8>>,
}

impl ExecutionOutcome {
    fn new(captured: Captured, timed_out: bool, interrupted: bool, exit_code: Option<i32>) -> Self {
        Self {
            timed_out,
            interrupted,
            exit_code,
            stdout: captured.stdout,
            stderr: captured.stderr,
        }
    }

    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    /// The stderr bytes; the same bytes as [`Self::stdout`] in combined mode.
    pub fn stderr(&self) -> &[u8] {
        self.stderr.as_deref().unwrap_or(&self.stdout)
    }

    pub fn is_combined(&self) -> bool {
        self.stderr.is_none()
    }

    pub fn into_stdout(self) -> Vec<u8> {
        self.stdout
    }
}

/// Why a run was cut short before the child exited on its own.
#[derive(Debug, Error)]
pub enum Interruption {
    #[error("interrupt requested")]
    Signal,
    #[error("polling the child failed: {0}")]
    Wait(#[source] io::Error),
}

/// Outcome of trying to salvage output after an [`Interruption`].
#[derive(Debug)]
pub enum Recovery {
    Recovered(ExecutionOutcome),
    Unrecoverable(io::Error),
}

/// Run `req.command` until it exits or `req.timeout` elapses.
///
/// `interrupt` flips to `true` when the whole run is being cancelled.
///
/// Errors:
/// - [`SystestError::Spawn`] if the child cannot be created. Callers treat
///   this as fatal for the whole suite.
/// - [`SystestError::Interrupted`] if an interrupt arrived and no output
///   could be recovered.
pub async fn run_with_timeout(
    req: &RunRequest,
    interrupt: &mut watch::Receiver<bool>,
) -> Result<ExecutionOutcome> {
    let capture = CaptureFiles::create(req.combined_output)?;
    let (out, err) = capture.stdio()?;

    let mut cmd = shell_command(&req.command);
    cmd.current_dir(&req.working_dir)
        .stdin(Stdio::piped())
        .stdout(out)
        .stderr(err)
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd.spawn().map_err(|source| SystestError::Spawn {
        command: req.command.clone(),
        source,
    })?;
    debug!(cmd = %req.command, dir = %req.working_dir.display(), pid = ?child.id(), capture = ?capture.paths(), "spawned");
    let mut group = GroupGuard::new(&child);

    // Held until the child exits when there is no input to feed.
    let _idle_stdin = match (child.stdin.take(), &req.input) {
        (Some(stdin), Some(lines)) => {
            feed_input(stdin, lines.clone(), req.command.clone());
            None
        }
        (stdin, _) => stdin,
    };

    let started = Instant::now();
    let result = loop {
        match child.try_wait() {
            Ok(Some(status)) => break finish_exited(capture, status, req).await,
            Ok(None) => {}
            Err(e) => {
                break finish_interrupted(child, capture, req, Interruption::Wait(e)).await;
            }
        }

        if started.elapsed() >= req.timeout {
            break finish_timed_out(child, capture, req).await;
        }

        tokio::select! {
            _ = sleep(POLL_INTERVAL) => {}
            _ = wait_for_interrupt(interrupt) => {
                break finish_interrupted(child, capture, req, Interruption::Signal).await;
            }
        }
    };
    group.disarm();
    result
}

fn shell_command(command: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    }
}

/// Write the input lines, then drop the pipe so the child sees EOF.
///
/// Runs beside the poll loop so a child that never reads cannot stall the
/// watchdog.
fn feed_input(mut stdin: ChildStdin, lines: Vec<String>, command: String) {
    tokio::spawn(async move {
        for line in &lines {
            let line = normalize_line(line);
            if let Err(e) = stdin.write_all(line.as_bytes()).await {
                if e.kind() == io::ErrorKind::BrokenPipe {
                    debug!(cmd = %command, "child closed stdin early");
                } else {
                    warn!(cmd = %command, error = %e, "writing child stdin failed");
                }
                return;
            }
        }
        if let Err(e) = stdin.flush().await {
            debug!(cmd = %command, error = %e, "flushing child stdin failed");
        }
    });
}

fn normalize_line(line: &str) -> String {
    let mut out = line.trim_end_matches(['\r', '\n']).to_string();
    out.push('\n');
    out
}

/// Resolves once the interrupt flag is set; never, if the sender is gone.
async fn wait_for_interrupt(interrupt: &mut watch::Receiver<bool>) {
    let sender_gone = interrupt.wait_for(|flag| *flag).await.is_err();
    if sender_gone {
        std::future::pending::<()>().await;
    }
}

async fn finish_exited(
    capture: CaptureFiles,
    status: ExitStatus,
    req: &RunRequest,
) -> Result<ExecutionOutcome> {
    let captured = capture.read_back().await?;
    release(capture, req);
    debug!(cmd = %req.command, exit_code = ?status.code(), "child exited");
    Ok(ExecutionOutcome::new(captured, false, false, status.code()))
}

async fn finish_timed_out(
    mut child: Child,
    capture: CaptureFiles,
    req: &RunRequest,
) -> Result<ExecutionOutcome> {
    info!(cmd = %req.command, timeout_secs = req.timeout.as_secs(), "watchdog expired; killing child");
    kill_process_tree(&mut child).await;

    let captured = capture.read_back().await?;
    release(capture, req);
    Ok(ExecutionOutcome::new(captured, true, false, None))
}

async fn finish_interrupted(
    mut child: Child,
    capture: CaptureFiles,
    req: &RunRequest,
    cause: Interruption,
) -> Result<ExecutionOutcome> {
    warn!(cmd = %req.command, %cause, "run interrupted; killing child");
    kill_process_tree(&mut child).await;

    match recover(&capture).await {
        Recovery::Recovered(outcome) => {
            release(capture, req);
            Ok(outcome)
        }
        Recovery::Unrecoverable(e) => {
            debug!(cmd = %req.command, error = %e, "no output recovered after interrupt");
            Err(SystestError::Interrupted {
                command: req.command.clone(),
                cause,
            })
        }
    }
}

async fn recover(capture: &CaptureFiles) -> Recovery {
    match capture.read_back().await {
        Ok(captured) => Recovery::Recovered(ExecutionOutcome::new(captured, false, true, None)),
        Err(e) => Recovery::Unrecoverable(e),
    }
}

/// Delete the capture files; failures are logged, not propagated.
fn release(capture: CaptureFiles, req: &RunRequest) {
    if let Err(e) = capture.close() {
        warn!(cmd = %req.command, error = %e, "removing capture files failed");
    }
}

/// SIGKILL the child's process group, then reap the child.
pub(crate) async fn kill_process_tree(child: &mut Child) {
    if let Some(pid) = child.id() {
        kill_group(pid);
    }

    if let Err(e) = child.kill().await {
        debug!(error = %e, "killing child failed; it may already be gone");
    }
}

/// Kills a child's process group if dropped while still armed.
///
/// `kill_on_drop` reaches only the direct child, so a run cancelled
/// mid-flight would otherwise leave the rest of its group behind.
pub(crate) struct GroupGuard {
    pgid: Option<u32>,
}

impl GroupGuard {
    pub(crate) fn new(child: &Child) -> Self {
        Self { pgid: child.id() }
    }

    /// The run finished through a normal path; nothing to clean up.
    pub(crate) fn disarm(&mut self) {
        self.pgid = None;
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        if let Some(pid) = self.pgid.take() {
            debug!(pid, "run dropped mid-flight; killing its process group");
            kill_group(pid);
        }
    }
}

#[cfg(unix)]
fn kill_group(pid: u32) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        debug!(pid, error = %e, "killpg failed");
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: u32) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_lines_get_a_single_newline() {
        assert_eq!(normalize_line("abc"), "abc\n");
        assert_eq!(normalize_line("abc\r\n"), "abc\n");
        assert_eq!(normalize_line("  x \n"), "  x \n");
    }
}
