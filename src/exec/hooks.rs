// src/exec/hooks.rs

//! Per-directory `initialize` / `finalize` hooks.

use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::errors::{Result, SystestError};
use crate::exec::runner::{kill_process_tree, GroupGuard};
use crate::fs::FileSystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Initialize,
    Finalize,
}

impl HookKind {
    pub fn file_name(self) -> &'static str {
        match self {
            HookKind::Initialize => "initialize",
            HookKind::Finalize => "finalize",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// What happened when a hook was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    /// No executable hook file in the directory.
    Absent,
    /// The hook ran; its exit code is informational only.
    Ran(Option<i32>),
    /// The hook outlived the watchdog and was killed.
    TimedOut,
}

/// Run the `kind` hook of `dir` if it exists and is executable.
///
/// The hook runs with `dir` as its working directory and no arguments;
/// its output is discarded. Only a failure to create the process is an
/// error.
pub async fn run_hook(
    fs: &dyn FileSystem,
    dir: &Path,
    kind: HookKind,
    timeout: Duration,
) -> Result<HookOutcome> {
    let hook = dir.join(kind.file_name());
    if !fs.is_executable(&hook) {
        debug!(dir = %dir.display(), hook = %kind, "no executable hook");
        return Ok(HookOutcome::Absent);
    }

    let program = std::path::absolute(&hook)?;
    let mut cmd = Command::new(&program);
    cmd.current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    info!(dir = %dir.display(), hook = %kind, "running hook");
    let mut child = cmd.spawn().map_err(|source| SystestError::Spawn {
        command: program.display().to_string(),
        source,
    })?;

    let mut group = GroupGuard::new(&child);

    let outcome = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => {
            if !status.success() {
                debug!(dir = %dir.display(), hook = %kind, exit_code = ?status.code(), "hook exited unsuccessfully; ignoring");
            }
            HookOutcome::Ran(status.code())
        }
        Ok(Err(e)) => {
            warn!(dir = %dir.display(), hook = %kind, error = %e, "waiting for hook failed");
            HookOutcome::Ran(None)
        }
        Err(_) => {
            warn!(dir = %dir.display(), hook = %kind, "hook exceeded watchdog; killing it");
            kill_process_tree(&mut child).await;
            HookOutcome::TimedOut
        }
    };
    group.disarm();
    Ok(outcome)
}
