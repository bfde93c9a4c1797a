// src/sched/backend.rs

//! Pluggable suite backend.
//!
//! The scheduler only decides *when* hooks and cases run; *how* they run is
//! behind [`SuiteBackend`]. Production uses [`RealBackend`], which spawns
//! the hook executables and runs the test case commands. Tests can plug in
//! a backend that records the order of calls without spawning anything.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use tracing::debug;

use crate::case::TestCase;
use crate::context::RunContext;
use crate::errors::Result;
use crate::exec::{run_hook, HookKind};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Verdict and trace of one executed case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseRun {
    pub passed: bool,
    pub trace: String,
}

pub trait SuiteBackend: Send + Sync + 'static {
    /// Run the `initialize` hook of `dir`, if any.
    fn setup<'a>(&'a self, dir: &'a Path) -> BoxFuture<'a, Result<()>>;

    /// Execute one case. Per-case failures are `Ok` with `passed = false`.
    fn execute<'a>(&'a self, case: &'a TestCase) -> BoxFuture<'a, Result<CaseRun>>;

    /// Run the `finalize` hook of `dir`, if any.
    fn teardown<'a>(&'a self, dir: &'a Path) -> BoxFuture<'a, Result<()>>;
}

pub struct RealBackend {
    ctx: RunContext,
}

impl RealBackend {
    pub fn new(ctx: RunContext) -> Self {
        Self { ctx }
    }

    async fn hook(&self, dir: &Path, kind: HookKind) -> Result<()> {
        let outcome = run_hook(self.ctx.fs.as_ref(), dir, kind, self.ctx.options.watchdog).await?;
        debug!(dir = %dir.display(), hook = %kind, ?outcome, "hook finished");
        Ok(())
    }
}

impl SuiteBackend for RealBackend {
    fn setup<'a>(&'a self, dir: &'a Path) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.hook(dir, HookKind::Initialize))
    }

    fn execute<'a>(&'a self, case: &'a TestCase) -> BoxFuture<'a, Result<CaseRun>> {
        Box::pin(async move {
            let mut trace = String::new();
            let passed = case.execute(&self.ctx, &mut trace).await?;
            Ok(CaseRun { passed, trace })
        })
    }

    fn teardown<'a>(&'a self, dir: &'a Path) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.hook(dir, HookKind::Finalize))
    }
}
