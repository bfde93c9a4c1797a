// src/sched/scheduler.rs

//! Dispatch of test directories and cases under a [`Strategy`].
//!
//! Hook ordering holds under every strategy: a directory's setup finishes
//! before any of its cases start, and its teardown starts only after all of
//! them have finished.
//!
//! Each hook step is bounded by the watchdog plus [`STEP_GRACE`]. Cases carry
//! no step limit of their own: every command they run has its own watchdog,
//! so a case with several pairs may take several watchdogs.
//!
//! Pool work is joined in completion order, so a fatal error from any job
//! cancels the rest of the run as soon as it happens.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::case::TestCase;
use crate::errors::{Result, SystestError};
use crate::exec::HookKind;
use crate::report::{CaseReport, ResultAggregator, SuiteVerdict};
use crate::sched::backend::SuiteBackend;
use crate::sched::pool::{within, JobError, WorkerPool};
use crate::suite::TestDirectory;
use crate::types::{Strategy, WorkerId};

/// Slack given to a hook step beyond the watchdog, so the hook's own timeout
/// fires and is reported first.
pub const STEP_GRACE: Duration = Duration::from_secs(1);

pub struct Scheduler<B: SuiteBackend> {
    backend: Arc<B>,
    strategy: Strategy,
    jobs: usize,
    hook_limit: Duration,
    interrupt: watch::Receiver<bool>,
}

impl<B: SuiteBackend> Scheduler<B> {
    pub fn new(
        backend: Arc<B>,
        strategy: Strategy,
        jobs: usize,
        watchdog: Duration,
        interrupt: watch::Receiver<bool>,
    ) -> Self {
        Self {
            backend,
            strategy,
            jobs: jobs.max(1),
            hook_limit: watchdog.saturating_add(STEP_GRACE),
            interrupt,
        }
    }

    /// Run every directory and return the aggregated verdict.
    ///
    /// Result lines are written to `sink` as cases complete. Any `Err` is
    /// fatal; unfinished pool work is cancelled before it is returned.
    pub async fn run(&self, dirs: Vec<TestDirectory>, sink: Box<dyn Write + Send>) -> Result<SuiteVerdict> {
        let cases: usize = dirs.iter().map(|d| d.cases.len()).sum();
        info!(strategy = %self.strategy, jobs = self.jobs, dirs = dirs.len(), cases, "starting suite");

        let (tx, aggregator) = ResultAggregator::spawn(self.strategy.is_parallel(), sink);

        let outcome = match self.strategy {
            Strategy::Sequential => self.run_sequential(&dirs, &tx).await,
            Strategy::DirectoryParallel => self.run_directory_parallel(dirs, &tx).await,
            Strategy::CaseParallel => self.run_case_parallel(dirs, &tx).await,
        };

        drop(tx);
        let verdict = aggregator
            .await
            .map_err(|e| SystestError::WorkerFailed(format!("result aggregator: {e}")))?;
        outcome?;

        info!(passed = verdict.passed, total = verdict.total, failed = verdict.failed, "suite finished");
        Ok(verdict)
    }

    async fn run_sequential(&self, dirs: &[TestDirectory], tx: &mpsc::Sender<CaseReport>) -> Result<()> {
        for dir in dirs {
            run_directory(
                self.backend.as_ref(),
                dir,
                self.hook_limit,
                &self.interrupt,
                tx,
                None,
            )
            .await?;
        }
        Ok(())
    }

    async fn run_directory_parallel(
        &self,
        dirs: Vec<TestDirectory>,
        tx: &mpsc::Sender<CaseReport>,
    ) -> Result<()> {
        let mut pool = WorkerPool::new(self.jobs);

        for dir in dirs {
            let backend = Arc::clone(&self.backend);
            let interrupt = self.interrupt.clone();
            let tx = tx.clone();
            let limit = self.hook_limit;
            let label = dir.path.display().to_string();

            pool.spawn(label, move |worker| async move {
                run_directory(backend.as_ref(), &dir, limit, &interrupt, &tx, Some(worker)).await
            });
        }

        join_all(&mut pool, tx).await
    }

    async fn run_case_parallel(&self, dirs: Vec<TestDirectory>, tx: &mpsc::Sender<CaseReport>) -> Result<()> {
        let mut pool = WorkerPool::new(self.jobs);
        let limit = self.hook_limit;

        for dir in &dirs {
            let backend = Arc::clone(&self.backend);
            let path = dir.path.clone();
            let label = format!("{}: {}", dir.path.display(), HookKind::Initialize);
            pool.spawn(label, move |_| async move {
                hook_step(backend.as_ref(), &path, HookKind::Initialize, limit).await
            });
        }
        join_all(&mut pool, tx).await?;

        for case in dirs.iter().flat_map(|d| d.cases.iter()) {
            let backend = Arc::clone(&self.backend);
            let case = Arc::clone(case);
            let interrupt = self.interrupt.clone();
            let tx = tx.clone();

            pool.spawn(case.label(), move |worker| async move {
                if *interrupt.borrow() {
                    debug!(case = %case.file.display(), "interrupted; not starting case");
                    return Ok(());
                }
                let report = case_step(backend.as_ref(), &case, Some(worker)).await?;
                send(&tx, report).await
            });
        }
        join_all(&mut pool, tx).await?;

        for dir in &dirs {
            let backend = Arc::clone(&self.backend);
            let path = dir.path.clone();
            let label = format!("{}: {}", dir.path.display(), HookKind::Finalize);
            pool.spawn(label, move |_| async move {
                hook_step(backend.as_ref(), &path, HookKind::Finalize, limit).await
            });
        }
        join_all(&mut pool, tx).await
    }
}

/// Setup, then every case in order, then teardown.
///
/// Teardown runs even when a case step fails fatally; the first error wins.
async fn run_directory<B: SuiteBackend + ?Sized>(
    backend: &B,
    dir: &TestDirectory,
    hook_limit: Duration,
    interrupt: &watch::Receiver<bool>,
    tx: &mpsc::Sender<CaseReport>,
    worker: Option<WorkerId>,
) -> Result<()> {
    debug!(dir = %dir.path.display(), cases = dir.cases.len(), ?worker, "entering directory");

    let mut outcome = hook_step(backend, &dir.path, HookKind::Initialize, hook_limit).await;

    if outcome.is_ok() {
        for case in &dir.cases {
            if *interrupt.borrow() {
                debug!(dir = %dir.path.display(), "interrupted; skipping remaining cases");
                break;
            }
            let step = match case_step(backend, case, worker).await {
                Ok(report) => send(tx, report).await,
                Err(e) => Err(e),
            };
            if let Err(e) = step {
                outcome = Err(e);
                break;
            }
        }
    }

    let teardown = hook_step(backend, &dir.path, HookKind::Finalize, hook_limit).await;
    outcome.and(teardown)
}

async fn hook_step<B: SuiteBackend + ?Sized>(
    backend: &B,
    dir: &Path,
    kind: HookKind,
    limit: Duration,
) -> Result<()> {
    let fut = match kind {
        HookKind::Initialize => backend.setup(dir),
        HookKind::Finalize => backend.teardown(dir),
    };
    match within(limit, fut).await {
        Ok(res) => res,
        Err(e) => {
            warn!(dir = %dir.display(), hook = %kind, error = %e, "hook step abandoned");
            Ok(())
        }
    }
}

async fn case_step<B: SuiteBackend + ?Sized>(
    backend: &B,
    case: &TestCase,
    worker: Option<WorkerId>,
) -> Result<CaseReport> {
    let run = backend.execute(case).await?;
    let report = CaseReport::new(case.label(), run.passed, run.trace);
    Ok(match worker {
        Some(w) => report.on_worker(w),
        None => report,
    })
}

/// Stand-in report for work that never produced one.
fn failed_unit(label: String, err: &JobError) -> CaseReport {
    warn!(unit = %label, error = %err, "unit of work failed");
    let trace = format!("{label}...FAIL ({err})\n");
    CaseReport::new(label, false, trace)
}

async fn send(tx: &mpsc::Sender<CaseReport>, report: CaseReport) -> Result<()> {
    tx.send(report)
        .await
        .map_err(|_| SystestError::WorkerFailed("result aggregator stopped".to_string()))
}

/// Await every pool job in completion order.
///
/// A job that panicked is reported as a failed unit. The first fatal error
/// aborts every job still pending.
async fn join_all(pool: &mut WorkerPool<Result<()>>, tx: &mpsc::Sender<CaseReport>) -> Result<()> {
    while let Some((label, joined)) = pool.join_next().await {
        let result = match joined {
            Ok(res) => res,
            Err(e @ JobError::Panicked(_)) | Err(e @ JobError::TimedOut(_)) => {
                send(tx, failed_unit(label, &e)).await
            }
            Err(e) => Err(SystestError::WorkerFailed(format!("{label}: {e}"))),
        };

        if let Err(e) = result {
            warn!(pending = pool.pending(), error = %e, "fatal error; cancelling remaining work");
            pool.abort_all();
            return Err(e);
        }
    }
    Ok(())
}
