// src/lib.rs

pub mod case;
pub mod cli;
pub mod config;
pub mod context;
pub mod diff;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod report;
pub mod sched;
pub mod suite;
pub mod types;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::RunOptions;
use crate::context::RunContext;
use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};
use crate::report::DiffReport;
use crate::sched::{RealBackend, Scheduler};
use crate::suite::{discover, group_by_directory, load_selected};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - test discovery (or explicit selection)
/// - the optional diff report
/// - Ctrl-C handling
/// - the scheduler
///
/// Returns the suite verdict. `Err` means the run was aborted.
pub async fn run(args: CliArgs) -> Result<bool> {
    let cfg = config::resolve(args.config.as_deref(), &args.root)?;
    let options = Arc::new(RunOptions::resolve(&args, &cfg));
    debug!(?options, "effective run options");

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let cases = if args.test_cases.is_empty() {
        discover(fs.as_ref(), &args.root)?
    } else {
        load_selected(fs.as_ref(), &args.test_cases)?
    };
    let dirs = group_by_directory(cases);

    let diff_report = if options.output_diff {
        Some(Arc::new(DiffReport::create(&options.diff_file)?))
    } else {
        None
    };

    // Ctrl-C → stop starting new cases, kill running children.
    let (interrupt_tx, interrupt) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            return;
        }
        warn!("interrupt received; stopping");
        let _ = interrupt_tx.send(true);
    });

    let ctx = RunContext::new(
        Arc::clone(&options),
        fs,
        diff_report.clone(),
        interrupt.clone(),
    );
    let scheduler = Scheduler::new(
        Arc::new(RealBackend::new(ctx)),
        options.strategy,
        options.jobs,
        options.watchdog,
        interrupt.clone(),
    );

    let verdict = scheduler.run(dirs, Box::new(std::io::stdout())).await?;
    let interrupted = *interrupt.borrow();
    let passed = verdict.passed && !interrupted;
    info!(passed, interrupted, total = verdict.total, failed = verdict.failed, "run complete");

    if let Some(report) = diff_report {
        if report.finish(passed)? {
            eprintln!(
                "Differences found against verification data are stored into {}",
                report.path().display()
            );
        }
    }

    Ok(passed)
}
