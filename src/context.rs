// src/context.rs

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::RunOptions;
use crate::fs::FileSystem;
use crate::report::DiffReport;

/// Everything a test case needs while it runs.
///
/// Cheap to clone; each worker carries its own copy, so there is no
/// process-wide mutable state (in particular, no shared current directory).
#[derive(Debug, Clone)]
pub struct RunContext {
    pub options: Arc<RunOptions>,
    pub fs: Arc<dyn FileSystem>,
    pub diff_report: Option<Arc<DiffReport>>,
    pub interrupt: watch::Receiver<bool>,
}

impl RunContext {
    pub fn new(
        options: Arc<RunOptions>,
        fs: Arc<dyn FileSystem>,
        diff_report: Option<Arc<DiffReport>>,
        interrupt: watch::Receiver<bool>,
    ) -> Self {
        Self {
            options,
            fs,
            diff_report,
            interrupt,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        *self.interrupt.borrow()
    }
}
