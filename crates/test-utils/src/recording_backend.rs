use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use systest::case::TestCase;
use systest::errors::{Result, SystestError};
use systest::sched::{BoxFuture, CaseRun, SuiteBackend};

/// What the scheduler asked the backend to do, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Setup(PathBuf),
    Started(PathBuf),
    Finished(PathBuf),
    Teardown(PathBuf),
}

/// A fake backend that:
/// - records setup / execute / teardown calls
/// - never spawns processes
/// - passes every case except the ones marked failing
/// - returns a fatal error for the ones marked fatal
#[derive(Debug, Default)]
pub struct RecordingBackend {
    events: Arc<Mutex<Vec<Event>>>,
    failing: HashSet<PathBuf>,
    fatal: HashSet<PathBuf>,
    case_delay: Duration,
    delays: HashMap<PathBuf, Duration>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every case, to make workers overlap.
    pub fn with_case_delay(mut self, delay: Duration) -> Self {
        self.case_delay = delay;
        self
    }

    /// Sleep `delay` inside this one case instead of the common delay.
    pub fn slow(mut self, case_file: impl Into<PathBuf>, delay: Duration) -> Self {
        self.delays.insert(case_file.into(), delay);
        self
    }

    pub fn failing(mut self, case_file: impl Into<PathBuf>) -> Self {
        self.failing.insert(case_file.into());
        self
    }

    /// Fail this case the way a command that cannot be spawned does.
    pub fn fatal(mut self, case_file: impl Into<PathBuf>) -> Self {
        self.fatal.insert(case_file.into());
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl SuiteBackend for RecordingBackend {
    fn setup<'a>(&'a self, dir: &'a Path) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.push(Event::Setup(dir.to_path_buf()));
            Ok(())
        })
    }

    fn execute<'a>(&'a self, case: &'a TestCase) -> BoxFuture<'a, Result<CaseRun>> {
        Box::pin(async move {
            self.push(Event::Started(case.file.clone()));
            if self.fatal.contains(&case.file) {
                return Err(SystestError::Spawn {
                    command: case.command(),
                    source: io::Error::new(io::ErrorKind::NotFound, "no such program"),
                });
            }
            let delay = self.delays.get(&case.file).copied().unwrap_or(self.case_delay);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            self.push(Event::Finished(case.file.clone()));

            let passed = !self.failing.contains(&case.file);
            let trace = if passed {
                String::new()
            } else {
                format!("{}...FAIL (0m0.000s)\n", case.label())
            };
            Ok(CaseRun { passed, trace })
        })
    }

    fn teardown<'a>(&'a self, dir: &'a Path) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.push(Event::Teardown(dir.to_path_buf()));
            Ok(())
        })
    }
}
