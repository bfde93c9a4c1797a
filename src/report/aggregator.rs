// src/report/aggregator.rs

//! Reduces per-case reports into one [`SuiteVerdict`].
//!
//! Workers never write to the terminal themselves. They send a
//! [`CaseReport`] over an mpsc channel; a single aggregator task prints the
//! trace (tagged with the worker when several can run at once) and folds the
//! verdict. The result does not depend on arrival order.

use std::io::Write;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::types::WorkerId;

/// Result of one case (or of a failed unit of pool work).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseReport {
    pub worker: Option<WorkerId>,
    pub label: String,
    pub passed: bool,
    /// Lines produced while the case ran; may be empty.
    pub trace: String,
}

impl CaseReport {
    pub fn new(label: impl Into<String>, passed: bool, trace: impl Into<String>) -> Self {
        Self {
            worker: None,
            label: label.into(),
            passed,
            trace: trace.into(),
        }
    }

    pub fn on_worker(mut self, worker: WorkerId) -> Self {
        self.worker = Some(worker);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteVerdict {
    /// `true` iff every recorded report passed. An empty suite passes.
    pub passed: bool,
    pub total: usize,
    pub failed: usize,
    /// Printed lines, in arrival order.
    pub log: Vec<String>,
}

pub struct ResultAggregator {
    tag_workers: bool,
    total: usize,
    failed: usize,
    log: Vec<String>,
    sink: Option<Box<dyn Write + Send>>,
}

impl ResultAggregator {
    pub fn new(tag_workers: bool) -> Self {
        Self {
            tag_workers,
            total: 0,
            failed: 0,
            log: Vec::new(),
            sink: None,
        }
    }

    /// Echo every recorded line to `sink` as well.
    pub fn with_sink(mut self, sink: Box<dyn Write + Send>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn record(&mut self, report: CaseReport) {
        self.total += 1;
        if !report.passed {
            self.failed += 1;
            debug!(case = %report.label, "case failed");
        }

        let prefix = match (self.tag_workers, report.worker) {
            (true, Some(w)) => format!("[{w}] "),
            _ => String::new(),
        };

        for line in report.trace.lines() {
            let line = format!("{prefix}{line}");
            if let Some(sink) = self.sink.as_mut() {
                if let Err(e) = writeln!(sink, "{line}") {
                    warn!(error = %e, "writing result line failed");
                }
            }
            self.log.push(line);
        }
    }

    pub fn finish(mut self) -> SuiteVerdict {
        if let Some(sink) = self.sink.as_mut() {
            let _ = sink.flush();
        }
        SuiteVerdict {
            passed: self.failed == 0,
            total: self.total,
            failed: self.failed,
            log: self.log,
        }
    }

    /// Run an aggregator on its own task.
    ///
    /// The verdict is returned once every sender has been dropped.
    pub fn spawn(
        tag_workers: bool,
        sink: Box<dyn Write + Send>,
    ) -> (mpsc::Sender<CaseReport>, JoinHandle<SuiteVerdict>) {
        let (tx, mut rx) = mpsc::channel::<CaseReport>(64);
        let mut aggregator = ResultAggregator::new(tag_workers).with_sink(sink);

        let handle = tokio::spawn(async move {
            while let Some(report) = rx.recv().await {
                aggregator.record(report);
            }
            aggregator.finish()
        });

        (tx, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_suite_passes() {
        let verdict = ResultAggregator::new(false).finish();
        assert!(verdict.passed);
        assert_eq!(verdict.total, 0);
    }

    #[test]
    fn one_failure_fails_the_suite() {
        let mut agg = ResultAggregator::new(false);
        agg.record(CaseReport::new("a", true, ""));
        agg.record(CaseReport::new("b", false, "b...FAIL (0m0.010s)\n"));
        agg.record(CaseReport::new("c", true, ""));

        let verdict = agg.finish();
        assert!(!verdict.passed);
        assert_eq!((verdict.total, verdict.failed), (3, 1));
        assert_eq!(verdict.log, vec!["b...FAIL (0m0.010s)"]);
    }

    #[test]
    fn lines_are_tagged_only_when_workers_interleave() {
        let report = CaseReport::new("a", true, "x\ny\n").on_worker(WorkerId(2));

        let mut tagged = ResultAggregator::new(true);
        tagged.record(report.clone());
        assert_eq!(tagged.finish().log, vec!["[worker 2] x", "[worker 2] y"]);

        let mut plain = ResultAggregator::new(false);
        plain.record(report);
        assert_eq!(plain.finish().log, vec!["x", "y"]);
    }

    #[tokio::test]
    async fn spawned_aggregator_collects_until_senders_drop() {
        let (tx, handle) = ResultAggregator::spawn(false, Box::new(std::io::sink()));
        let tx2 = tx.clone();
        tx.send(CaseReport::new("a", true, "")).await.unwrap();
        tx2.send(CaseReport::new("b", true, "")).await.unwrap();
        drop(tx);
        drop(tx2);

        let verdict = handle.await.unwrap();
        assert!(verdict.passed);
        assert_eq!(verdict.total, 2);
    }
}
