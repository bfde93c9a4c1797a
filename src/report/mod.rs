// src/report/mod.rs

//! Result reporting: the verdict aggregator and the diff report file.

pub mod aggregator;
pub mod diff_report;

pub use aggregator::{CaseReport, ResultAggregator, SuiteVerdict};
pub use diff_report::DiffReport;
