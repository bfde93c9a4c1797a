// src/sched/mod.rs

//! Scheduling of test directories and cases.
//!
//! - [`scheduler`] implements the three [`Strategy`] variants.
//! - [`pool`] is the fixed-size worker pool used by the parallel ones.
//! - [`backend`] is the seam between scheduling and actual execution.

pub mod backend;
pub mod pool;
pub mod scheduler;

pub use crate::types::{Strategy, WorkerId};
pub use backend::{BoxFuture, CaseRun, RealBackend, SuiteBackend};
pub use pool::{JobError, WorkerPool};
pub use scheduler::{Scheduler, STEP_GRACE};
