// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`runner`] runs one test command with a watchdog and captures its
//!   output ([`run_with_timeout`]).
//! - [`capture`] owns the temporary files the child writes into.
//! - [`hooks`] runs the per-directory `initialize` / `finalize` hooks.
//!
//! Every child gets its working directory explicitly; nothing here touches
//! the process-wide current directory.

pub mod capture;
pub mod hooks;
pub mod runner;

pub use hooks::{run_hook, HookKind, HookOutcome};
pub use runner::{
    run_with_timeout, ExecutionOutcome, Interruption, Recovery, RunRequest, POLL_INTERVAL,
};
