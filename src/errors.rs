// src/errors.rs

//! Crate-wide error type.
//!
//! Every `Err` that reaches [`crate::run`] aborts the whole suite. Per-case
//! failures (timeouts, output mismatches) are never errors; they travel as
//! `false` verdicts instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::exec::Interruption;

#[derive(Error, Debug)]
pub enum SystestError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Cannot open {}.", .0.display())]
    UnreadableTestCase(PathBuf),

    #[error("More than 1 stdin files for {}: {inputs:?}", output.display())]
    AmbiguousInput {
        output: PathBuf,
        inputs: Vec<PathBuf>,
    },

    #[error("Could not create process for `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` was interrupted and no output could be recovered: {cause}")]
    Interrupted {
        command: String,
        cause: Interruption,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("worker task failed: {0}")]
    WorkerFailed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SystestError>;
