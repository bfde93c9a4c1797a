// src/config/mod.rs

//! Configuration for systest.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants (`validate.rs`).
//! - Merge the config with CLI flags into [`RunOptions`] (`options.rs`).

pub mod loader;
pub mod model;
pub mod options;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, resolve};
pub use model::{ConfigFile, RawConfigFile, RunSection, DEFAULT_WATCHDOG_SECS};
pub use options::RunOptions;
