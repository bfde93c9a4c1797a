// src/config/model.rs

use serde::Deserialize;

/// Default watchdog: four hours per command invocation.
pub const DEFAULT_WATCHDOG_SECS: u64 = 4 * 60 * 60;

/// Raw configuration as read from a TOML file, before validation.
///
/// ```toml
/// [run]
/// watchdog_secs = 600
/// parallel_processes = 8
/// all_parallel = false
/// diff_file = "difference.txt"
/// disabled_suffix = ".disabled"
/// ```
///
/// Every key is optional. Use `ConfigFile::try_from` to obtain a validated
/// [`ConfigFile`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub run: RunSection,
}

/// `[run]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    /// Seconds a single command may run before it is killed.
    #[serde(default = "default_watchdog_secs")]
    pub watchdog_secs: u64,

    /// Worker pool size; `None` means the host's available parallelism.
    #[serde(default)]
    pub parallel_processes: Option<usize>,

    /// Run every case independently after all `initialize` hooks.
    #[serde(default)]
    pub all_parallel: bool,

    /// Where the diff report is written when differences are requested.
    #[serde(default = "default_diff_file")]
    pub diff_file: String,

    /// Suffix of the marker file that disables a test case.
    #[serde(default = "default_disabled_suffix")]
    pub disabled_suffix: String,
}

fn default_watchdog_secs() -> u64 {
    DEFAULT_WATCHDOG_SECS
}

fn default_diff_file() -> String {
    "difference.txt".to_string()
}

fn default_disabled_suffix() -> String {
    ".disabled".to_string()
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            watchdog_secs: default_watchdog_secs(),
            parallel_processes: None,
            all_parallel: false,
            diff_file: default_diff_file(),
            disabled_suffix: default_disabled_suffix(),
        }
    }
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>` (see `validate.rs`)
/// or [`ConfigFile::default`].
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub run: RunSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(run: RunSection) -> Self {
        Self { run }
    }
}
