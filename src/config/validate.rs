// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile, RunSection};
use crate::errors::{Result, SystestError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SystestError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_run_section(&raw.run)?;
        Ok(ConfigFile::new_unchecked(raw.run))
    }
}

fn validate_run_section(run: &RunSection) -> Result<()> {
    if run.watchdog_secs == 0 {
        return Err(SystestError::ConfigError(
            "[run].watchdog_secs must be >= 1 (got 0)".to_string(),
        ));
    }

    if run.parallel_processes == Some(0) {
        return Err(SystestError::ConfigError(
            "[run].parallel_processes must be >= 1 (got 0)".to_string(),
        ));
    }

    if run.diff_file.trim().is_empty() {
        return Err(SystestError::ConfigError(
            "[run].diff_file must not be empty".to_string(),
        ));
    }

    if run.disabled_suffix.is_empty() {
        return Err(SystestError::ConfigError(
            "[run].disabled_suffix must not be empty".to_string(),
        ));
    }

    Ok(())
}
