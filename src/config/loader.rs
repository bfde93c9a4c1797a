// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Name of the config file looked up in the test root when `--config` is
/// not given.
pub const DEFAULT_CONFIG_NAME: &str = "Systest.toml";

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization. Use [`load_and_validate`] for
/// the validated form.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the effective config.
///
/// - An explicit path must exist and parse.
/// - Otherwise `Systest.toml` in `root` is used if present.
/// - Otherwise built-in defaults apply.
pub fn resolve(explicit: Option<&Path>, root: &Path) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        debug!(path = %path.display(), "loading explicit config");
        return load_and_validate(path);
    }

    let implicit = default_config_path(root);
    if implicit.is_file() {
        debug!(path = %implicit.display(), "loading config from test root");
        return load_and_validate(&implicit);
    }

    Ok(ConfigFile::default())
}

pub fn default_config_path(root: &Path) -> PathBuf {
    root.join(DEFAULT_CONFIG_NAME)
}
