// src/config.rs

//! Configuration loading utilities.
//!
//! Resolution order, later wins: built-in defaults, `config.toml`,
//! environment variables (including a `.env` file loaded by the CLI),
//! command-line overrides.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::Config;

/// Name of the configuration file inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Command-line values that take precedence over file and environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// Where to read configuration from when no path was given.
pub fn config_path(explicit: Option<&Path>, data_dir: &Path) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| data_dir.join(CONFIG_FILE))
}

/// Load configuration from a TOML file.
///
/// A missing file yields the defaults; a malformed one is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        log::debug!("No config file at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    let config = Config::load(path)?;
    log::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Like [`load_config`], but a malformed file only logs a warning.
pub fn load_config_lenient(path: &Path) -> Config {
    if !path.exists() {
        log::debug!("No config file at {}, using defaults", path.display());
        return Config::default();
    }
    Config::load_or_default(path)
}

/// Load the file, overlay the environment and apply overrides.
///
/// `strict` turns a malformed file into an error instead of defaults.
pub fn load_effective(path: &Path, overrides: &Overrides, strict: bool) -> Result<Config> {
    let mut config = if strict {
        load_config(path)?
    } else {
        load_config_lenient(path)
    };
    config.apply_env();
    apply_overrides(&mut config, overrides);
    Ok(config)
}

/// `env_logger` filter for the effective configuration.
///
/// `quiet` keeps errors only; a blank level means `info`. `RUST_LOG` still
/// takes precedence when the logger is built.
pub fn log_filter(config: &Config, quiet: bool) -> String {
    let level = config.logging.level.trim();
    if quiet {
        "error".to_string()
    } else if level.is_empty() {
        "info".to_string()
    } else {
        level.to_string()
    }
}

fn apply_overrides(config: &mut Config, overrides: &Overrides) {
    if let Some(dir) = &overrides.data_dir {
        config.paths.data_dir = dir.clone();
    }
    if let Some(level) = &overrides.log_level {
        config.logging.level = level.clone();
    }
}
