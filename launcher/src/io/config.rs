//! Launcher configuration read from `launcher.toml` in the working directory.
//!
//! Only how the launch happens is configurable. The environment directory
//! (`venv`) and the server command (`jupyter notebook`) are fixed.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::types::ActivationMode;

pub const CONFIG_FILE_NAME: &str = "launcher.toml";

/// Launcher configuration (TOML).
///
/// The file is optional and only read once `venv` is known to exist.
/// Missing fields fall back to the defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LauncherConfig {
    pub activation: ActivationMode,

    /// On unix, replace the launcher process with the server instead of
    /// waiting for it.
    pub replace_process: bool,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            activation: ActivationMode::Direct,
            replace_process: true,
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `LauncherConfig::default()`.
pub fn load_config(path: &Path) -> Result<LauncherConfig> {
    if !path.exists() {
        return Ok(LauncherConfig::default());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}
