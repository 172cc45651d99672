//! Locating and inspecting the virtual environment directory.
//!
//! Everything here is read-only. The launcher never creates or repairs the
//! environment.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::process::{build_command, run_foreground};
use crate::core::activation::activation_check_command;
use crate::core::pyvenv::{PyvenvCfg, parse_pyvenv_cfg};
use crate::core::types::EnvDelta;
use crate::error::LaunchError;
use crate::exit_codes;

#[cfg(windows)]
const BIN_DIR_NAME: &str = "Scripts";
#[cfg(not(windows))]
const BIN_DIR_NAME: &str = "bin";

#[cfg(windows)]
const ACTIVATE_SCRIPT_NAME: &str = "activate.bat";
#[cfg(not(windows))]
const ACTIVATE_SCRIPT_NAME: &str = "activate";

const PYVENV_CFG_NAME: &str = "pyvenv.cfg";

/// Canonical paths inside a virtual environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenvPaths {
    pub root: PathBuf,
    pub bin_dir: PathBuf,
    pub activate_script: PathBuf,
    pub cfg_path: PathBuf,
}

impl VenvPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let bin_dir = root.join(BIN_DIR_NAME);
        Self {
            root: root.clone(),
            activate_script: bin_dir.join(ACTIVATE_SCRIPT_NAME),
            bin_dir,
            cfg_path: root.join(PYVENV_CFG_NAME),
        }
    }
}

/// An environment that passed inspection and can be activated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Venv {
    pub paths: VenvPaths,
    pub cfg: Option<PyvenvCfg>,
}

/// Resolve the environment directory under `workdir`.
///
/// Returns the absolute path when it is a directory, `None` when it is absent.
/// A non-directory at that path counts as absent.
pub fn locate_venv(workdir: &Path, venv_dir: &Path) -> Result<Option<PathBuf>> {
    let candidate = workdir.join(venv_dir);
    if !candidate.is_dir() {
        debug!(path = %candidate.display(), "virtual environment not found");
        return Ok(None);
    }
    let root = std::path::absolute(&candidate)
        .with_context(|| format!("resolve {}", candidate.display()))?;
    Ok(Some(root))
}

/// Check that `root` exposes an activation entry point and a readable
/// `pyvenv.cfg`.
///
/// A missing `pyvenv.cfg` only logs a warning; a malformed one fails.
pub fn inspect_venv(root: &Path) -> Result<Venv> {
    let paths = VenvPaths::new(root);
    let activation_error = |reason: String| LaunchError::Activation {
        venv: root.to_path_buf(),
        reason,
    };

    if !paths.bin_dir.is_dir() {
        return Err(activation_error(format!(
            "missing {} directory",
            paths.bin_dir.display()
        ))
        .into());
    }
    if !paths.activate_script.is_file() {
        return Err(activation_error(format!(
            "missing activation script {}",
            paths.activate_script.display()
        ))
        .into());
    }

    let cfg = if paths.cfg_path.is_file() {
        let contents = fs::read_to_string(&paths.cfg_path)
            .with_context(|| format!("read {}", paths.cfg_path.display()))?;
        let cfg = parse_pyvenv_cfg(&contents).map_err(|err| {
            activation_error(format!("malformed {}: {err}", paths.cfg_path.display()))
        })?;
        debug!(home = ?cfg.home, version = ?cfg.version, "read pyvenv.cfg");
        Some(cfg)
    } else {
        warn!(path = %paths.cfg_path.display(), "pyvenv.cfg missing, continuing");
        None
    };

    Ok(Venv { paths, cfg })
}

/// Run the activation script in a throwaway shell and fail if it does.
///
/// Nothing from the shell is kept; only its exit status matters. The
/// script's stdout is discarded and its stderr goes to the user.
pub fn verify_activation(venv: &Venv) -> Result<()> {
    let script = &venv.paths.activate_script;
    let activation_error = |reason: String| LaunchError::Activation {
        venv: venv.paths.root.clone(),
        reason,
    };

    let check = activation_check_command(script);
    let mut cmd = build_command(&check, &EnvDelta::default(), &venv.paths.root);
    cmd.stdin(Stdio::null()).stdout(Stdio::null());
    let code = run_foreground(cmd, "activate", false)
        .map_err(|err| activation_error(format!("run {}: {err}", script.display())))?;
    if code != exit_codes::OK {
        return Err(activation_error(format!(
            "activation script {} failed with exit code {code}",
            script.display()
        ))
        .into());
    }
    debug!(script = %script.display(), "activation script ok");
    Ok(())
}
