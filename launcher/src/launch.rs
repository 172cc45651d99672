//! Orchestration for launching the notebook server.
//!
//! A launch is three steps gated by one precondition: the environment
//! directory must exist. Then the environment is activated and the server
//! runs in the foreground. Nothing is written to disk at any step.

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::core::activation::{PATH_VAR, activated_env, prompt_for, shell_activation_command};
use crate::core::types::{ActivationMode, EnvDelta, LaunchCommand};
use crate::error::LaunchError;
use crate::io::config::{CONFIG_FILE_NAME, LauncherConfig, load_config};
use crate::io::process::{build_command, resolve_program, run_foreground};
use crate::io::venv::{inspect_venv, locate_venv, verify_activation};

/// Environment directory, relative to the working directory.
pub const VENV_DIR: &str = "venv";
/// Notebook server program, resolved on the activated search path.
pub const SERVER_PROGRAM: &str = "jupyter";
pub const SERVER_ARGS: &[&str] = &["notebook"];

/// Printed to stdout, line by line, when the environment directory is missing.
pub const MISSING_VENV_MESSAGE: [&str; 2] = [
    "Keine virtuelle Umgebung gefunden (Ordner 'venv' fehlt).",
    "Bitte zuerst erstellen mit: python3 -m venv venv",
];

/// Outcome of `launch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The environment directory does not exist; nothing was started.
    MissingVenv { path: PathBuf },
    /// The server ran and exited with `code`.
    Exited { code: i32 },
}

/// Everything needed to start the server, computed before anything runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
    pub venv_root: PathBuf,
    pub command: LaunchCommand,
    pub env: EnvDelta,
}

/// Return the absolute `venv` path if it exists, `None` if it is missing.
pub fn check_precondition(workdir: &Path) -> Result<Option<PathBuf>> {
    locate_venv(workdir, Path::new(VENV_DIR))
}

/// Activate the environment at `venv_root` and resolve the server command.
///
/// `inherited_path` is the launcher's own `PATH`. Fails before the server is
/// started when the environment cannot be activated or the program is not
/// found.
pub fn prepare(
    venv_root: &Path,
    cfg: &LauncherConfig,
    inherited_path: Option<&OsStr>,
) -> Result<Prepared> {
    let venv = inspect_venv(venv_root)?;
    let server = LaunchCommand::new(SERVER_PROGRAM, SERVER_ARGS);

    let (command, env) = match cfg.activation {
        ActivationMode::Direct => {
            verify_activation(&venv)?;
            let prompt = prompt_for(
                venv_root,
                venv.cfg.as_ref().and_then(|cfg| cfg.prompt.as_deref()),
            );
            let env = activated_env(venv_root, &venv.paths.bin_dir, &prompt, inherited_path)
                .map_err(|err| LaunchError::Activation {
                    venv: venv_root.to_path_buf(),
                    reason: format!("{err:#}"),
                })?;
            let search_path = env.get(PATH_VAR).map(|path| path.as_os_str());
            let program = resolve_program(&server.program, search_path)?;
            let command = LaunchCommand {
                program,
                args: server.args,
            };
            (command, env)
        }
        ActivationMode::Shell => {
            let shell = shell_activation_command(&venv.paths.activate_script, &server);
            let program = resolve_program(&shell.program, inherited_path)?;
            let command = LaunchCommand {
                program,
                args: shell.args,
            };
            (command, EnvDelta::default())
        }
    };

    debug!(command = %command.display(), mode = ?cfg.activation, "prepared launch");
    Ok(Prepared {
        venv_root: venv_root.to_path_buf(),
        command,
        env,
    })
}

/// Check for `venv` in `workdir`, then read `launcher.toml` and run the
/// server.
///
/// The config file is only read once the environment is known to exist, so
/// a missing environment always yields `MissingVenv`.
pub fn launch(workdir: &Path) -> Result<LaunchOutcome> {
    let Some(venv_root) = check_precondition(workdir)? else {
        return Ok(LaunchOutcome::MissingVenv {
            path: workdir.join(VENV_DIR),
        });
    };

    let cfg = load_config(&workdir.join(CONFIG_FILE_NAME))?;
    debug!(?cfg, "loaded config");
    let code = run_server(workdir, &venv_root, &cfg)?;
    Ok(LaunchOutcome::Exited { code })
}

/// Activate `venv_root` and run the server from `workdir`.
///
/// With process replacement on unix this does not return on success.
pub fn run_server(workdir: &Path, venv_root: &Path, cfg: &LauncherConfig) -> Result<i32> {
    let inherited_path = env::var_os(PATH_VAR);
    let prepared = prepare(venv_root, cfg, inherited_path.as_deref())?;

    info!(
        venv = %prepared.venv_root.display(),
        command = %prepared.command.display(),
        "starting notebook server"
    );
    let cmd = build_command(&prepared.command, &prepared.env, workdir);
    run_foreground(cmd, SERVER_PROGRAM, cfg.replace_process).context("launch notebook server")
}
