//! In-process activation: the environment a shell would have after sourcing
//! `venv/bin/activate`.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::types::{EnvDelta, LaunchCommand};

pub const PATH_VAR: &str = "PATH";
pub const VIRTUAL_ENV_VAR: &str = "VIRTUAL_ENV";
pub const VIRTUAL_ENV_PROMPT_VAR: &str = "VIRTUAL_ENV_PROMPT";
pub const PYTHONHOME_VAR: &str = "PYTHONHOME";

/// POSIX shell used to source activation scripts.
#[cfg(not(windows))]
const POSIX_SHELL: &str = "/bin/sh";

/// Sources the script given as `$1` with errors fatal, then execs the rest.
#[cfg(not(windows))]
const SOURCE_THEN_EXEC: &str = r#"set -e; . "$1"; shift; exec "$@""#;

/// Sources the script given as `$1` with errors fatal and exits.
#[cfg(not(windows))]
const SOURCE_ONLY: &str = r#"set -e; . "$1""#;

/// Compute the variables to set and remove for an activated environment.
///
/// `venv_root` and `bin_dir` must be absolute; the child may run with a
/// different working directory than the one they were resolved against.
/// `bin_dir` is placed first on the search path, ahead of `inherited_path`.
pub fn activated_env(
    venv_root: &Path,
    bin_dir: &Path,
    prompt: &str,
    inherited_path: Option<&OsStr>,
) -> Result<EnvDelta> {
    let path = prepend_search_path(bin_dir, inherited_path)?;
    Ok(EnvDelta {
        set: vec![
            (OsString::from(PATH_VAR), path),
            (
                OsString::from(VIRTUAL_ENV_VAR),
                venv_root.as_os_str().to_os_string(),
            ),
            (OsString::from(VIRTUAL_ENV_PROMPT_VAR), OsString::from(prompt)),
        ],
        remove: vec![OsString::from(PYTHONHOME_VAR)],
    })
}

/// Put `dir` in front of `inherited` using the platform's list separator.
///
/// An unset or empty inherited value yields just `dir`.
pub fn prepend_search_path(dir: &Path, inherited: Option<&OsStr>) -> Result<OsString> {
    let mut entries: Vec<PathBuf> = vec![dir.to_path_buf()];
    if let Some(existing) = inherited.filter(|value| !value.is_empty()) {
        entries.extend(std::env::split_paths(existing));
    }
    std::env::join_paths(entries)
        .with_context(|| format!("add {} to search path", dir.display()))
}

/// Prompt shown by shells for the environment: the configured prompt, or the
/// venv directory name.
pub fn prompt_for(venv_root: &Path, configured: Option<&str>) -> String {
    if let Some(prompt) = configured.filter(|prompt| !prompt.trim().is_empty()) {
        return prompt.to_string();
    }
    venv_root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "venv".to_string())
}

/// Command that runs the environment's own activation script in a shell and
/// then starts `launch` from that shell.
///
/// The shell stops at the first failing command in the script, so `launch`
/// never starts after a failed activation.
#[cfg(not(windows))]
pub fn shell_activation_command(
    activate_script: &Path,
    launch: &LaunchCommand,
) -> LaunchCommand {
    let mut args = vec![
        OsString::from("-c"),
        OsString::from(SOURCE_THEN_EXEC),
        OsString::from("launcher"),
        activate_script.as_os_str().to_os_string(),
        launch.program.as_os_str().to_os_string(),
    ];
    args.extend(launch.args.iter().cloned());
    LaunchCommand {
        program: PathBuf::from(POSIX_SHELL),
        args,
    }
}

/// Command that only runs the activation script and exits with its status.
///
/// Used in direct mode to reject a broken script before the server starts.
#[cfg(not(windows))]
pub fn activation_check_command(activate_script: &Path) -> LaunchCommand {
    LaunchCommand {
        program: PathBuf::from(POSIX_SHELL),
        args: vec![
            OsString::from("-c"),
            OsString::from(SOURCE_ONLY),
            OsString::from("launcher"),
            activate_script.as_os_str().to_os_string(),
        ],
    }
}

#[cfg(windows)]
pub fn activation_check_command(activate_script: &Path) -> LaunchCommand {
    LaunchCommand {
        program: PathBuf::from("cmd"),
        args: vec![
            OsString::from("/C"),
            OsString::from("call"),
            activate_script.as_os_str().to_os_string(),
        ],
    }
}

#[cfg(windows)]
pub fn shell_activation_command(
    activate_script: &Path,
    launch: &LaunchCommand,
) -> LaunchCommand {
    let mut args = vec![
        OsString::from("/C"),
        OsString::from("call"),
        activate_script.as_os_str().to_os_string(),
        OsString::from("&&"),
        launch.program.as_os_str().to_os_string(),
    ];
    args.extend(launch.args.iter().cloned());
    LaunchCommand {
        program: PathBuf::from("cmd"),
        args,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn bin_dir_is_prepended_to_inherited_path() {
        let delta = activated_env(
            Path::new("/work/venv"),
            Path::new("/work/venv/bin"),
            "venv",
            Some(OsStr::new("/usr/local/bin:/usr/bin")),
        )
        .expect("activate");

        assert_eq!(
            delta.get(PATH_VAR),
            Some(&OsString::from("/work/venv/bin:/usr/local/bin:/usr/bin"))
        );
        assert_eq!(delta.get(VIRTUAL_ENV_VAR), Some(&OsString::from("/work/venv")));
        assert_eq!(delta.get(VIRTUAL_ENV_PROMPT_VAR), Some(&OsString::from("venv")));
        assert_eq!(delta.remove, vec![OsString::from(PYTHONHOME_VAR)]);
    }

    #[test]
    fn unset_path_yields_bin_dir_only() {
        let bin = Path::new("venv").join("bin");
        let path = prepend_search_path(&bin, None).expect("path");
        assert_eq!(path, bin.as_os_str());

        let path = prepend_search_path(&bin, Some(OsStr::new(""))).expect("path");
        assert_eq!(path, bin.as_os_str());
    }

    #[cfg(unix)]
    #[test]
    fn bin_dir_containing_separator_is_rejected() {
        let err = prepend_search_path(Path::new("/odd:dir/bin"), None).unwrap_err();
        assert!(err.to_string().contains("search path"));
    }

    #[cfg(unix)]
    #[test]
    fn shell_command_sources_script_before_server() {
        let launch = LaunchCommand::new("jupyter", &["notebook"]);
        let cmd = shell_activation_command(Path::new("/work/venv/bin/activate"), &launch);

        assert_eq!(cmd.program, PathBuf::from("/bin/sh"));
        assert_eq!(
            cmd.args[2..],
            [
                OsString::from("launcher"),
                OsString::from("/work/venv/bin/activate"),
                OsString::from("jupyter"),
                OsString::from("notebook"),
            ]
        );
        assert!(cmd.args[1].to_string_lossy().starts_with("set -e;"));
    }

    #[cfg(unix)]
    #[test]
    fn check_command_sources_script_without_launching() {
        let cmd = activation_check_command(Path::new("/work/venv/bin/activate"));

        assert_eq!(cmd.program, PathBuf::from("/bin/sh"));
        assert_eq!(
            cmd.args[1..],
            [
                OsString::from(r#"set -e; . "$1""#),
                OsString::from("launcher"),
                OsString::from("/work/venv/bin/activate"),
            ]
        );
    }

    #[test]
    fn prompt_prefers_configured_value() {
        assert_eq!(prompt_for(Path::new("/work/venv"), Some("pubcrawl")), "pubcrawl");
        assert_eq!(prompt_for(Path::new("/work/venv"), Some("  ")), "venv");
        assert_eq!(prompt_for(Path::new("/work/.env"), None), ".env");
    }
}
