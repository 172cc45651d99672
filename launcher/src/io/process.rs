//! Helpers for resolving and running the server process in the foreground.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use tracing::{debug, error, instrument};

use crate::core::status::exit_code_for;
use crate::core::types::{EnvDelta, LaunchCommand};
use crate::error::LaunchError;

#[cfg(windows)]
const EXECUTABLE_EXTENSIONS: &[&str] = &["exe", "cmd", "bat"];

/// Find `program` on `search_path` the way a shell would.
///
/// Names with a directory component are checked as given. Otherwise each
/// search path entry is tried in order and the first executable match wins.
/// A match that exists but is not executable is reported only when nothing
/// executable was found.
pub fn resolve_program(
    program: &Path,
    search_path: Option<&OsStr>,
) -> Result<PathBuf, LaunchError> {
    if program.components().count() > 1 {
        return match classify(program) {
            Candidate::Executable(path) => Ok(path),
            Candidate::NotExecutable(path) => Err(LaunchError::NotExecutable { path }),
            Candidate::Missing => Err(LaunchError::ProgramNotFound {
                program: program.display().to_string(),
            }),
        };
    }

    let mut not_executable = None;
    for dir in search_path.map(std::env::split_paths).into_iter().flatten() {
        let dir = if dir.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            dir
        };
        match classify(&dir.join(program)) {
            Candidate::Executable(path) => {
                debug!(path = %path.display(), "resolved program");
                return Ok(path);
            }
            Candidate::NotExecutable(path) => {
                not_executable.get_or_insert(path);
            }
            Candidate::Missing => {}
        }
    }

    match not_executable {
        Some(path) => Err(LaunchError::NotExecutable { path }),
        None => Err(LaunchError::ProgramNotFound {
            program: program.display().to_string(),
        }),
    }
}

enum Candidate {
    Executable(PathBuf),
    #[cfg_attr(windows, allow(dead_code))]
    NotExecutable(PathBuf),
    Missing,
}

#[cfg(not(windows))]
fn classify(candidate: &Path) -> Candidate {
    use std::os::unix::fs::PermissionsExt;

    match std::fs::metadata(candidate) {
        Ok(meta) if meta.is_file() && meta.permissions().mode() & 0o111 != 0 => {
            Candidate::Executable(candidate.to_path_buf())
        }
        Ok(meta) if meta.is_file() => Candidate::NotExecutable(candidate.to_path_buf()),
        _ => Candidate::Missing,
    }
}

#[cfg(windows)]
fn classify(candidate: &Path) -> Candidate {
    if candidate.extension().is_some() && candidate.is_file() {
        return Candidate::Executable(candidate.to_path_buf());
    }
    EXECUTABLE_EXTENSIONS
        .iter()
        .map(|ext| candidate.with_extension(ext))
        .find(|path| path.is_file())
        .map_or(Candidate::Missing, Candidate::Executable)
}

/// Build a `Command` for `launch` with the environment changes applied on
/// top of the inherited environment. Stdio is inherited.
pub fn build_command(launch: &LaunchCommand, env: &EnvDelta, workdir: &Path) -> Command {
    let mut cmd = Command::new(&launch.program);
    cmd.args(&launch.args).current_dir(workdir);
    for key in &env.remove {
        cmd.env_remove(key);
    }
    for (key, value) in &env.set {
        cmd.env(key, value);
    }
    cmd
}

/// Run `cmd` in the foreground and return the exit code to report.
///
/// With `replace` on unix the current process image is replaced, so this
/// only returns on failure. Elsewhere `replace` is ignored and the launcher
/// waits for the child.
#[instrument(skip_all, fields(program = %label, replace = replace))]
pub fn run_foreground(cmd: Command, label: &str, replace: bool) -> Result<i32, LaunchError> {
    if replace {
        #[cfg(unix)]
        return exec(cmd, label);
        #[cfg(not(unix))]
        debug!("process replacement unavailable, waiting for child instead");
    }
    spawn_and_wait(cmd, label)
}

#[cfg(unix)]
fn exec(mut cmd: Command, label: &str) -> Result<i32, LaunchError> {
    use std::os::unix::process::CommandExt;

    debug!("replacing launcher process");
    let err = cmd.exec();
    error!(err = %err, "exec failed");
    Err(LaunchError::Spawn {
        program: label.to_string(),
        source: err,
    })
}

fn spawn_and_wait(mut cmd: Command, label: &str) -> Result<i32, LaunchError> {
    debug!("spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(LaunchError::Spawn {
                program: label.to_string(),
                source: e,
            });
        }
    };
    let status = child.wait().map_err(|source| LaunchError::Spawn {
        program: label.to_string(),
        source,
    })?;
    let code = exit_code_from_status(status);
    debug!(exit_code = code, "command finished");
    Ok(code)
}

/// Translate a platform exit status into the launcher's exit code.
pub fn exit_code_from_status(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    let signal = {
        use std::os::unix::process::ExitStatusExt;
        status.signal()
    };
    #[cfg(not(unix))]
    let signal = None;
    exit_code_for(status.code(), signal)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::core::activation::prepend_search_path;
    use crate::test_support::write_script;
    use std::ffi::OsString;
    use std::fs;

    #[test]
    fn resolves_first_executable_on_search_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let first = temp.path().join("first");
        let second = temp.path().join("second");
        fs::create_dir_all(&first).expect("mkdir");
        fs::create_dir_all(&second).expect("mkdir");
        write_script(&second.join("jupyter"), "exit 0\n").expect("script");

        let search = prepend_search_path(&first, Some(second.as_os_str())).expect("path");
        let resolved = resolve_program(Path::new("jupyter"), Some(&search)).expect("resolve");
        assert_eq!(resolved, second.join("jupyter"));
    }

    #[test]
    fn skips_non_executable_match() {
        let temp = tempfile::tempdir().expect("tempdir");
        let first = temp.path().join("first");
        let second = temp.path().join("second");
        fs::create_dir_all(&first).expect("mkdir");
        fs::create_dir_all(&second).expect("mkdir");
        fs::write(first.join("jupyter"), "not executable").expect("write");
        write_script(&second.join("jupyter"), "exit 0\n").expect("script");

        let search = prepend_search_path(&first, Some(second.as_os_str())).expect("path");
        let resolved = resolve_program(Path::new("jupyter"), Some(&search)).expect("resolve");
        assert_eq!(resolved, second.join("jupyter"));
    }

    #[test]
    fn reports_non_executable_when_nothing_else_matches() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("jupyter"), "not executable").expect("write");

        let err = resolve_program(Path::new("jupyter"), Some(temp.path().as_os_str()))
            .unwrap_err();
        assert!(matches!(err, LaunchError::NotExecutable { .. }));
    }

    #[test]
    fn reports_not_found() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = resolve_program(Path::new("jupyter"), Some(temp.path().as_os_str()))
            .unwrap_err();
        assert!(matches!(err, LaunchError::ProgramNotFound { .. }));

        let err = resolve_program(Path::new("jupyter"), None).unwrap_err();
        assert!(matches!(err, LaunchError::ProgramNotFound { .. }));
    }

    #[test]
    fn explicit_path_is_not_searched() {
        let temp = tempfile::tempdir().expect("tempdir");
        let script = temp.path().join("server");
        write_script(&script, "exit 0\n").expect("script");

        let resolved = resolve_program(&script, None).expect("resolve");
        assert_eq!(resolved, script);
    }

    #[test]
    fn spawn_mode_returns_child_exit_code() {
        let temp = tempfile::tempdir().expect("tempdir");
        let script = temp.path().join("server");
        write_script(&script, "exit 42\n").expect("script");

        let launch = LaunchCommand {
            program: script,
            args: Vec::new(),
        };
        let cmd = build_command(&launch, &EnvDelta::default(), temp.path());
        let code = run_foreground(cmd, "server", false).expect("run");
        assert_eq!(code, 42);
    }

    #[test]
    fn spawn_mode_applies_env_delta() {
        let temp = tempfile::tempdir().expect("tempdir");
        let script = temp.path().join("server");
        write_script(
            &script,
            "[ \"$VIRTUAL_ENV\" = /work/venv ] || exit 10\n[ -z \"$PYTHONHOME\" ] || exit 11\nexit 0\n",
        )
        .expect("script");

        let launch = LaunchCommand {
            program: script,
            args: Vec::new(),
        };
        let env = EnvDelta {
            set: vec![(OsString::from("VIRTUAL_ENV"), OsString::from("/work/venv"))],
            remove: vec![OsString::from("PYTHONHOME")],
        };
        let cmd = build_command(&launch, &env, temp.path());
        let code = run_foreground(cmd, "server", false).expect("run");
        assert_eq!(code, 0);
    }

    #[test]
    fn spawn_failure_maps_to_not_found() {
        let temp = tempfile::tempdir().expect("tempdir");
        let launch = LaunchCommand {
            program: temp.path().join("missing"),
            args: Vec::new(),
        };
        let cmd = build_command(&launch, &EnvDelta::default(), temp.path());
        let err = run_foreground(cmd, "missing", false).unwrap_err();
        assert_eq!(err.exit_code(), crate::exit_codes::NOT_FOUND);
    }

    #[test]
    fn signal_exit_maps_to_shell_code() {
        let temp = tempfile::tempdir().expect("tempdir");
        let script = temp.path().join("server");
        write_script(&script, "kill -TERM $$\n").expect("script");

        let launch = LaunchCommand {
            program: script,
            args: Vec::new(),
        };
        let cmd = build_command(&launch, &EnvDelta::default(), temp.path());
        let code = run_foreground(cmd, "server", false).expect("run");
        assert_eq!(code, 143);
    }
}
