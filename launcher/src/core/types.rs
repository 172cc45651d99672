//! Shared deterministic types for launcher core logic.
//!
//! These types carry no I/O. They describe what to run and with which
//! environment; the `io` layer decides how.

use std::ffi::OsString;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How the virtual environment is activated before launch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationMode {
    /// Build the activated environment in-process (PATH, `VIRTUAL_ENV`, ...).
    #[default]
    Direct,
    /// Source the environment's own activation script through a shell.
    Shell,
}

/// Environment changes applied to the child process on top of the inherited
/// environment.
///
/// Order is stable: `set` lists variables in the order they were computed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvDelta {
    pub set: Vec<(OsString, OsString)>,
    pub remove: Vec<OsString>,
}

impl EnvDelta {
    /// Look up a variable set by this delta.
    pub fn get(&self, key: &str) -> Option<&OsString> {
        self.set
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }
}

/// Program and arguments handed to the process layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl LaunchCommand {
    pub fn new(program: impl Into<PathBuf>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(OsString::from).collect(),
        }
    }

    /// Human-readable command line for logs and error messages.
    pub fn display(&self) -> String {
        let mut out = self.program.display().to_string();
        for arg in &self.args {
            out.push(' ');
            out.push_str(&arg.to_string_lossy());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_program_and_args() {
        let cmd = LaunchCommand::new("jupyter", &["notebook"]);
        assert_eq!(cmd.program, PathBuf::from("jupyter"));
        assert_eq!(cmd.args, vec![OsString::from("notebook")]);
        assert_eq!(cmd.display(), "jupyter notebook");
    }

    #[test]
    fn env_delta_get_finds_set_variable() {
        let delta = EnvDelta {
            set: vec![(OsString::from("VIRTUAL_ENV"), OsString::from("/tmp/venv"))],
            remove: Vec::new(),
        };
        assert_eq!(delta.get("VIRTUAL_ENV"), Some(&OsString::from("/tmp/venv")));
        assert_eq!(delta.get("PATH"), None);
    }
}
