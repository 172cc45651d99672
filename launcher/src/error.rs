//! Launch failures that carry their own exit code.

use std::path::PathBuf;

use crate::exit_codes;

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// The environment exists but cannot be activated.
    #[error("cannot activate {}: {reason}", .venv.display())]
    Activation { venv: PathBuf, reason: String },
    /// The server program is not on the activated search path.
    #[error("command not found: {program}")]
    ProgramNotFound { program: String },
    /// The server program exists but is not executable.
    #[error("permission denied: {}", .path.display())]
    NotExecutable { path: PathBuf },
    /// Spawning or exec-ing the program failed.
    #[error("failed to start {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl LaunchError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Activation { .. } => exit_codes::INVALID,
            Self::ProgramNotFound { .. } => exit_codes::NOT_FOUND,
            Self::NotExecutable { .. } => exit_codes::NOT_EXECUTABLE,
            Self::Spawn { source, .. } => match source.kind() {
                std::io::ErrorKind::NotFound => exit_codes::NOT_FOUND,
                std::io::ErrorKind::PermissionDenied => exit_codes::NOT_EXECUTABLE,
                _ => exit_codes::INVALID,
            },
        }
    }
}

/// Exit code for an error chain: the first [`LaunchError`] wins, anything
/// else is [`exit_codes::INVALID`].
pub fn exit_code_for_error(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<LaunchError>())
        .map_or(exit_codes::INVALID, LaunchError::exit_code)
}
