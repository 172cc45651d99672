//! Launcher for a notebook server inside a project-local virtual environment.
//!
//! The launcher checks that `./venv` exists, activates it and runs
//! `jupyter notebook` in the foreground, exiting with the server's status.
//! The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (`pyvenv.cfg` parsing, activated
//!   environment, exit-status mapping). No I/O.
//! - **[`io`]**: Side-effecting operations (config file, venv inspection,
//!   process execution).
//!
//! [`launch`] coordinates both to implement the CLI.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod launch;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
