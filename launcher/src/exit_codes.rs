//! Stable exit codes for the launcher.
//!
//! Apart from these, the launcher exits with whatever code the notebook
//! server returns.

/// Server exited cleanly.
pub const OK: i32 = 0;
/// The `venv` directory is missing.
pub const MISSING_VENV: i32 = 1;
/// Invalid config, failed activation or other launcher errors.
pub const INVALID: i32 = 1;
/// Program was found but could not be executed.
pub const NOT_EXECUTABLE: i32 = 126;
/// Program was not found on the activated search path.
pub const NOT_FOUND: i32 = 127;
/// Added to the signal number when the server is killed by a signal.
pub const SIGNAL_BASE: i32 = 128;
