//! Mapping from a finished child to the launcher's own exit code.

use crate::exit_codes;

/// Exit code the launcher reports for a child that exited with `code` or was
/// terminated by `signal`.
///
/// A normal exit passes through unchanged. A signal maps to `128 + signal`,
/// the value a POSIX shell reports. A status with neither is treated as a
/// generic failure.
pub fn exit_code_for(code: Option<i32>, signal: Option<i32>) -> i32 {
    match (code, signal) {
        (Some(code), _) => code,
        (None, Some(signal)) => exit_codes::SIGNAL_BASE + signal,
        (None, None) => exit_codes::INVALID,
    }
}
