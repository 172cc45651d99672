//! I/O helpers for the launcher.

pub mod config;
pub mod process;
pub mod venv;
