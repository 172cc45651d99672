//! Notebook launcher.
//!
//! Checks for `./venv`, activates it and runs the notebook server in the
//! foreground. Exits with the server's status, or `1` when the environment
//! is missing.

use anyhow::Result;
use clap::Parser;
use launcher::error::exit_code_for_error;
use launcher::exit_codes;
use launcher::launch::{LaunchOutcome, MISSING_VENV_MESSAGE, launch};
use launcher::logging;
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "launcher",
    version,
    about = "Activate ./venv and start the notebook server",
    long_about = "Activate ./venv and start the notebook server.\n\n\
                  Optional settings are read from launcher.toml in the working directory."
)]
struct Cli {}

fn main() {
    Cli::parse();
    logging::init();

    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_code_for_error(&err)
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let workdir = std::env::current_dir()?;
    match launch(&workdir)? {
        LaunchOutcome::MissingVenv { path } => {
            debug!(path = %path.display(), "virtual environment missing");
            for line in MISSING_VENV_MESSAGE {
                println!("{line}");
            }
            Ok(exit_codes::MISSING_VENV)
        }
        LaunchOutcome::Exited { code } => Ok(code),
    }
}
