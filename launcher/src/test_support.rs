//! Test-only helpers for building fake virtual environments.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::io::venv::VenvPaths;

pub const PYVENV_CFG: &str = "home = /usr/bin\ninclude-system-site-packages = false\nversion = 3.12.3\n";

/// A working directory containing `venv/` with a bin dir, an activation
/// script and `pyvenv.cfg`. Removed on drop.
pub struct FakeVenv {
    temp: TempDir,
}

impl FakeVenv {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create temp dir")?;
        let paths = VenvPaths::new(temp.path().join("venv"));
        fs::create_dir_all(&paths.bin_dir)
            .with_context(|| format!("create {}", paths.bin_dir.display()))?;
        fs::write(&paths.activate_script, activate_script_body(&paths))
            .with_context(|| format!("write {}", paths.activate_script.display()))?;
        fs::write(&paths.cfg_path, PYVENV_CFG)
            .with_context(|| format!("write {}", paths.cfg_path.display()))?;
        Ok(Self { temp })
    }

    pub fn workdir(&self) -> &Path {
        self.temp.path()
    }

    pub fn venv_root(&self) -> PathBuf {
        self.temp.path().join("venv")
    }

    pub fn bin_dir(&self) -> PathBuf {
        VenvPaths::new(self.venv_root()).bin_dir
    }

    pub fn activate_script(&self) -> PathBuf {
        VenvPaths::new(self.venv_root()).activate_script
    }

    /// Install a fake `jupyter` that records its arguments and environment in
    /// `server.log` under the working directory, then exits with `exit_code`.
    pub fn install_server(&self, exit_code: i32) -> Result<PathBuf> {
        let path = self.bin_dir().join("jupyter");
        let body = format!(
            "echo \"args=$*\" >> server.log\n\
             echo \"virtual_env=$VIRTUAL_ENV\" >> server.log\n\
             exit {exit_code}\n"
        );
        write_script(&path, &body)?;
        Ok(path)
    }

    /// Replace the activation script with one that fails.
    pub fn break_activation(&self) -> Result<()> {
        let path = self.activate_script();
        fs::write(&path, "echo 'corrupted activation script' >&2\nfalse\n")
            .with_context(|| format!("write {}", path.display()))
    }

    /// Contents of `server.log`, or `None` if the fake server never ran.
    pub fn server_log(&self) -> Option<String> {
        fs::read_to_string(self.workdir().join("server.log")).ok()
    }
}

/// Minimal `bin/activate`: exports `VIRTUAL_ENV` and puts the bin dir first
/// on `PATH`.
fn activate_script_body(paths: &VenvPaths) -> String {
    format!(
        "VIRTUAL_ENV='{}'\nexport VIRTUAL_ENV\nPATH='{}':\"$PATH\"\nexport PATH\n",
        paths.root.display(),
        paths.bin_dir.display()
    )
}

/// Write an executable `sh` script with `body` after the shebang.
pub fn write_script(path: &Path, body: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, format!("#!/bin/sh\n{body}"))
        .with_context(|| format!("write {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
            .with_context(|| format!("chmod {}", path.display()))?;
    }
    Ok(())
}
