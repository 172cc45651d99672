//! Parser for `pyvenv.cfg`, the marker file at the root of a virtual environment.

use anyhow::{Result, bail};

/// Known fields of `pyvenv.cfg`. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PyvenvCfg {
    /// Directory of the base interpreter the environment was created from.
    pub home: Option<String>,
    /// Interpreter version (`version` or `version_info`).
    pub version: Option<String>,
    pub include_system_site_packages: bool,
    /// Custom prompt set with `python -m venv --prompt`.
    pub prompt: Option<String>,
}

/// Parse `key = value` lines.
///
/// Blank lines and `#` comments are skipped. Keys are trimmed and compared
/// case-insensitively. Values keep inner whitespace; surrounding quotes on
/// `prompt` are stripped.
pub fn parse_pyvenv_cfg(contents: &str) -> Result<PyvenvCfg> {
    let mut cfg = PyvenvCfg::default();
    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            bail!("line {}: expected `key = value`, got {:?}", idx + 1, raw);
        };
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() {
            bail!("line {}: empty key", idx + 1);
        }
        let value = value.trim();
        match key.as_str() {
            "home" => cfg.home = Some(value.to_string()),
            "version" | "version_info" => cfg.version = Some(value.to_string()),
            "include-system-site-packages" => {
                cfg.include_system_site_packages = value.eq_ignore_ascii_case("true");
            }
            "prompt" => cfg.prompt = Some(unquote(value).to_string()),
            _ => {}
        }
    }
    Ok(cfg)
}

fn unquote(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
