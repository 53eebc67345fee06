// Environment variable parsing and `.env` files

use std::collections::HashMap;
use std::path::Path;

use crate::error::SettingsError;

pub const ENV_PREFIX: &str = "RICHTRACE_";
pub const ENV_COLOR: &str = "RICHTRACE_COLOR";
pub const ENV_CONSOLE_OUTPUT: &str = "RICHTRACE_CONSOLE_OUTPUT";
pub const ENV_WIDTH: &str = "RICHTRACE_WIDTH";
pub const ENV_LOG_LEVEL: &str = "RICHTRACE_LOG_LEVEL";
pub const ENV_LOG_FILE: &str = "RICHTRACE_LOG_FILE";
pub const ENV_NO_COLOR: &str = "NO_COLOR";

/// Permissive boolean: `1/0`, `yes/no`, `true/false`, `on/off`, any case.
pub fn parse_bool(key: &str, value: &str) -> Result<bool, SettingsError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Ok(true),
        "0" | "no" | "false" | "off" => Ok(false),
        _ => Err(SettingsError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: String::from("expected one of 1/0, yes/no, true/false, on/off"),
        }),
    }
}

pub fn parse_int(key: &str, value: &str) -> Result<i64, SettingsError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|e| SettingsError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: format!("expected an integer: {}", e),
        })
}

/// Parse `KEY=VALUE` lines. Blank lines and `#` comments are skipped, an
/// `export ` prefix is allowed, and matching surrounding quotes are removed.
pub fn parse_env_file(content: &str) -> Result<Vec<(String, String)>, SettingsError> {
    let mut out = Vec::new();

    for (idx, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let (k, v) = line.split_once('=').ok_or_else(|| SettingsError::EnvFile {
            line: idx + 1,
            message: String::from("expected KEY=VALUE"),
        })?;
        let key = k.trim();
        if key.is_empty() {
            return Err(SettingsError::EnvFile {
                line: idx + 1,
                message: String::from("empty key"),
            });
        }
        out.push((key.to_string(), unquote(v.trim()).to_string()));
    }

    Ok(out)
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

pub fn load_env_file(path: &Path) -> Result<Vec<(String, String)>, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_env_file(&content)
}

/// Merge `.env` entries with the process environment. Process variables win.
pub fn collect_vars(
    file_vars: Vec<(String, String)>,
    process_vars: impl IntoIterator<Item = (String, String)>,
) -> HashMap<String, String> {
    let relevant = |key: &str| key.starts_with(ENV_PREFIX) || key == ENV_NO_COLOR;
    let mut vars: HashMap<String, String> = file_vars
        .into_iter()
        .filter(|(k, _)| relevant(k))
        .collect();
    for (k, v) in process_vars {
        if relevant(&k) {
            vars.insert(k, v);
        }
    }
    vars
}
