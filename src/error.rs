// Error types shared across the reporter

use std::path::PathBuf;
use thiserror::Error;

/// Invalid or unreadable settings. Always fatal at startup.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid env file line {line}: {message}")]
    EnvFile { line: usize, message: String },
    #[error("{}", format_validation_report(.0))]
    Validation(Vec<ValidationProblem>),
}

/// A single failed settings check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationProblem {
    pub field: String,
    pub message: String,
}

fn format_validation_report(problems: &[ValidationProblem]) -> String {
    let noun = if problems.len() == 1 { "error" } else { "errors" };
    let mut out = format!("{} validation {} for Settings", problems.len(), noun);
    for problem in problems {
        out.push_str(&format!("\n  {}\n    {}", problem.field, problem.message));
    }
    out
}

/// A path that could not be shown relative to the project root.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{path} is not under project root {root}")]
pub struct PathError {
    pub path: PathBuf,
    pub root: PathBuf,
}

/// Errors that may cross the hook boundary.
#[derive(Error, Debug)]
pub enum HookError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("console write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors while decoding a recorded event stream.
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("line {line}: malformed event: {source}")]
    Decode {
        line: usize,
        source: serde_json::Error,
    },
    #[error("failed to read event stream: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Hook(#[from] HookError),
}
