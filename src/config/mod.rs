// Configuration file handling

pub mod env;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{SettingsError, ValidationProblem};

pub const CONFIG_FILE_NAME: &str = ".richtracerc.toml";
pub const DEFAULT_ENV_FILE: &str = ".env";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub console: ConsoleSettings,

    #[serde(default)]
    pub collect: CollectSettings,

    #[serde(default)]
    pub traceback: TracebackSettings,

    #[serde(default)]
    pub log: LogSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsoleSettings {
    /// Color switch: 0 disables styling, anything else enables it
    #[serde(default = "default_color")]
    pub color: i64,

    /// Write to the terminal; when false output goes to an in-memory buffer
    #[serde(default = "default_true")]
    pub console_output: bool,

    /// Fixed console width (detected from the terminal when unset)
    #[serde(default)]
    pub width: Option<usize>,

    /// Emit clickable source links on terminals that support them
    #[serde(default = "default_true")]
    pub hyperlinks: bool,

    /// `default` or `monochrome`
    #[serde(default = "default_theme")]
    pub theme: String,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            color: default_color(),
            console_output: true,
            width: None,
            hyperlinks: true,
            theme: default_theme(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectSettings {
    /// Minimum time between two "collecting ..." redraws
    #[serde(default = "default_redraw_interval_ms")]
    pub redraw_interval_ms: u64,
}

impl Default for CollectSettings {
    fn default() -> Self {
        Self {
            redraw_interval_ms: default_redraw_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TracebackSettings {
    /// Regexes matched against frame paths; matching frames are dimmed
    #[serde(default = "default_suppress")]
    pub suppress: Vec<String>,

    /// Keep at most this many innermost frames
    #[serde(default = "default_max_frames")]
    pub max_frames: usize,

    /// Print captured stdout/stderr sections under errors
    #[serde(default = "default_true")]
    pub show_capture: bool,
}

impl Default for TracebackSettings {
    fn default() -> Self {
        Self {
            suppress: default_suppress(),
            max_frames: default_max_frames(),
            show_capture: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogSettings {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write log records here instead of stderr
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_color() -> i64 {
    1
}

fn default_theme() -> String {
    String::from("default")
}

pub fn default_redraw_interval_ms() -> u64 {
    500
}

fn default_suppress() -> Vec<String> {
    vec![
        String::from(r"[/\\]_pytest[/\\]"),
        String::from(r"[/\\]pluggy[/\\]"),
        String::from(r"[/\\]site-packages[/\\]"),
    ]
}

fn default_max_frames() -> usize {
    20
}

fn default_log_level() -> String {
    String::from("warn")
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];
const THEMES: &[&str] = &["default", "monochrome"];

impl Settings {
    /// Load settings from every source.
    ///
    /// Precedence, highest first: process environment, `.env` file, TOML
    /// file, built-in defaults. Command-line overrides are applied by the
    /// caller afterwards.
    pub fn load(env_file: Option<&Path>) -> Result<Self, SettingsError> {
        let mut settings = match Self::discover() {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::default(),
        };

        let file_vars = match env_file {
            Some(path) => env::load_env_file(path)?,
            None => {
                let fallback = Path::new(DEFAULT_ENV_FILE);
                if fallback.is_file() {
                    env::load_env_file(fallback)?
                } else {
                    Vec::new()
                }
            }
        };
        let vars = env::collect_vars(file_vars, std::env::vars());
        settings.apply_env(&vars)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Find the configuration file: current directory first, then home.
    pub fn discover() -> Option<PathBuf> {
        let mut candidates = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd.join(CONFIG_FILE_NAME));
        }
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(CONFIG_FILE_NAME));
        }
        candidates.into_iter().find(|p| p.is_file())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        debug!("Loading settings from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply `RICHTRACE_*` variables on top of the current values.
    pub fn apply_env(&mut self, vars: &HashMap<String, String>) -> Result<(), SettingsError> {
        if let Some(v) = vars.get(env::ENV_NO_COLOR)
            && !v.is_empty()
        {
            self.console.color = 0;
        }
        if let Some(v) = vars.get(env::ENV_COLOR) {
            self.console.color = env::parse_int(env::ENV_COLOR, v)?;
        }
        if let Some(v) = vars.get(env::ENV_CONSOLE_OUTPUT) {
            self.console.console_output = env::parse_bool(env::ENV_CONSOLE_OUTPUT, v)?;
        }
        if let Some(v) = vars.get(env::ENV_WIDTH) {
            let width = env::parse_int(env::ENV_WIDTH, v)?;
            self.console.width =
                Some(
                    usize::try_from(width).map_err(|_| SettingsError::InvalidValue {
                        key: env::ENV_WIDTH.to_string(),
                        value: v.clone(),
                        reason: String::from("must not be negative"),
                    })?,
                );
        }
        if let Some(v) = vars.get(env::ENV_LOG_LEVEL) {
            self.log.level = v.trim().to_ascii_lowercase();
        }
        if let Some(v) = vars.get(env::ENV_LOG_FILE)
            && !v.trim().is_empty()
        {
            self.log.file = Some(PathBuf::from(v.trim()));
        }
        Ok(())
    }

    /// Check every field and report all problems at once.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let mut problems = Vec::new();
        let mut problem = |field: &str, message: String| {
            problems.push(ValidationProblem {
                field: field.to_string(),
                message,
            })
        };

        if let Some(width) = self.console.width
            && width < 20
        {
            problem("console.width", format!("must be at least 20, got {}", width));
        }
        if !THEMES.contains(&self.console.theme.as_str()) {
            problem(
                "console.theme",
                format!(
                    "unknown theme {:?}, expected one of {}",
                    self.console.theme,
                    THEMES.join(", ")
                ),
            );
        }
        if self.collect.redraw_interval_ms > 60_000 {
            problem(
                "collect.redraw_interval_ms",
                format!(
                    "must be at most 60000, got {}",
                    self.collect.redraw_interval_ms
                ),
            );
        }
        for pattern in &self.traceback.suppress {
            if let Err(e) = Regex::new(pattern) {
                problem("traceback.suppress", format!("invalid pattern {:?}: {}", pattern, e));
            }
        }
        if self.traceback.max_frames == 0 {
            problem("traceback.max_frames", String::from("must be at least 1"));
        }
        if !LOG_LEVELS.contains(&self.log.level.as_str()) {
            problem(
                "log.level",
                format!(
                    "unknown level {:?}, expected one of {}",
                    self.log.level,
                    LOG_LEVELS.join(", ")
                ),
            );
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(SettingsError::Validation(problems))
        }
    }

    pub fn color_enabled(&self) -> bool {
        self.console.color != 0 && self.console.theme != "monochrome"
    }

    pub fn redraw_interval(&self) -> Duration {
        Duration::from_millis(self.collect.redraw_interval_ms)
    }

    /// Compiled suppression patterns. Invalid ones were rejected by
    /// `validate`, so they are skipped here.
    pub fn suppress_patterns(&self) -> Vec<Regex> {
        self.traceback
            .suppress
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
    }

    /// Generate default configuration as TOML
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_else(|_| String::new())
    }
}
