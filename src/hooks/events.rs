// Payloads carried by lifecycle hooks

use serde::{Deserialize, Serialize};
use std::fmt;

/// A marker attached to a collected item, as evaluated by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
    #[serde(default)]
    pub reason: Option<String>,
    /// Result of the marker's condition; `None` when it has no condition
    #[serde(default)]
    pub condition: Option<bool>,
    #[serde(default)]
    pub raises: Option<String>,
    #[serde(default)]
    pub run: Option<bool>,
    #[serde(default)]
    pub strict: Option<bool>,
}

impl Marker {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_condition(mut self, condition: bool) -> Self {
        self.condition = Some(condition);
        self
    }

    /// True when the marker applies (no condition, or a true one)
    pub fn is_active(&self) -> bool {
        self.condition.unwrap_or(true)
    }
}

/// A test item discovered during collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedItem {
    pub node_id: String,
    #[serde(default)]
    pub markers: Vec<Marker>,
}

impl CollectedItem {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            markers: Vec::new(),
        }
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }
}

/// One traceback entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub path: String,
    pub lineno: u32,
    #[serde(default)]
    pub function: String,
    #[serde(default)]
    pub source: Option<String>,
}

/// An exception as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionInfo {
    pub type_name: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub frames: Vec<Frame>,
}

impl ExceptionInfo {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            frames: Vec::new(),
        }
    }

    pub fn with_frame(mut self, path: impl Into<String>, lineno: u32, function: &str) -> Self {
        self.frames.push(Frame {
            path: path.into(),
            lineno,
            function: function.to_string(),
            source: None,
        });
        self
    }

    /// The innermost frame, where the exception was raised
    pub fn crash_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// `Type: message`, or just the type when there is no message
    pub fn summary(&self) -> String {
        if self.message.is_empty() {
            self.type_name.clone()
        } else {
            format!("{}: {}", self.type_name, self.message)
        }
    }
}

/// Test protocol phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Setup,
    Call,
    Teardown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Setup => "setup",
            Phase::Call => "call",
            Phase::Teardown => "teardown",
        })
    }
}

/// Outcome of a single report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

/// Captured output attached to a report, e.g. `Captured stdout call`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSection {
    pub title: String,
    pub content: String,
}

/// The host's report object for one collector or one test phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportInfo {
    pub node_id: String,
    /// `None` for collection reports
    #[serde(default)]
    pub phase: Option<Phase>,
    pub outcome: Outcome,
    #[serde(default)]
    pub duration: f64,
    /// Set when the item was expected to fail
    #[serde(default)]
    pub wasxfail: Option<String>,
    #[serde(default)]
    pub sections: Vec<CaptureSection>,
}

impl ReportInfo {
    pub fn new(node_id: impl Into<String>, phase: Option<Phase>, outcome: Outcome) -> Self {
        Self {
            node_id: node_id.into(),
            phase,
            outcome,
            duration: 0.0,
            wasxfail: None,
            sections: Vec::new(),
        }
    }

    pub fn with_section(mut self, title: impl Into<String>, content: impl Into<String>) -> Self {
        self.sections.push(CaptureSection {
            title: title.into(),
            content: content.into(),
        });
        self
    }

    /// File part of the node id (`tests/test_a.py` for `tests/test_a.py::test_x`)
    pub fn fspath(&self) -> &str {
        self.node_id
            .split_once("::")
            .map(|(path, _)| path)
            .unwrap_or(&self.node_id)
    }
}

/// The call being interacted with when an exception surfaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallInfo {
    pub phase: Phase,
    pub exception: ExceptionInfo,
}

/// A warning raised during the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningMessage {
    pub message: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub lineno: u32,
    #[serde(default)]
    pub node_id: String,
    /// `config`, `collect` or `runtest`
    #[serde(default)]
    pub when: String,
}

fn default_category() -> String {
    String::from("UserWarning")
}

impl WarningMessage {
    pub fn new(message: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            category: default_category(),
            filename: String::new(),
            lineno: 0,
            node_id: node_id.into(),
            when: String::from("runtest"),
        }
    }
}

/// Session-wide facts announced before anything else happens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    #[serde(default)]
    pub session_id: String,
    pub rootdir: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub framework: Option<String>,
    #[serde(default)]
    pub inifile: Option<String>,
    /// Host plugins as `name-version`
    #[serde(default)]
    pub plugins: Vec<String>,
    #[serde(default)]
    pub collect_only: bool,
}
