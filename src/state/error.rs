// Captured failures

use serde::Serialize;

use crate::hooks::events::{ExceptionInfo, Phase, ReportInfo};

/// A collection-time or execution-time failure with its rendered panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorInfo {
    pub exception: ExceptionInfo,
    pub report: ReportInfo,
    /// Panel lines, already styled for the console that produced them
    #[serde(skip)]
    pub panel: Vec<String>,
}

impl ErrorInfo {
    pub fn new(exception: ExceptionInfo, report: ReportInfo, panel: Vec<String>) -> Self {
        Self {
            exception,
            report,
            panel,
        }
    }

    pub fn node_id(&self) -> &str {
        &self.report.node_id
    }

    pub fn phase(&self) -> Option<Phase> {
        self.report.phase
    }
}
