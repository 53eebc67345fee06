// State module - run-level records shared by all hook listeners
// Owned by the tracer, lent to listeners for the duration of one hook call

pub mod collection;
pub mod error;
pub mod warning;

pub use collection::{CollectionRecord, CollectionStats, SkipInfo, XfailInfo};
pub use error::ErrorInfo;
pub use warning::WarningRecord;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::hooks::events::{Outcome, Phase, ReportInfo};

/// Results of one test-run invocation
#[derive(Debug, Clone, Serialize)]
pub struct RunResults {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    started: Instant,
    #[serde(skip)]
    finished: Option<Instant>,
    pub collect_only: bool,
    pub collection: Option<CollectionRecord>,
    pub warnings: Vec<WarningRecord>,
    /// Warning hashes already printed by a summary pass
    #[serde(skip)]
    displayed_warnings: HashSet<String>,
    /// First failure per (node id, phase), in arrival order
    pub exceptions: Vec<ErrorInfo>,
    pub outcomes: OutcomeCounts,
    pub exit_status: Option<ExitStatus>,
    pub interrupted: Option<String>,
}

impl RunResults {
    pub fn new(started_at: DateTime<Utc>, started: Instant) -> Self {
        Self {
            started_at,
            finished_at: None,
            started,
            finished: None,
            collect_only: false,
            collection: None,
            warnings: Vec::new(),
            displayed_warnings: HashSet::new(),
            exceptions: Vec::new(),
            outcomes: OutcomeCounts::default(),
            exit_status: None,
            interrupted: None,
        }
    }

    /// Set the finish timestamps. Later calls are ignored.
    pub fn finish(&mut self, finished_at: DateTime<Utc>, finished: Instant) {
        if self.finished.is_none() {
            self.finished_at = Some(finished_at);
            self.finished = Some(finished);
        }
    }

    /// Elapsed time up to `now`, or up to the finish instant when set
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.finished.unwrap_or(now).saturating_duration_since(self.started)
    }

    pub fn collection_errors(&self) -> usize {
        self.collection.as_ref().map_or(0, |c| c.stats.errors)
    }

    /// Keep the first exception for a node and phase. Returns false when one
    /// was already recorded.
    pub fn record_exception(&mut self, info: ErrorInfo) -> bool {
        let seen = self
            .exceptions
            .iter()
            .any(|e| e.node_id() == info.node_id() && e.phase() == info.phase());
        if seen {
            return false;
        }
        self.exceptions.push(info);
        true
    }

    pub fn exception_for(&self, node_id: &str, phase: Phase) -> Option<&ErrorInfo> {
        self.exceptions
            .iter()
            .find(|e| e.node_id() == node_id && e.phase() == Some(phase))
    }

    pub fn is_warning_displayed(&self, hash: &str) -> bool {
        self.displayed_warnings.contains(hash)
    }

    pub fn mark_warning_displayed(&mut self, hash: &str) {
        self.displayed_warnings.insert(hash.to_string());
    }

    /// Exit status to report: the host's when it sent one, otherwise derived
    /// from what was observed
    pub fn resolve_exit_status(&self) -> ExitStatus {
        if let Some(status) = self.exit_status {
            return status;
        }
        if self.interrupted.is_some() {
            return ExitStatus::Interrupted;
        }
        if self.outcomes.failed > 0 || self.outcomes.errors > 0 || self.collection_errors() > 0 {
            return ExitStatus::TestsFailed;
        }
        let selected = self.collection.as_ref().map_or(0, |c| c.selected());
        if selected == 0 {
            return ExitStatus::NoTestsCollected;
        }
        ExitStatus::Ok
    }
}

/// Per-test outcome counters for the execution phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub xfailed: usize,
    pub xpassed: usize,
    pub errors: usize,
}

impl OutcomeCounts {
    /// Classify one phase report. Returns the outcome that was counted, if any.
    pub fn add(&mut self, report: &ReportInfo) -> Option<TestOutcome> {
        let outcome = TestOutcome::classify(report)?;
        match outcome {
            TestOutcome::Passed => self.passed += 1,
            TestOutcome::Failed => self.failed += 1,
            TestOutcome::Skipped => self.skipped += 1,
            TestOutcome::XFailed => self.xfailed += 1,
            TestOutcome::XPassed => self.xpassed += 1,
            TestOutcome::Error => self.errors += 1,
        }
        Some(outcome)
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped + self.xfailed + self.xpassed + self.errors
    }
}

/// Test status as shown in progress output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TestOutcome {
    Passed,
    Failed,
    Skipped,
    XFailed,
    XPassed,
    Error,
}

impl TestOutcome {
    /// Map a phase report onto a test outcome.
    ///
    /// Passing setup and teardown reports do not count; the call report does.
    pub fn classify(report: &ReportInfo) -> Option<Self> {
        let phase = report.phase?;
        match (phase, report.outcome) {
            (_, Outcome::Skipped) if report.wasxfail.is_some() => Some(Self::XFailed),
            (_, Outcome::Skipped) => Some(Self::Skipped),
            (Phase::Call, Outcome::Failed) => Some(Self::Failed),
            (_, Outcome::Failed) => Some(Self::Error),
            (Phase::Call, Outcome::Passed) if report.wasxfail.is_some() => Some(Self::XPassed),
            (Phase::Call, Outcome::Passed) => Some(Self::Passed),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Self::Passed => '.',
            Self::Failed => 'F',
            Self::Skipped => 's',
            Self::XFailed => 'x',
            Self::XPassed => 'X',
            Self::Error => 'E',
        }
    }

    pub fn word(self) -> &'static str {
        match self {
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
            Self::Skipped => "SKIPPED",
            Self::XFailed => "XFAIL",
            Self::XPassed => "XPASS",
            Self::Error => "ERROR",
        }
    }
}

/// Host exit codes. The reporter never defines codes of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitStatus {
    Ok,
    TestsFailed,
    Interrupted,
    InternalError,
    UsageError,
    NoTestsCollected,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::TestsFailed => 1,
            Self::Interrupted => 2,
            Self::InternalError => 3,
            Self::UsageError => 4,
            Self::NoTestsCollected => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::events::ExceptionInfo;

    fn results() -> RunResults {
        RunResults::new(Utc::now(), Instant::now())
    }

    fn call_report(outcome: Outcome) -> ReportInfo {
        ReportInfo::new("t.py::test_a", Some(Phase::Call), outcome)
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            TestOutcome::classify(&call_report(Outcome::Passed)),
            Some(TestOutcome::Passed)
        );
        assert_eq!(
            TestOutcome::classify(&call_report(Outcome::Failed)),
            Some(TestOutcome::Failed)
        );
        let setup_fail = ReportInfo::new("t.py::test_a", Some(Phase::Setup), Outcome::Failed);
        assert_eq!(TestOutcome::classify(&setup_fail), Some(TestOutcome::Error));
        let setup_pass = ReportInfo::new("t.py::test_a", Some(Phase::Setup), Outcome::Passed);
        assert_eq!(TestOutcome::classify(&setup_pass), None);

        let mut xfail = call_report(Outcome::Skipped);
        xfail.wasxfail = Some("flaky".to_string());
        assert_eq!(TestOutcome::classify(&xfail), Some(TestOutcome::XFailed));

        let mut xpass = call_report(Outcome::Passed);
        xpass.wasxfail = Some(String::new());
        assert_eq!(TestOutcome::classify(&xpass), Some(TestOutcome::XPassed));
    }

    #[test]
    fn test_first_exception_wins() {
        let mut res = results();
        let first = ErrorInfo::new(
            ExceptionInfo::new("ValueError", "first"),
            ReportInfo::new("t.py::test_a", Some(Phase::Setup), Outcome::Failed),
            vec![],
        );
        let second = ErrorInfo::new(
            ExceptionInfo::new("ValueError", "second"),
            ReportInfo::new("t.py::test_a", Some(Phase::Setup), Outcome::Failed),
            vec![],
        );
        let other_phase = ErrorInfo::new(
            ExceptionInfo::new("OSError", "teardown"),
            ReportInfo::new("t.py::test_a", Some(Phase::Teardown), Outcome::Failed),
            vec![],
        );

        assert!(res.record_exception(first));
        assert!(!res.record_exception(second));
        assert!(res.record_exception(other_phase));
        assert_eq!(res.exceptions.len(), 2);
        assert_eq!(
            res.exception_for("t.py::test_a", Phase::Setup)
                .map(|e| e.exception.message.as_str()),
            Some("first")
        );
    }

    #[test]
    fn test_exit_status_derivation() {
        let mut res = results();
        assert_eq!(res.resolve_exit_status(), ExitStatus::NoTestsCollected);

        let mut rec = CollectionRecord::new("s", Utc::now());
        rec.add_item("t.py::test_a", &[]);
        res.collection = Some(rec);
        assert_eq!(res.resolve_exit_status(), ExitStatus::Ok);

        res.outcomes.failed = 1;
        assert_eq!(res.resolve_exit_status(), ExitStatus::TestsFailed);

        res.interrupted = Some("KeyboardInterrupt".to_string());
        assert_eq!(res.resolve_exit_status(), ExitStatus::Interrupted);

        res.exit_status = Some(ExitStatus::UsageError);
        assert_eq!(res.resolve_exit_status().code(), 4);
    }

    #[test]
    fn test_finish_is_set_once() {
        let start = Instant::now();
        let mut res = RunResults::new(Utc::now(), start);
        res.finish(Utc::now(), start + Duration::from_secs(2));
        res.finish(Utc::now(), start + Duration::from_secs(9));
        assert_eq!(res.elapsed(Instant::now()), Duration::from_secs(2));
    }
}
