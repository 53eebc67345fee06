// Execution-phase progress: one character per test, or one line per test
// when verbose

use console::measure_text_width;
use console::Style;

use crate::hooks::{HookContext, HookResult, Phase, Plugin, ReportInfo, RunTestHooks};
use crate::report::SummaryRenderer;
use crate::state::TestOutcome;
use crate::term::Console;

pub const PLUGIN_NAME: &str = "rich-runtest";

pub struct RunTestObserver {
    total: usize,
    done: usize,
    current_file: Option<String>,
    /// Visible width of the open progress line, if any
    column: Option<usize>,
}

impl RunTestObserver {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            done: 0,
            current_file: None,
            column: None,
        }
    }

    fn percent(&self) -> String {
        let pct = if self.total == 0 {
            100
        } else {
            (self.done * 100 / self.total).min(100)
        };
        format!("[{:>3}%]", pct)
    }

    fn outcome_style(console: &Console, outcome: TestOutcome) -> Style {
        let theme = console.theme();
        match outcome {
            TestOutcome::Passed => theme.success.clone(),
            TestOutcome::Failed | TestOutcome::Error => theme.error.clone(),
            TestOutcome::Skipped | TestOutcome::XFailed | TestOutcome::XPassed => {
                theme.warning.clone()
            }
        }
    }

    /// Right-align the percentage and end the open line
    fn close_line(&mut self, console: &Console) -> std::io::Result<()> {
        let Some(column) = self.column.take() else {
            return Ok(());
        };
        let suffix = self.percent();
        let pad = console
            .width()
            .saturating_sub(column + suffix.len())
            .max(1);
        console.write_line(&format!("{}{}", " ".repeat(pad), suffix))
    }

    fn write_letter(
        &mut self,
        ctx: &mut HookContext<'_>,
        report: &ReportInfo,
        outcome: TestOutcome,
    ) -> std::io::Result<()> {
        let console = ctx.console;
        if ctx.config.verbosity >= 0 {
            let file = report.fspath();
            if self.current_file.as_deref() != Some(file) {
                self.close_line(console)?;
                console.write_str(&format!("{} ", file))?;
                self.column = Some(measure_text_width(file) + 1);
                self.current_file = Some(file.to_string());
            }
        }
        let letter = console.paint(&Self::outcome_style(console, outcome), outcome.letter());
        console.write_str(&letter)?;
        self.column = Some(self.column.unwrap_or(0) + 1);
        Ok(())
    }

    fn write_verbose(
        &mut self,
        ctx: &mut HookContext<'_>,
        report: &ReportInfo,
        outcome: TestOutcome,
    ) -> std::io::Result<()> {
        let console = ctx.console;
        let mut label = report.node_id.clone();
        if let Some(phase) = report.phase
            && phase != Phase::Call
        {
            label.push_str(&format!(" ({})", phase));
        }
        let word = outcome.word();
        let suffix = self.percent();
        let used = measure_text_width(&label) + 1 + word.len() + suffix.len();
        let pad = console.width().saturating_sub(used).max(1);
        console.write_line(&format!(
            "{} {}{}{}",
            label,
            console.paint(&Self::outcome_style(console, outcome), word),
            " ".repeat(pad),
            suffix
        ))
    }
}

impl RunTestHooks for RunTestObserver {
    fn on_test_report(&mut self, ctx: &mut HookContext<'_>, report: &ReportInfo) -> HookResult {
        let Some(outcome) = ctx.results.outcomes.add(report) else {
            return Ok(());
        };
        let counts = report.phase != Some(Phase::Teardown);
        if ctx.config.verbosity >= 1 {
            if counts {
                self.done += 1;
            }
            self.write_verbose(ctx, report, outcome)?;
            return Ok(());
        }

        // the file-change line break reports progress before this test
        self.write_letter(ctx, report, outcome)?;
        if counts {
            self.done += 1;
        }
        if self.column.unwrap_or(0) + 8 >= ctx.console.width() {
            self.close_line(ctx.console)?;
            self.current_file = None;
        }
        Ok(())
    }

    fn on_runtest_finish(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
        self.close_line(ctx.console)?;
        SummaryRenderer::new(ctx.console, true).summarize_warnings(ctx.results, false)?;
        Ok(())
    }
}

impl Plugin for RunTestObserver {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn runtest(&mut self) -> Option<&mut dyn RunTestHooks> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::hooks::{Outcome, RunConfig, WarningMessage};
    use crate::state::{RunResults, WarningRecord};
    use crate::term::ConsoleOptions;
    use crate::time::{Clock, ManualClock};

    fn report(node: &str, phase: Phase, outcome: Outcome) -> ReportInfo {
        ReportInfo::new(node, Some(phase), outcome)
    }

    fn drive(verbosity: i8, reports: &[ReportInfo], results: &mut RunResults) -> String {
        let clock = ManualClock::new();
        let console = Console::buffer(ConsoleOptions {
            width: 40,
            ..ConsoleOptions::default()
        });
        let mut config = RunConfig::new(Settings::default(), "/srv/project");
        config.verbosity = verbosity;
        let mut ctx = HookContext {
            results,
            console: &console,
            config: &config,
            clock: &clock,
        };
        let mut obs = RunTestObserver::new(3);
        for r in reports {
            obs.on_test_report(&mut ctx, r).unwrap();
        }
        obs.on_runtest_finish(&mut ctx).unwrap();
        console.contents()
    }

    fn new_results() -> RunResults {
        let clock = ManualClock::new();
        RunResults::new(clock.wall(), clock.now())
    }

    #[test]
    fn test_letters_per_file() {
        let mut results = new_results();
        let reports = vec![
            report("a.py::t1", Phase::Setup, Outcome::Passed),
            report("a.py::t1", Phase::Call, Outcome::Passed),
            report("a.py::t2", Phase::Call, Outcome::Failed),
            report("b.py::t3", Phase::Setup, Outcome::Skipped),
        ];
        let out = drive(0, &reports, &mut results);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("a.py .F"));
        assert!(lines[0].ends_with("[ 66%]"));
        assert_eq!(lines[0].len(), 40);
        assert!(lines[1].starts_with("b.py s"));
        assert!(lines[1].ends_with("[100%]"));
        assert_eq!(results.outcomes.passed, 1);
        assert_eq!(results.outcomes.failed, 1);
        assert_eq!(results.outcomes.skipped, 1);
    }

    #[test]
    fn test_verbose_lines() {
        let mut results = new_results();
        let reports = vec![
            report("a.py::t1", Phase::Call, Outcome::Passed),
            report("a.py::t1", Phase::Teardown, Outcome::Failed),
        ];
        let out = drive(1, &reports, &mut results);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("a.py::t1 PASSED"));
        assert!(lines[0].ends_with("[ 33%]"));
        assert!(lines[1].starts_with("a.py::t1 (teardown) ERROR"));
        assert_eq!(results.outcomes.errors, 1);
    }

    #[test]
    fn test_finish_prints_pending_warnings() {
        let mut results = new_results();
        results
            .warnings
            .push(WarningRecord::from_message(&WarningMessage::new("deprecated", "a.py::t1")));
        let out = drive(0, &[report("a.py::t1", Phase::Call, Outcome::Passed)], &mut results);
        assert!(out.contains(" warnings summary "));
        assert!(!out.contains("(final)"));
        assert!(results.is_warning_displayed(&results.warnings[0].hash));
    }
}
