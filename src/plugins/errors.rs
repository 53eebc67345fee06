// Internal error panels and per-test exception capture

use tracing::{debug, error};

use crate::config::Settings;
use crate::hooks::{
    CallInfo, ErrorHooks, ExceptionInfo, HookContext, HookResult, Phase, Plugin, ReportInfo,
};
use crate::report::TracebackRenderer;
use crate::state::ErrorInfo;

pub const PLUGIN_NAME: &str = "rich-errors";

pub struct ErrorCapture {
    traceback: TracebackRenderer,
}

impl ErrorCapture {
    pub fn new(settings: &Settings) -> Self {
        Self {
            traceback: TracebackRenderer::from_settings(settings),
        }
    }
}

/// Section title for a failing phase
pub fn phase_title(node_id: &str, phase: Phase) -> String {
    match phase {
        Phase::Call => node_id.to_string(),
        _ => format!("ERROR at {} of {}", phase, node_id),
    }
}

impl ErrorHooks for ErrorCapture {
    fn on_internal_error(
        &mut self,
        ctx: &mut HookContext<'_>,
        exception: &ExceptionInfo,
    ) -> Option<bool> {
        let lines = match self
            .traceback
            .internal_error_panel(ctx.console, ctx.config.rootdir(), exception)
        {
            Ok(lines) => lines,
            Err(e) => {
                error!("Could not render internal error panel: {}", e);
                return Some(false);
            }
        };
        match ctx.console.write_lines(&lines) {
            Ok(()) => Some(true),
            Err(e) => {
                error!("Could not write internal error panel: {}", e);
                Some(false)
            }
        }
    }

    fn on_exception_interact(
        &mut self,
        ctx: &mut HookContext<'_>,
        call: &CallInfo,
        report: &ReportInfo,
    ) -> HookResult {
        if ctx.results.exception_for(&report.node_id, call.phase).is_some() {
            debug!(
                "Exception for {} ({}) already recorded, ignoring",
                report.node_id, call.phase
            );
            return Ok(());
        }

        let mut report = report.clone();
        report.phase.get_or_insert(call.phase);
        let title = phase_title(&report.node_id, call.phase);
        let panel = self.traceback.exception_panel(
            ctx.console,
            ctx.config.rootdir(),
            &title,
            &call.exception,
        )?;
        ctx.results
            .record_exception(ErrorInfo::new(call.exception.clone(), report, panel));
        Ok(())
    }
}

impl Plugin for ErrorCapture {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn errors(&mut self) -> Option<&mut dyn ErrorHooks> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{Outcome, RunConfig};
    use crate::state::RunResults;
    use crate::term::{Console, ConsoleOptions};
    use crate::time::{Clock, ManualClock};

    fn run<T>(f: impl FnOnce(&mut HookContext<'_>) -> T) -> (T, RunResults, String) {
        let clock = ManualClock::new();
        let mut results = RunResults::new(clock.wall(), clock.now());
        let console = Console::buffer(ConsoleOptions::default());
        let config = RunConfig::new(Settings::default(), "/srv/project");
        let mut ctx = HookContext {
            results: &mut results,
            console: &console,
            config: &config,
            clock: &clock,
        };
        let out = f(&mut ctx);
        (out, results, console.contents())
    }

    #[test]
    fn test_internal_error_handled() {
        let exc = ExceptionInfo::new("RuntimeError", "boom")
            .with_frame("/srv/project/conftest.py", 4, "pytest_configure");
        let (handled, _, out) = run(|ctx| ErrorCapture::new(&Settings::default()).on_internal_error(ctx, &exc));
        assert_eq!(handled, Some(true));
        assert!(out.contains("INTERNAL ERROR"));
        assert!(out.contains("path: conftest.py"));
    }

    #[test]
    fn test_internal_error_outside_root_degrades() {
        let exc = ExceptionInfo::new("RuntimeError", "boom").with_frame("/opt/other/x.py", 4, "f");
        let (handled, _, out) = run(|ctx| ErrorCapture::new(&Settings::default()).on_internal_error(ctx, &exc));
        assert_eq!(handled, Some(false));
        assert_eq!(out, "");
    }

    #[test]
    fn test_first_exception_per_phase_kept() {
        let report = ReportInfo::new("t.py::test_a", Some(Phase::Setup), Outcome::Failed);
        let first = CallInfo {
            phase: Phase::Setup,
            exception: ExceptionInfo::new("ValueError", "first"),
        };
        let second = CallInfo {
            phase: Phase::Setup,
            exception: ExceptionInfo::new("ValueError", "second"),
        };
        let (_, results, _) = run(|ctx| {
            let mut capture = ErrorCapture::new(&Settings::default());
            capture.on_exception_interact(ctx, &first, &report).unwrap();
            capture.on_exception_interact(ctx, &second, &report).unwrap();
        });
        assert_eq!(results.exceptions.len(), 1);
        let info = &results.exceptions[0];
        assert_eq!(info.exception.message, "first");
        assert!(info.panel[0].contains("ERROR at setup of t.py::test_a"));
    }

    #[test]
    fn test_phase_title() {
        assert_eq!(phase_title("t.py::a", Phase::Call), "t.py::a");
        assert_eq!(phase_title("t.py::a", Phase::Teardown), "ERROR at teardown of t.py::a");
    }
}
