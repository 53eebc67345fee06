// Traceback panels for collection errors, test failures and internal errors

use console::Style;
use regex::Regex;
use std::path::Path;

use crate::config::Settings;
use crate::error::PathError;
use crate::hooks::events::{ExceptionInfo, Frame};
use crate::report::highlight::highlight;
use crate::term::{Console, Panel};
use crate::utils::PathUtils;

/// Builds bordered traceback panels.
#[derive(Debug, Clone)]
pub struct TracebackRenderer {
    suppress: Vec<Regex>,
    max_frames: usize,
}

impl TracebackRenderer {
    pub fn new(suppress: Vec<Regex>, max_frames: usize) -> Self {
        Self {
            suppress,
            max_frames: max_frames.max(1),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.suppress_patterns(), settings.traceback.max_frames)
    }

    /// Frames from the test framework's own modules
    pub fn is_suppressed(&self, path: &str) -> bool {
        self.suppress.iter().any(|re| re.is_match(path))
    }

    /// The innermost unsuppressed frame under `root`, then any frame under
    /// `root`. When no frame lies under `root` the innermost frame is
    /// returned and relativizing it fails.
    fn crash_frame<'e>(&self, exception: &'e ExceptionInfo, root: &Path) -> Option<&'e Frame> {
        let under_root = |f: &&Frame| PathUtils::is_under(Path::new(&f.path), root);
        let frames = &exception.frames;
        frames
            .iter()
            .rev()
            .filter(under_root)
            .find(|f| !self.is_suppressed(&f.path))
            .or_else(|| frames.iter().rev().find(under_root))
            .or_else(|| exception.crash_frame())
    }

    /// `path:line` for the crash frame, relative to the root.
    ///
    /// Fails only when no frame lies under the root.
    pub fn crash_location(
        &self,
        console: &Console,
        root: &Path,
        exception: &ExceptionInfo,
    ) -> Result<Option<String>, PathError> {
        let Some(frame) = self.crash_frame(exception, root) else {
            return Ok(None);
        };
        let rel = PathUtils::relativize(Path::new(&frame.path), root)?;
        let label = format!("{}:{}", rel.display(), frame.lineno);
        let target = PathUtils::absolute(Path::new(&frame.path), root);
        Ok(Some(console.link(&target, &label)))
    }

    fn frame_lines(&self, console: &Console, root: &Path, exception: &ExceptionInfo) -> Vec<String> {
        let theme = console.theme();
        let skip = exception.frames.len().saturating_sub(self.max_frames);
        let mut lines = Vec::new();
        if skip > 0 {
            lines.push(console.paint(&theme.dim, format!("[... {} frames hidden ...]", skip)));
        }

        for frame in exception.frames.iter().skip(skip) {
            let shown = PathUtils::display(Path::new(&frame.path), root);
            let label = format!("{}:{}", shown, frame.lineno);
            let location = if frame.function.is_empty() {
                label
            } else {
                format!("{} in {}", label, frame.function)
            };

            if self.is_suppressed(&frame.path) {
                lines.push(console.paint(&theme.dim, location));
                if let Some(source) = &frame.source {
                    lines.push(console.paint(&theme.dim, format!("    {}", source.trim_end())));
                }
            } else {
                let target = PathUtils::absolute(Path::new(&frame.path), root);
                lines.push(console.link(&target, &console.paint(&theme.path, location)));
                if let Some(source) = &frame.source {
                    lines.push(format!("    {}", highlight(console, source.trim_end())));
                }
            }
        }
        lines
    }

    /// Panel for a collection error or a failing test phase
    pub fn exception_panel(
        &self,
        console: &Console,
        root: &Path,
        title: &str,
        exception: &ExceptionInfo,
    ) -> Result<Vec<String>, PathError> {
        let theme = console.theme();
        let mut panel = Panel::new().title(title).border(theme.error.clone());

        for line in self.frame_lines(console, root, exception) {
            panel.push(line);
        }
        if !exception.frames.is_empty() {
            panel.push("");
        }
        for line in exception.summary().lines() {
            panel.push(console.paint(&theme.error, line));
        }
        if let Some(location) = self.crash_location(console, root, exception)? {
            panel.push(console.paint(&theme.dim, format!("at {}", location)));
        }

        Ok(panel.render(console))
    }

    /// Panel for a crash inside the test framework itself
    pub fn internal_error_panel(
        &self,
        console: &Console,
        root: &Path,
        exception: &ExceptionInfo,
    ) -> Result<Vec<String>, PathError> {
        let theme = console.theme();
        let border: Style = theme.internal_error.clone();
        let mut panel = Panel::new().title("INTERNAL ERROR").border(border);

        panel.push(console.paint(&theme.internal_error, exception.summary()));
        if let Some(frame) = self.crash_frame(exception, root) {
            let rel = PathUtils::relativize(Path::new(&frame.path), root)?;
            panel.push(format!("path: {}", rel.display()));
            panel.push(format!("line: {}", frame.lineno));
        }
        if !exception.frames.is_empty() {
            panel.push("");
            for line in self.frame_lines(console, root, exception) {
                panel.push(line);
            }
        }

        Ok(panel.render(console))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::ConsoleOptions;

    fn renderer() -> TracebackRenderer {
        TracebackRenderer::from_settings(&Settings::default())
    }

    fn console() -> Console {
        Console::buffer(ConsoleOptions {
            width: 72,
            ..ConsoleOptions::default()
        })
    }

    fn failing_exception() -> ExceptionInfo {
        let mut exc = ExceptionInfo::new("AssertionError", "assert 1 == 2")
            .with_frame("/venv/lib/site-packages/_pytest/python.py", 194, "pytest_pyfunc_call")
            .with_frame("/srv/project/tests/test_math.py", 12, "test_add");
        exc.frames[1].source = Some("    assert add(1, 1) == 3".to_string());
        exc
    }

    #[test]
    fn test_default_suppression() {
        let r = renderer();
        assert!(r.is_suppressed("/venv/lib/site-packages/_pytest/runner.py"));
        assert!(r.is_suppressed("/venv/lib/python3.12/site-packages/pluggy/_hooks.py"));
        assert!(!r.is_suppressed("/srv/project/tests/test_math.py"));
    }

    #[test]
    fn test_exception_panel_contents() {
        let lines = renderer()
            .exception_panel(
                &console(),
                Path::new("/srv/project"),
                "tests/test_math.py::test_add",
                &failing_exception(),
            )
            .unwrap();
        let text = lines.join("\n");

        assert!(lines[0].contains("tests/test_math.py::test_add"));
        assert!(text.contains("tests/test_math.py:12 in test_add"));
        assert!(text.contains("assert add(1, 1) == 3"));
        assert!(text.contains("AssertionError: assert 1 == 2"));
        assert!(text.contains("at tests/test_math.py:12"));
    }

    #[test]
    fn test_suppressed_frames_are_dimmed() {
        let console = Console::buffer(ConsoleOptions {
            color: true,
            width: 100,
            ..ConsoleOptions::default()
        });
        let lines = renderer()
            .exception_panel(&console, Path::new("/srv/project"), "t", &failing_exception())
            .unwrap();
        let framework_line = lines
            .iter()
            .find(|l| l.contains("python.py:194"))
            .expect("framework frame shown");
        let dim = console.paint(&console.theme().dim, "x");
        let dim_prefix = &dim[..dim.find('x').unwrap()];
        assert!(framework_line.contains(dim_prefix));
    }

    #[test]
    fn test_internal_error_panel() {
        let exc = ExceptionInfo::new("RuntimeError", "hook crashed")
            .with_frame("/srv/project/conftest.py", 8, "pytest_configure");
        let lines = renderer()
            .internal_error_panel(&console(), Path::new("/srv/project"), &exc)
            .unwrap();
        let text = lines.join("\n");
        assert!(lines[0].contains("INTERNAL ERROR"));
        assert!(text.contains("RuntimeError: hook crashed"));
        assert!(text.contains("path: conftest.py"));
        assert!(text.contains("line: 8"));
    }

    #[test]
    fn test_crash_outside_root_is_an_error() {
        let exc = ExceptionInfo::new("ImportError", "x").with_frame("/elsewhere/mod.py", 1, "");
        let err = renderer()
            .exception_panel(&console(), Path::new("/srv/project"), "t", &exc)
            .unwrap_err();
        assert_eq!(err.root, Path::new("/srv/project"));
    }

    #[test]
    fn test_failure_inside_stdlib_points_at_project_frame() {
        let exc = ExceptionInfo::new("JSONDecodeError", "Expecting value")
            .with_frame("/srv/project/tests/test_a.py", 5, "test_load")
            .with_frame("/usr/lib/python3.12/json/__init__.py", 346, "loads")
            .with_frame("/usr/lib/python3.12/json/decoder.py", 355, "raw_decode");

        let lines = renderer()
            .exception_panel(&console(), Path::new("/srv/project"), "t", &exc)
            .unwrap();
        let text = lines.join("\n");

        assert!(text.contains("at tests/test_a.py:5"));
        assert!(text.contains("/usr/lib/python3.12/json/decoder.py:355 in raw_decode"));

        let panel = renderer()
            .internal_error_panel(&console(), Path::new("/srv/project"), &exc)
            .unwrap()
            .join("\n");
        assert!(panel.contains("path: tests/test_a.py"));
    }

    #[test]
    fn test_max_frames() {
        let mut exc = ExceptionInfo::new("RecursionError", "deep");
        for i in 0..5 {
            exc = exc.with_frame("/srv/project/r.py", i + 1, "recurse");
        }
        let r = TracebackRenderer::new(Vec::new(), 2);
        let lines = r
            .exception_panel(&console(), Path::new("/srv/project"), "t", &exc)
            .unwrap();
        let text = lines.join("\n");
        assert!(text.contains("[... 3 frames hidden ...]"));
        assert!(!text.contains("r.py:1 "));
        assert!(text.contains("r.py:5 in recurse"));
    }
}
