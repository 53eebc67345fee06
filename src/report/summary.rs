// End-of-run summaries: errors, failures, warnings and the stats line

use console::Style;
use std::io;
use std::time::Duration;

use crate::hooks::events::Phase;
use crate::state::{ErrorInfo, RunResults, WarningRecord};
use crate::term::Console;
use crate::time::format_session_duration;
use crate::utils::pluralize;

/// Warnings sharing one message text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningGroup {
    pub hash: String,
    pub records: Vec<WarningRecord>,
}

impl WarningGroup {
    /// Distinct locations, in first-seen order
    pub fn locations(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for record in &self.records {
            let location = record.location();
            if !out.contains(&location) {
                out.push(location);
            }
        }
        out
    }
}

/// Group records by content hash, keeping first-seen order
pub fn group_warnings<'a>(records: impl IntoIterator<Item = &'a WarningRecord>) -> Vec<WarningGroup> {
    let mut groups: Vec<WarningGroup> = Vec::new();
    for record in records {
        match groups.iter_mut().find(|g| g.hash == record.hash) {
            Some(group) => group.records.push(record.clone()),
            None => groups.push(WarningGroup {
                hash: record.hash.clone(),
                records: vec![record.clone()],
            }),
        }
    }
    groups
}

/// Overall color of the stats line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsColor {
    Red,
    Yellow,
    Green,
}

/// The closing statistics line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsLine {
    pub text: String,
    pub color: StatsColor,
}

/// Writes the end-of-run sections.
pub struct SummaryRenderer<'a> {
    console: &'a Console,
    show_capture: bool,
}

impl<'a> SummaryRenderer<'a> {
    pub fn new(console: &'a Console, show_capture: bool) -> Self {
        Self {
            console,
            show_capture,
        }
    }

    fn error_section(&self, label: &str, info: &ErrorInfo) -> io::Result<()> {
        let theme = self.console.theme();
        self.console.rule(label, '_', &theme.error)?;
        self.console.write_lines(&info.panel)?;
        if self.show_capture {
            for section in &info.report.sections {
                if section.content.trim().is_empty() {
                    continue;
                }
                self.console.rule(&section.title, '-', &theme.dim)?;
                self.console.write_line(section.content.trim_end())?;
            }
        }
        Ok(())
    }

    /// Collection errors and setup/teardown errors under `ERRORS`, then
    /// call-phase failures under `FAILURES`, each in arrival order.
    pub fn summarize_errors(&self, results: &RunResults) -> io::Result<()> {
        let theme = self.console.theme();
        let collection_errors: Vec<(&str, &ErrorInfo)> = results
            .collection
            .as_ref()
            .map(|c| c.errors().collect())
            .unwrap_or_default();
        let phase_errors: Vec<&ErrorInfo> = results
            .exceptions
            .iter()
            .filter(|e| e.phase() != Some(Phase::Call))
            .collect();
        let failures: Vec<&ErrorInfo> = results
            .exceptions
            .iter()
            .filter(|e| e.phase() == Some(Phase::Call))
            .collect();

        if !collection_errors.is_empty() || !phase_errors.is_empty() {
            self.console.rule("ERRORS", '=', &theme.error)?;
            for (module, info) in collection_errors {
                self.error_section(&format!("ERROR collecting {}", module), info)?;
            }
            for info in phase_errors {
                let phase = info.phase().map_or_else(|| String::from("setup"), |p| p.to_string());
                self.error_section(&format!("ERROR at {} of {}", phase, info.node_id()), info)?;
            }
        }

        if !failures.is_empty() {
            self.console.rule("FAILURES", '=', &theme.error)?;
            for info in failures {
                self.error_section(info.node_id(), info)?;
            }
        }
        Ok(())
    }

    /// Print warnings not shown by an earlier pass. Returns how many groups
    /// were printed; zero means nothing was written.
    pub fn summarize_warnings(&self, results: &mut RunResults, final_pass: bool) -> io::Result<usize> {
        let groups = group_warnings(
            results
                .warnings
                .iter()
                .filter(|w| !results.is_warning_displayed(&w.hash)),
        );
        if groups.is_empty() {
            return Ok(0);
        }

        let theme = self.console.theme();
        let title = if final_pass {
            "warnings summary (final)"
        } else {
            "warnings summary"
        };
        self.console.rule(title, '=', &theme.warning)?;

        for group in &groups {
            for location in group.locations() {
                self.console.write_line(&location)?;
            }
            let first = &group.records[0];
            let origin = if first.filename.is_empty() {
                String::new()
            } else {
                format!("{}:{}: ", first.filename, first.lineno)
            };
            for (i, line) in first.message_lines.iter().enumerate() {
                let text = if i == 0 {
                    format!("  {}{}: {}", origin, first.category, line)
                } else {
                    format!("    {}", line)
                };
                self.console
                    .write_line(&self.console.paint(&theme.warning, text))?;
            }
            self.console.write_line("")?;
        }

        for group in &groups {
            results.mark_warning_displayed(&group.hash);
        }
        Ok(groups.len())
    }

    pub fn summarize_stats(&self, results: &RunResults, elapsed: Duration) -> io::Result<()> {
        let line = build_stats_line(results, elapsed);
        let style = self.stats_style(line.color);
        self.console.rule(&line.text, '=', &style)
    }

    fn stats_style(&self, color: StatsColor) -> Style {
        let theme = self.console.theme();
        match color {
            StatsColor::Red => theme.error.clone(),
            StatsColor::Yellow => theme.warning.clone(),
            StatsColor::Green => theme.success.clone(),
        }
    }
}

/// Compose the closing statistics line.
///
/// In collect-only runs it reports collected, selected, deselected and
/// errors; otherwise one part per non-zero outcome.
pub fn build_stats_line(results: &RunResults, elapsed: Duration) -> StatsLine {
    let stats = results
        .collection
        .as_ref()
        .map(|c| c.stats)
        .unwrap_or_default();
    let duration = format!(" in {}", format_session_duration(elapsed));

    if results.collect_only {
        let mut parts = Vec::new();
        if stats.collected == 0 {
            parts.push(String::from("no tests collected"));
        } else {
            parts.push(format!("{} collected", pluralize(stats.collected, "test")));
        }
        if stats.deselected > 0 {
            parts.push(format!("{} selected", stats.selected()));
            parts.push(format!("{} deselected", stats.deselected));
        }
        if stats.errors > 0 {
            parts.push(pluralize(stats.errors, "error"));
        }
        let color = if stats.errors > 0 {
            StatsColor::Red
        } else if stats.selected() == 0 {
            StatsColor::Yellow
        } else {
            StatsColor::Green
        };
        return StatsLine {
            text: parts.join(", ") + &duration,
            color,
        };
    }

    let outcomes = &results.outcomes;
    let errors = outcomes.errors + stats.errors;
    let warnings = results.warnings.len();
    let mut parts = Vec::new();
    let mut push = |count: usize, label: String| {
        if count > 0 {
            parts.push(label);
        }
    };
    push(outcomes.failed, format!("{} failed", outcomes.failed));
    push(outcomes.passed, format!("{} passed", outcomes.passed));
    push(outcomes.skipped, format!("{} skipped", outcomes.skipped));
    push(stats.deselected, format!("{} deselected", stats.deselected));
    push(outcomes.xfailed, format!("{} xfailed", outcomes.xfailed));
    push(outcomes.xpassed, format!("{} xpassed", outcomes.xpassed));
    push(warnings, pluralize(warnings, "warning"));
    push(errors, pluralize(errors, "error"));

    let color = if outcomes.failed > 0 || errors > 0 {
        StatsColor::Red
    } else if warnings > 0 || outcomes.xpassed > 0 || outcomes.passed == 0 {
        StatsColor::Yellow
    } else {
        StatsColor::Green
    };
    let text = if parts.is_empty() {
        String::from("no tests ran")
    } else {
        parts.join(", ")
    };
    StatsLine {
        text: text + &duration,
        color,
    }
}
