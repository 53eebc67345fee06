// Console sinks - stdout, stderr and an in-memory buffer
//
// Each sink is built once per process and cached. Terminal capabilities
// (interactivity, width, color) are detected when the sink is created.

pub mod panel;
pub mod theme;

pub use panel::{Panel, rule_text};
pub use theme::Theme;

use console::{Style, Term};
use once_cell::sync::OnceCell;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::config::Settings;

/// What `Term::clear_line` emits, reproduced for interactive test buffers
const ERASE_LINE: &str = "\r\x1b[2K";
const DEFAULT_WIDTH: usize = 80;

/// Which sink a console writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsoleKind {
    Stdout,
    Stderr,
    Buffer,
}

/// Capabilities for a console built by hand (tests, captured output)
#[derive(Debug, Clone)]
pub struct ConsoleOptions {
    pub interactive: bool,
    pub color: bool,
    pub hyperlinks: bool,
    pub width: usize,
    pub theme: Theme,
}

impl Default for ConsoleOptions {
    fn default() -> Self {
        Self {
            interactive: false,
            color: false,
            hyperlinks: false,
            width: DEFAULT_WIDTH,
            theme: Theme::default(),
        }
    }
}

enum Target {
    Term(Term),
    Buffer(Mutex<Vec<u8>>),
}

struct Inner {
    kind: ConsoleKind,
    target: Target,
    options: ConsoleOptions,
}

/// A styled output sink. Cheap to clone; clones share the sink.
#[derive(Clone)]
pub struct Console {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("kind", &self.inner.kind)
            .field("interactive", &self.inner.options.interactive)
            .field("color", &self.inner.options.color)
            .field("width", &self.inner.options.width)
            .finish()
    }
}

static STDOUT: OnceCell<Console> = OnceCell::new();
static STDERR: OnceCell<Console> = OnceCell::new();
static BUFFER: OnceCell<Console> = OnceCell::new();

/// The process-wide console for `kind`, created on first use from `settings`.
pub fn get(kind: ConsoleKind, settings: &Settings) -> Console {
    let cell = match kind {
        ConsoleKind::Stdout => &STDOUT,
        ConsoleKind::Stderr => &STDERR,
        ConsoleKind::Buffer => &BUFFER,
    };
    cell.get_or_init(|| Console::detect(kind, settings)).clone()
}

/// The console reporters should write to: stdout, or the buffer when
/// console output is switched off.
pub fn output(settings: &Settings) -> Console {
    if settings.console.console_output {
        get(ConsoleKind::Stdout, settings)
    } else {
        get(ConsoleKind::Buffer, settings)
    }
}

impl Console {
    /// Build a console for a real sink, probing the terminal.
    pub fn detect(kind: ConsoleKind, settings: &Settings) -> Self {
        let theme = Theme::by_name(&settings.console.theme);
        let term = match kind {
            ConsoleKind::Stdout => Some(Term::stdout()),
            ConsoleKind::Stderr => Some(Term::stderr()),
            ConsoleKind::Buffer => None,
        };

        match term {
            Some(term) => {
                let interactive = term.is_term();
                let width = settings
                    .console
                    .width
                    .or_else(|| term.size_checked().map(|(_, cols)| cols as usize))
                    .unwrap_or(DEFAULT_WIDTH);
                let options = ConsoleOptions {
                    interactive,
                    color: settings.color_enabled() && interactive,
                    hyperlinks: settings.console.hyperlinks && interactive,
                    width,
                    theme,
                };
                Self::from_target(kind, Target::Term(term), options)
            }
            None => Self::buffer(ConsoleOptions {
                width: settings.console.width.unwrap_or(DEFAULT_WIDTH),
                theme,
                ..ConsoleOptions::default()
            }),
        }
    }

    /// An in-memory console; read it back with [`Console::contents`].
    pub fn buffer(options: ConsoleOptions) -> Self {
        Self::from_target(ConsoleKind::Buffer, Target::Buffer(Mutex::new(Vec::new())), options)
    }

    fn from_target(kind: ConsoleKind, target: Target, options: ConsoleOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                kind,
                target,
                options,
            }),
        }
    }

    pub fn kind(&self) -> ConsoleKind {
        self.inner.kind
    }

    pub fn is_interactive(&self) -> bool {
        self.inner.options.interactive
    }

    pub fn color_enabled(&self) -> bool {
        self.inner.options.color
    }

    pub fn width(&self) -> usize {
        self.inner.options.width
    }

    pub fn theme(&self) -> &Theme {
        &self.inner.options.theme
    }

    fn write_raw(&self, text: &str) -> io::Result<()> {
        match &self.inner.target {
            Target::Term(term) => {
                let mut term = term.clone();
                term.write_all(text.as_bytes())?;
                term.flush()
            }
            Target::Buffer(buf) => {
                let mut buf = buf.lock().unwrap_or_else(|e| e.into_inner());
                buf.extend_from_slice(text.as_bytes());
                Ok(())
            }
        }
    }

    /// Write text without a trailing newline
    pub fn write_str(&self, text: &str) -> io::Result<()> {
        self.write_raw(text)
    }

    pub fn write_line(&self, text: &str) -> io::Result<()> {
        self.write_raw(&format!("{}\n", text))
    }

    pub fn write_lines<S: AsRef<str>>(&self, lines: &[S]) -> io::Result<()> {
        let mut out = String::new();
        for line in lines {
            out.push_str(line.as_ref());
            out.push('\n');
        }
        self.write_raw(&out)
    }

    /// Replace the current line in place on a terminal; append a new line
    /// anywhere else. No control codes reach a non-interactive sink.
    pub fn rewrite_line(&self, text: &str) -> io::Result<()> {
        if !self.is_interactive() {
            return self.write_line(text);
        }
        match &self.inner.target {
            Target::Term(term) => {
                term.clear_line()?;
                self.write_raw(text)
            }
            Target::Buffer(_) => self.write_raw(&format!("{}{}", ERASE_LINE, text)),
        }
    }

    /// Apply a style, honoring this console's color setting
    pub fn paint(&self, style: &Style, text: impl std::fmt::Display) -> String {
        style
            .clone()
            .force_styling(self.color_enabled())
            .apply_to(text)
            .to_string()
    }

    /// Full-width section rule, e.g. `==== warnings summary ====`
    pub fn rule(&self, title: &str, fill: char, style: &Style) -> io::Result<()> {
        let text = rule_text(title, fill, self.width());
        self.write_line(&self.paint(style, text))
    }

    /// `label`, linked to `path` when the terminal supports hyperlinks
    pub fn link(&self, path: &Path, label: &str) -> String {
        if self.inner.options.hyperlinks {
            format!(
                "\x1b]8;;file://{}\x1b\\{}\x1b]8;;\x1b\\",
                path.display(),
                label
            )
        } else {
            label.to_string()
        }
    }

    /// Everything written so far; empty for terminal sinks
    pub fn contents(&self) -> String {
        match &self.inner.target {
            Target::Buffer(buf) => {
                let buf = buf.lock().unwrap_or_else(|e| e.into_inner());
                String::from_utf8_lossy(&buf).into_owned()
            }
            Target::Term(_) => String::new(),
        }
    }

    /// Drain the buffer, returning what it held
    pub fn take_contents(&self) -> String {
        match &self.inner.target {
            Target::Buffer(buf) => {
                let mut buf = buf.lock().unwrap_or_else(|e| e.into_inner());
                let text = String::from_utf8_lossy(&buf).into_owned();
                buf.clear();
                text
            }
            Target::Term(_) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_line_non_interactive_appends() {
        let console = Console::buffer(ConsoleOptions::default());
        console.rewrite_line("collecting ... 1 item").unwrap();
        console.rewrite_line("collecting ... 2 items").unwrap();
        let out = console.contents();
        assert_eq!(out, "collecting ... 1 item\ncollecting ... 2 items\n");
        assert!(!out.contains('\x1b'));
        assert!(!out.contains('\r'));
    }

    #[test]
    fn test_rewrite_line_interactive_erases() {
        let console = Console::buffer(ConsoleOptions {
            interactive: true,
            ..ConsoleOptions::default()
        });
        console.rewrite_line("a").unwrap();
        console.rewrite_line("b").unwrap();
        assert_eq!(console.contents(), "\r\x1b[2Ka\r\x1b[2Kb");
    }

    #[test]
    fn test_paint_respects_color() {
        let style = Style::new().red();
        let plain = Console::buffer(ConsoleOptions::default());
        assert_eq!(plain.paint(&style, "x"), "x");
        let colored = Console::buffer(ConsoleOptions {
            color: true,
            ..ConsoleOptions::default()
        });
        assert!(colored.paint(&style, "x").contains("\x1b["));
    }

    #[test]
    fn test_link() {
        let plain = Console::buffer(ConsoleOptions::default());
        assert_eq!(plain.link(Path::new("/p/a.py"), "a.py:3"), "a.py:3");
        let linked = Console::buffer(ConsoleOptions {
            hyperlinks: true,
            ..ConsoleOptions::default()
        });
        let text = linked.link(Path::new("/p/a.py"), "a.py:3");
        assert!(text.contains("file:///p/a.py"));
        assert!(text.contains("a.py:3"));
    }

    #[test]
    fn test_take_contents_drains() {
        let console = Console::buffer(ConsoleOptions::default());
        console.write_line("x").unwrap();
        assert_eq!(console.take_contents(), "x\n");
        assert_eq!(console.contents(), "");
    }
}
