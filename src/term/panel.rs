// Bordered panels and rules

use console::{Style, measure_text_width, truncate_str};

use super::Console;

/// A rule line of `width` columns with `title` centred in it
pub fn rule_text(title: &str, fill: char, width: usize) -> String {
    if title.is_empty() {
        return fill.to_string().repeat(width);
    }
    let title_width = measure_text_width(title) + 2;
    if title_width + 2 > width {
        return format!("{} {} {}", fill, title, fill);
    }
    let left = (width - title_width) / 2;
    let right = width - title_width - left;
    format!(
        "{} {} {}",
        fill.to_string().repeat(left),
        title,
        fill.to_string().repeat(right)
    )
}

/// Lines framed by a rounded border, with an optional title in the top edge.
#[derive(Debug, Clone, Default)]
pub struct Panel {
    title: Option<String>,
    lines: Vec<String>,
    border: Style,
}

impl Panel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn border(mut self, style: Style) -> Self {
        self.border = style;
        self
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Render to lines no wider than the console
    pub fn render(&self, console: &Console) -> Vec<String> {
        let width = console.width().max(8);
        let inner = width - 4;
        let mut out = Vec::with_capacity(self.lines.len() + 2);

        let top = match &self.title {
            Some(title) => {
                let title = truncate_str(title, inner.saturating_sub(2), "…");
                let fill = width.saturating_sub(measure_text_width(&title) + 5);
                format!("╭─ {} {}╮", title, "─".repeat(fill))
            }
            None => format!("╭{}╮", "─".repeat(width - 2)),
        };
        out.push(console.paint(&self.border, top));

        let side = console.paint(&self.border, "│");
        for line in &self.lines {
            let text = truncate_str(line, inner, "…");
            let pad = inner.saturating_sub(measure_text_width(&text));
            out.push(format!("{} {}{} {}", side, text, " ".repeat(pad), side));
        }

        out.push(console.paint(&self.border, format!("╰{}╯", "─".repeat(width - 2))));
        out
    }
}
