// Styles used by every renderer

use console::Style;

/// Named styles. The monochrome theme leaves every style plain.
#[derive(Debug, Clone)]
pub struct Theme {
    pub error: Style,
    pub internal_error: Style,
    pub warning: Style,
    pub success: Style,
    pub info: Style,
    pub dim: Style,
    pub rule: Style,
    pub path: Style,
    pub keyword: Style,
    pub string: Style,
    pub number: Style,
    pub comment: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            error: Style::new().red().bold(),
            internal_error: Style::new().magenta().bold(),
            warning: Style::new().yellow(),
            success: Style::new().green(),
            info: Style::new().cyan(),
            dim: Style::new().dim(),
            rule: Style::new().bold(),
            path: Style::new().cyan(),
            keyword: Style::new().magenta(),
            string: Style::new().green(),
            number: Style::new().cyan(),
            comment: Style::new().dim().italic(),
        }
    }
}

impl Theme {
    pub fn monochrome() -> Self {
        Self {
            error: Style::new(),
            internal_error: Style::new(),
            warning: Style::new(),
            success: Style::new(),
            info: Style::new(),
            dim: Style::new(),
            rule: Style::new(),
            path: Style::new(),
            keyword: Style::new(),
            string: Style::new(),
            number: Style::new(),
            comment: Style::new(),
        }
    }

    pub fn by_name(name: &str) -> Self {
        match name {
            "monochrome" => Self::monochrome(),
            _ => Self::default(),
        }
    }
}
