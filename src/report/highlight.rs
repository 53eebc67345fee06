// Light syntax highlighting for traceback source lines

use once_cell::sync::Lazy;
use regex::Regex;

use crate::term::Console;

static TOKENS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"(?P<comment>#.*$)"#,
        r#"|(?P<string>"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*')"#,
        r#"|(?P<number>\b\d+(?:\.\d+)?\b)"#,
        r#"|(?P<keyword>\b(?:def|class|return|if|elif|else|for|while|in|not|and|or|is|None|True|False|import|from|as|with|try|except|finally|raise|assert|lambda|yield|pass|break|continue|async|await|global|nonlocal|del)\b)"#,
    ))
    .expect("token regex is valid")
});

/// Color keywords, strings, numbers and comments in one source line.
/// Returns the line untouched when the console has no color.
pub fn highlight(console: &Console, line: &str) -> String {
    if !console.color_enabled() {
        return line.to_string();
    }
    let theme = console.theme();
    let mut out = String::with_capacity(line.len() * 2);
    let mut last = 0;

    for caps in TOKENS.captures_iter(line) {
        let (style, m) = if let Some(m) = caps.name("comment") {
            (&theme.comment, m)
        } else if let Some(m) = caps.name("string") {
            (&theme.string, m)
        } else if let Some(m) = caps.name("number") {
            (&theme.number, m)
        } else if let Some(m) = caps.name("keyword") {
            (&theme.keyword, m)
        } else {
            continue;
        };
        out.push_str(&line[last..m.start()]);
        out.push_str(&console.paint(style, m.as_str()));
        last = m.end();
    }
    out.push_str(&line[last..]);
    out
}
