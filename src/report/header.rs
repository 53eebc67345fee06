// Session header: "test session starts" rule and environment lines

use std::io;

use crate::hooks::{PluginRegistry, SessionInfo};
use crate::term::Console;

/// Lines printed under the session rule
pub fn header_lines(session: &SessionInfo, registry: &PluginRegistry) -> Vec<String> {
    let mut lines = Vec::new();

    let mut platform = Vec::new();
    if let Some(p) = &session.platform {
        platform.push(format!("platform {}", p));
    }
    if let Some(f) = &session.framework {
        platform.push(f.clone());
    }
    platform.push(format!("richtrace-{}", env!("CARGO_PKG_VERSION")));
    lines.push(platform.join(" -- "));

    let mut root = format!("rootdir: {}", session.rootdir);
    if let Some(ini) = &session.inifile {
        root.push_str(&format!(", configfile: {}", ini));
    }
    lines.push(root);

    let mut plugins: Vec<&str> = session.plugins.iter().map(String::as_str).collect();
    for name in registry.names() {
        if !plugins.contains(&name.as_str()) {
            plugins.push(name);
        }
    }
    if !plugins.is_empty() {
        lines.push(format!("plugins: {}", plugins.join(", ")));
    }
    lines
}

pub fn print_header(
    console: &Console,
    session: &SessionInfo,
    registry: &PluginRegistry,
) -> io::Result<()> {
    let theme = console.theme();
    console.rule("test session starts", '=', &theme.rule)?;
    console.write_lines(&header_lines(session, registry))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lines() {
        let session = SessionInfo {
            rootdir: "/srv/project".to_string(),
            platform: Some("linux".to_string()),
            framework: Some("pytest-8.3.2".to_string()),
            inifile: Some("pyproject.toml".to_string()),
            plugins: vec!["cov-5.0".to_string()],
            ..Default::default()
        };
        let mut registry = PluginRegistry::new();
        registry.add("rich-collection");

        let lines = header_lines(&session, &registry);

        assert!(lines[0].starts_with("platform linux -- pytest-8.3.2 -- richtrace-"));
        assert_eq!(lines[1], "rootdir: /srv/project, configfile: pyproject.toml");
        assert_eq!(lines[2], "plugins: cov-5.0, rich-collection");
    }

    #[test]
    fn test_no_plugins_line_when_empty() {
        let session = SessionInfo {
            rootdir: "/r".to_string(),
            ..Default::default()
        };
        let lines = header_lines(&session, &PluginRegistry::new());
        assert_eq!(lines.len(), 2);
    }
}
