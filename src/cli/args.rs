// CLI argument definitions using Clap

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Rich terminal reporting for test-run event streams
#[derive(Parser, Debug)]
#[command(name = "richtrace")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Render a recorded test-run event stream as rich terminal output", long_about = None)]
pub struct Cli {
    /// Event stream, one JSON object per line (`-` reads stdin)
    #[arg(value_name = "EVENTS", default_value = "-")]
    pub events: PathBuf,

    /// Enable the rich reporter (plain output otherwise)
    #[arg(long, default_value_t = false)]
    pub rich: bool,

    /// Read RICHTRACE_* variables from this file instead of ./.env
    #[arg(long, value_name = "PATH")]
    pub rich_env_file: Option<PathBuf>,

    /// Increase verbosity (repeat for more)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Decrease verbosity
    #[arg(short = 'q', long, action = ArgAction::Count, conflicts_with = "verbose")]
    pub quiet: u8,

    /// Only report collection
    #[arg(long, default_value_t = false)]
    pub collect_only: bool,

    /// Disable colored output
    #[arg(long, default_value_t = false)]
    pub no_color: bool,

    /// Show captured output of failing tests
    #[arg(long, value_name = "yes|no", value_parser = ["yes", "no"])]
    pub show_capture: Option<String>,

    /// Project root used to shorten paths (defaults to the session's rootdir)
    #[arg(long, value_name = "DIR")]
    pub rootdir: Option<PathBuf>,

    /// Also write the run results as JSON
    #[arg(long, value_name = "FILE")]
    pub json_report: Option<PathBuf>,

    /// Show current configuration and exit
    #[arg(long, default_value_t = false)]
    pub show_config: bool,

    /// Create default configuration file
    #[arg(long, value_name = "CONFIG_FILE")]
    pub init_config: Option<PathBuf>,

    /// Print shell completion (bash, zsh, fish, powershell)
    #[arg(long, value_name = "SHELL_TYPE", value_parser = ["bash", "zsh", "fish", "powershell"])]
    pub completion: Option<String>,
}

impl Cli {
    /// -1 quiet, 0 normal, 1 and up verbose
    pub fn verbosity(&self) -> i8 {
        if self.quiet > 0 {
            -(self.quiet.min(i8::MAX as u8) as i8)
        } else {
            self.verbose.min(i8::MAX as u8) as i8
        }
    }

    pub fn show_capture(&self) -> Option<bool> {
        self.show_capture.as_deref().map(|v| v == "yes")
    }

    pub fn reads_stdin(&self) -> bool {
        self.events.as_os_str() == "-"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["richtrace"]).unwrap();
        assert!(cli.reads_stdin());
        assert!(!cli.rich);
        assert_eq!(cli.verbosity(), 0);
        assert_eq!(cli.show_capture(), None);
    }

    #[test]
    fn test_rich_flags() {
        let cli = Cli::try_parse_from([
            "richtrace",
            "events.jsonl",
            "--rich",
            "--rich-env-file",
            "ci.env",
            "-vv",
            "--show-capture",
            "no",
        ])
        .unwrap();
        assert!(cli.rich);
        assert_eq!(cli.events, PathBuf::from("events.jsonl"));
        assert_eq!(cli.rich_env_file, Some(PathBuf::from("ci.env")));
        assert_eq!(cli.verbosity(), 2);
        assert_eq!(cli.show_capture(), Some(false));
    }

    #[test]
    fn test_quiet_and_verbose_conflict() {
        assert!(Cli::try_parse_from(["richtrace", "-q", "-v"]).is_err());
        let cli = Cli::try_parse_from(["richtrace", "-q"]).unwrap();
        assert_eq!(cli.verbosity(), -1);
    }

    #[test]
    fn test_show_capture_values() {
        assert!(Cli::try_parse_from(["richtrace", "--show-capture", "maybe"]).is_err());
    }
}
