// Run command - replay an event stream through the tracer

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

use crate::cli::Cli;
use crate::config::Settings;
use crate::error::ReplayError;
use crate::hooks::RunConfig;
use crate::report::JsonReporter;
use crate::replay::replay;
use crate::state::ExitStatus;
use crate::term;
use crate::time::SystemClock;
use crate::tracer::Tracer;

/// Command-line flags win over every other settings source
pub fn apply_cli_overrides(settings: &mut Settings, cli: &Cli) {
    if cli.no_color {
        settings.console.color = 0;
    }
    if let Some(show) = cli.show_capture() {
        settings.traceback.show_capture = show;
    }
}

/// Exit status for a replay that stopped early. Read failures are passed
/// back to the caller.
pub fn failure_status(err: ReplayError) -> Result<ExitStatus, ReplayError> {
    match err {
        ReplayError::Decode { line, source } => {
            eprintln!("Error: line {}: malformed event: {}", line, source);
            Ok(ExitStatus::UsageError)
        }
        ReplayError::Hook(e) => {
            error!("Reporter failed: {}", e);
            eprintln!("INTERNALERROR> {}", e);
            Ok(ExitStatus::InternalError)
        }
        e @ ReplayError::Io(_) => Err(e),
    }
}

pub fn run_replay(cli: &Cli, settings: Settings) -> Result<ExitStatus> {
    let pinned = cli.rootdir.is_some();
    let rootdir = match &cli.rootdir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };

    let mut config = RunConfig::new(settings, rootdir);
    config.verbosity = cli.verbosity();
    config.collect_only = cli.collect_only;

    let console = term::output(&config.settings);
    let mut tracer = Tracer::new(config, console, Box::new(SystemClock), cli.rich);
    if pinned {
        tracer = tracer.pin_rootdir();
    }

    let outcome = if cli.reads_stdin() {
        info!("Reading events from stdin");
        replay(io::stdin().lock(), &mut tracer)
    } else {
        info!("Reading events from {}", cli.events.display());
        let file = File::open(&cli.events)
            .with_context(|| format!("Failed to open event stream: {}", cli.events.display()))?;
        replay(BufReader::new(file), &mut tracer)
    };

    let status = match outcome {
        Ok(status) => status,
        Err(e) => failure_status(e).context("Failed to read event stream")?,
    };

    if let Some(path) = &cli.json_report {
        let elapsed = tracer.results().elapsed(Instant::now());
        JsonReporter::new(path.clone()).write(tracer.results(), elapsed)?;
        info!("JSON report written to {}", path.display());
    }

    Ok(status)
}
