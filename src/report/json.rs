// JSON reporter - writes the run results to a JSON file

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use crate::state::{ExitStatus, RunResults};

#[derive(Serialize)]
struct JsonReport<'a> {
    version: &'static str,
    exit_status: ExitStatus,
    exit_code: u8,
    duration_ms: u128,
    #[serde(flatten)]
    results: &'a RunResults,
}

/// JSON reporter
pub struct JsonReporter {
    output_path: PathBuf,
}

impl JsonReporter {
    pub fn new(output_path: PathBuf) -> Self {
        Self { output_path }
    }

    pub fn write(&self, results: &RunResults, elapsed: Duration) -> Result<()> {
        let status = results.resolve_exit_status();
        let report = JsonReport {
            version: env!("CARGO_PKG_VERSION"),
            exit_status: status,
            exit_code: status.code(),
            duration_ms: elapsed.as_millis(),
            results,
        };

        let file = File::create(&self.output_path).with_context(|| {
            format!(
                "Failed to create JSON report file: {}",
                self.output_path.display()
            )
        })?;

        serde_json::to_writer_pretty(file, &report)
            .context("Failed to serialize run results to JSON")?;

        Ok(())
    }
}
