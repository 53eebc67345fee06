use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{Event, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::writer::MakeWriter;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use crate::config::Settings;

pub struct CustomFormatter;

impl<S, N> FormatEvent<S, N> for CustomFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let level = event.metadata().level();
        let timestamp = Local::now().format("%H:%M:%S");

        let level_str = match *level {
            tracing::Level::TRACE => "TRACE",
            tracing::Level::DEBUG => "DEBUG",
            tracing::Level::INFO => "INFO",
            tracing::Level::WARN => "WARN",
            tracing::Level::ERROR => "ERROR",
        };

        write!(writer, "{} [{}]: ", level_str, timestamp)?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Log sink: the configured log file, else stderr. One lock serializes
/// choosing the sink and writing to it, so lines never interleave.
#[derive(Clone)]
pub struct ConsoleLogWriter {
    file: Option<Arc<Mutex<File>>>,
}

static SINK_LOCK: Mutex<()> = Mutex::new(());

impl ConsoleLogWriter {
    pub fn stderr() -> Self {
        Self { file: None }
    }

    pub fn to_file(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Some(Arc::new(Mutex::new(file))),
        })
    }
}

pub struct LogHandle {
    file: Option<Arc<Mutex<File>>>,
}

impl Write for LogHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let _guard = SINK_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        match &self.file {
            Some(file) => {
                let mut file = file.lock().unwrap_or_else(|e| e.into_inner());
                file.write(buf)
            }
            None => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let _guard = SINK_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        match &self.file {
            Some(file) => file.lock().unwrap_or_else(|e| e.into_inner()).flush(),
            None => io::stderr().flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for ConsoleLogWriter {
    type Writer = LogHandle;

    fn make_writer(&'a self) -> Self::Writer {
        LogHandle {
            file: self.file.clone(),
        }
    }
}

/// Filter directive for the given settings. `-v` raises the crate's own
/// level to debug.
pub fn filter_directive(settings: &Settings, verbose: bool) -> String {
    if verbose {
        format!("richtrace=debug,{}", settings.log.level)
    } else {
        format!("richtrace={},warn", settings.log.level)
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init_tracing(settings: &Settings, verbose: bool) -> io::Result<()> {
    let writer = match &settings.log.file {
        Some(path) => ConsoleLogWriter::to_file(path)?,
        None => ConsoleLogWriter::stderr(),
    };
    let filter = filter_directive(settings, verbose);

    // a second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .event_format(CustomFormatter)
        .with_writer(writer)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .try_init();
    Ok(())
}
