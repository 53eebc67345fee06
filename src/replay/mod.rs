// Event stream replay
//
// A host adapter writes one JSON object per line, tagged by `event`. The
// stream is fed through a `Tracer` in order.

use serde::{Deserialize, Serialize};
use std::io::BufRead;
use tracing::{debug, warn};

use crate::error::ReplayError;
use crate::hooks::{
    CallInfo, CollectedItem, ExceptionInfo, ReportInfo, SessionInfo, WarningMessage,
};
use crate::state::ExitStatus;
use crate::tracer::Tracer;

fn default_interrupt() -> String {
    String::from("KeyboardInterrupt")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StreamEvent {
    SessionStart {
        session: SessionInfo,
    },
    CollectionStart {
        #[serde(default)]
        session_id: String,
    },
    ItemCollected {
        item: CollectedItem,
    },
    ItemsDeselected {
        node_ids: Vec<String>,
    },
    CollectionIgnored {
        path: String,
    },
    CollectError {
        exception: ExceptionInfo,
        report: ReportInfo,
    },
    CollectionFinish,
    TestReport {
        report: ReportInfo,
    },
    RuntestFinish,
    ExceptionInteract {
        call: CallInfo,
        report: ReportInfo,
    },
    WarningRecorded {
        warning: WarningMessage,
    },
    InternalError {
        exception: ExceptionInfo,
    },
    Interrupted {
        #[serde(default = "default_interrupt")]
        message: String,
    },
    SessionFinish {
        #[serde(default)]
        exit_status: Option<ExitStatus>,
    },
}

impl StreamEvent {
    pub fn parse(line: &str, lineno: usize) -> Result<Self, ReplayError> {
        serde_json::from_str(line).map_err(|source| ReplayError::Decode {
            line: lineno,
            source,
        })
    }

    /// The `event` tag
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SessionStart { .. } => "session_start",
            Self::CollectionStart { .. } => "collection_start",
            Self::ItemCollected { .. } => "item_collected",
            Self::ItemsDeselected { .. } => "items_deselected",
            Self::CollectionIgnored { .. } => "collection_ignored",
            Self::CollectError { .. } => "collect_error",
            Self::CollectionFinish => "collection_finish",
            Self::TestReport { .. } => "test_report",
            Self::RuntestFinish => "runtest_finish",
            Self::ExceptionInteract { .. } => "exception_interact",
            Self::WarningRecorded { .. } => "warning_recorded",
            Self::InternalError { .. } => "internal_error",
            Self::Interrupted { .. } => "interrupted",
            Self::SessionFinish { .. } => "session_finish",
        }
    }
}

/// Send one event through the tracer. Returns the exit status once the
/// session finishes.
pub fn dispatch(tracer: &mut Tracer, event: StreamEvent) -> Result<Option<ExitStatus>, ReplayError> {
    match event {
        StreamEvent::SessionStart { session } => tracer.session_start(session)?,
        StreamEvent::CollectionStart { session_id } => tracer.collection_start(&session_id)?,
        StreamEvent::ItemCollected { item } => tracer.item_collected(&item)?,
        StreamEvent::ItemsDeselected { node_ids } => tracer.items_deselected(&node_ids)?,
        StreamEvent::CollectionIgnored { path } => tracer.collection_ignored(&path)?,
        StreamEvent::CollectError { exception, report } => {
            tracer.collect_error(&exception, &report)?
        }
        StreamEvent::CollectionFinish => {
            tracer.collection_finish()?;
        }
        StreamEvent::TestReport { report } => tracer.test_report(&report)?,
        StreamEvent::RuntestFinish => tracer.runtest_finish()?,
        StreamEvent::ExceptionInteract { call, report } => {
            tracer.exception_interact(&call, &report)?
        }
        StreamEvent::WarningRecorded { warning } => tracer.warning_recorded(&warning)?,
        StreamEvent::InternalError { exception } => {
            tracer.internal_error(&exception)?;
        }
        StreamEvent::Interrupted { message } => tracer.interrupted(&message)?,
        StreamEvent::SessionFinish { exit_status } => {
            return Ok(Some(tracer.session_finish(exit_status)?));
        }
    }
    Ok(None)
}

/// Replay a whole stream. Blank lines are skipped. A stream that ends
/// without `session_finish` is closed as if the host had sent one.
pub fn replay<R: BufRead>(reader: R, tracer: &mut Tracer) -> Result<ExitStatus, ReplayError> {
    let mut status = None;
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if status.is_some() {
            warn!("Ignoring line {} after session finish", idx + 1);
            continue;
        }
        let event = StreamEvent::parse(trimmed, idx + 1)?;
        debug!("Event on line {}: {}", idx + 1, event.kind());
        status = dispatch(tracer, event)?;
    }

    match status {
        Some(status) => Ok(status),
        None => {
            warn!("Event stream ended without session_finish");
            Ok(tracer.session_finish(None)?)
        }
    }
}
