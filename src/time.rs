// Clock abstraction and duration formatting

use chrono::{DateTime, Utc};
use indicatif::HumanDuration;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of wall-clock and monotonic time.
pub trait Clock: Send + Sync {
    /// Monotonic instant, used for elapsed time and redraw throttling
    fn now(&self) -> Instant;
    /// Wall-clock time, used for timestamps shown to the user
    fn wall(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    wall_base: DateTime<Utc>,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            wall_base: Utc::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }

    fn offset(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.offset()
    }

    fn wall(&self) -> DateTime<Utc> {
        let offset = chrono::Duration::from_std(self.offset()).unwrap_or_default();
        self.wall_base + offset
    }
}

/// Format a session duration the way the stats line shows it.
///
/// Durations under a minute print as `1.23s`; longer ones also get a
/// human-readable form, e.g. `83.20s (1 minute)`.
pub fn format_session_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.2}s ({})", secs, HumanDuration(elapsed))
    }
}
